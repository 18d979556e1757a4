// ABOUTME: Keep-alive policy and bookkeeping for a bound SMPP session
// ABOUTME: Tracks enquire_link timing and consecutive failures; the engine's ticker drives it

use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Periodic enquire_link while bound
///
/// # Example
///
/// ```rust
/// use smpp_sender::client::KeepAliveConfig;
/// use std::time::Duration;
///
/// let config = KeepAliveConfig::new(Duration::from_secs(60))
///     .with_timeout(Duration::from_secs(15))
///     .with_max_failures(5);
/// assert!(config.enabled);
///
/// assert!(!KeepAliveConfig::disabled().enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepAliveConfig {
    /// Gap between enquire_link PDUs (default: 10 seconds)
    pub interval: Duration,

    /// How long to wait for enquire_link_resp (default: 10 seconds)
    pub timeout: Duration,

    /// Consecutive unanswered pings that end the session (default: 3)
    pub max_failures: u32,

    pub enabled: bool,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(10),
            max_failures: 3,
            enabled: true,
        }
    }
}

impl KeepAliveConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = max_failures;
        self
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveStatus {
    pub running: bool,
    pub consecutive_failures: u32,
    pub total_pings: u32,
    pub total_pongs: u32,
}

/// Ping schedule and failure count for one bound session.
///
/// Does no I/O: the owner checks `should_ping()`, sends enquire_link,
/// calls `on_ping_sent()` and reports back with `on_ping_success()` or
/// `on_ping_failure()`.
#[derive(Debug)]
pub struct KeepAliveManager {
    config: KeepAliveConfig,
    last_ping: Option<Instant>,
    status: KeepAliveStatus,
}

impl KeepAliveManager {
    pub fn new(config: KeepAliveConfig) -> Self {
        let status = KeepAliveStatus {
            running: config.enabled,
            consecutive_failures: 0,
            total_pings: 0,
            total_pongs: 0,
        };
        Self {
            config,
            last_ping: None,
            status,
        }
    }

    /// Restart the schedule so the first ping goes out one interval from now
    pub fn start(&mut self) {
        self.last_ping = Some(Instant::now());
    }

    pub fn should_ping(&self) -> bool {
        self.next_ping_in().is_some_and(|wait| wait.is_zero())
    }

    /// `None` once no further pings will be sent
    pub fn next_ping_in(&self) -> Option<Duration> {
        if !self.config.enabled || self.is_connection_failed() {
            return None;
        }
        Some(
            self.last_ping
                .map_or(Duration::ZERO, |last| {
                    self.config.interval.saturating_sub(last.elapsed())
                }),
        )
    }

    pub fn on_ping_sent(&mut self) {
        self.last_ping = Some(Instant::now());
        self.status.total_pings = self.status.total_pings.saturating_add(1);
        debug!(total = self.status.total_pings, "enquire_link sent");
    }

    pub fn on_ping_success(&mut self) {
        self.status.consecutive_failures = 0;
        self.status.total_pongs = self.status.total_pongs.saturating_add(1);
    }

    pub fn on_ping_failure(&mut self) {
        self.status.consecutive_failures = self.status.consecutive_failures.saturating_add(1);
        warn!(
            consecutive = self.status.consecutive_failures,
            max = self.config.max_failures,
            "enquire_link unanswered"
        );
    }

    /// Never true while disabled
    pub fn is_connection_failed(&self) -> bool {
        self.config.enabled && self.status.consecutive_failures >= self.config.max_failures
    }

    pub fn status(&self) -> KeepAliveStatus {
        self.status
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_ping_every_ten_seconds() {
        let config = KeepAliveConfig::default();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_failures, 3);
        assert!(config.enabled);
    }

    #[test]
    fn first_ping_waits_one_interval_after_start() {
        let mut manager = KeepAliveManager::new(KeepAliveConfig::new(Duration::from_millis(50)));
        assert!(manager.should_ping());

        manager.start();
        assert!(!manager.should_ping());
        let wait = manager.next_ping_in().unwrap();
        assert!(wait > Duration::ZERO && wait <= Duration::from_millis(50));

        std::thread::sleep(Duration::from_millis(70));
        assert!(manager.should_ping());
    }

    #[test]
    fn failures_stop_pinging_until_a_success() {
        let config = KeepAliveConfig::new(Duration::ZERO).with_max_failures(2);
        let mut manager = KeepAliveManager::new(config);

        manager.on_ping_sent();
        manager.on_ping_failure();
        assert!(!manager.is_connection_failed());
        assert!(manager.should_ping());

        manager.on_ping_sent();
        manager.on_ping_failure();
        assert!(manager.is_connection_failed());
        assert_eq!(manager.next_ping_in(), None);

        manager.on_ping_success();
        assert!(!manager.is_connection_failed());
        assert_eq!(
            manager.status(),
            KeepAliveStatus {
                running: true,
                consecutive_failures: 0,
                total_pings: 2,
                total_pongs: 1,
            }
        );
    }

    #[test]
    fn disabled_manager_is_inert() {
        let mut manager = KeepAliveManager::new(KeepAliveConfig::disabled());
        for _ in 0..5 {
            manager.on_ping_failure();
        }

        assert!(!manager.should_ping());
        assert_eq!(manager.next_ping_in(), None);
        assert!(!manager.is_connection_failed());
        assert!(!manager.status().running);
    }
}
