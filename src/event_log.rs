// ABOUTME: Bounded, most-recent-first log of protocol events exposed to the operator UI
// ABOUTME: Raw socket traffic entries are evicted first so they never crowd out session events

use crate::codec::Frame;
use crate::datatypes::{CommandId, CommandStatus};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::watch;

/// Capacity used by the operator UI
pub const DEFAULT_LOG_CAPACITY: usize = 5;

/// What an entry is about. Names match the event names shown to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    Session,
    SubmitSm,
    DeliverSm,
    EnquireLink,
    EnquireLinkResp,
    Unbind,
    Anomaly,
    SocketDataIn,
    SocketDataOut,
}

impl LogCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogCategory::Session => "session",
            LogCategory::SubmitSm => "submit_sm",
            LogCategory::DeliverSm => "deliver_sm",
            LogCategory::EnquireLink => "enquire_link",
            LogCategory::EnquireLinkResp => "enquire_link_resp",
            LogCategory::Unbind => "unbind",
            LogCategory::Anomaly => "anomaly",
            LogCategory::SocketDataIn => "socket.data.in",
            LogCategory::SocketDataOut => "socket.data.out",
        }
    }

    /// Raw socket I/O. At most one such entry is retained at a time.
    pub fn is_high_volume(&self) -> bool {
        matches!(self, LogCategory::SocketDataIn | LogCategory::SocketDataOut)
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of a PDU worth showing to an operator. `command_status` is the
/// peer's value, never translated.
#[derive(Debug, Clone, PartialEq)]
pub struct PduSummary {
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub system_id: Option<String>,
    pub message_id: Option<String>,
    pub source_addr: Option<String>,
    pub destination_addr: Option<String>,
    pub text: Option<String>,
}

impl PduSummary {
    /// Raw command_status as received on the wire
    pub fn raw_status(&self) -> u32 {
        u32::from(self.command_status)
    }
}

impl From<&Frame> for PduSummary {
    fn from(frame: &Frame) -> Self {
        let mut summary = PduSummary {
            command_id: frame.command_id(),
            command_status: frame.command_status(),
            sequence_number: frame.sequence_number(),
            system_id: None,
            message_id: None,
            source_addr: None,
            destination_addr: None,
            text: None,
        };

        match frame {
            Frame::Bind(pdu) => summary.system_id = Some(pdu.system_id.clone()),
            Frame::BindResp(pdu) => summary.system_id = Some(pdu.system_id.clone()),
            Frame::SubmitSmResp(pdu) => summary.message_id = Some(pdu.message_id.clone()),
            Frame::SubmitSm(pdu) => {
                summary.source_addr = Some(pdu.source_addr.clone());
                summary.destination_addr = Some(pdu.destination_addr.clone());
                summary.text = Some(pdu.text());
            }
            Frame::DeliverSm(pdu) => {
                summary.source_addr = Some(pdu.source_addr.clone());
                summary.destination_addr = Some(pdu.destination_addr.clone());
                summary.text = Some(pdu.text());
            }
            _ => {}
        }

        summary
    }
}

/// Structured data attached to an entry
#[derive(Debug, Clone, PartialEq)]
pub enum LogPayload {
    None,
    Text(String),
    Pdu(PduSummary),
    /// One frame of raw socket traffic
    Wire { command_id: CommandId, length: usize },
}

impl From<&Frame> for LogPayload {
    fn from(frame: &Frame) -> Self {
        LogPayload::Pdu(PduSummary::from(frame))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub category: LogCategory,
    pub message: String,
    pub payload: LogPayload,
    pub timestamp: SystemTime,
}

/// Ordered snapshot handed to readers. Replaced wholesale on every write.
pub type LogSnapshot = Arc<Vec<LogEntry>>;

/// Fixed-capacity event log. Writers replace the snapshot atomically, so a
/// reader always sees a complete list.
#[derive(Debug)]
pub struct EventLog {
    capacity: usize,
    entries: watch::Sender<LogSnapshot>,
}

impl EventLog {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let (entries, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            capacity: capacity.max(1),
            entries,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Prepend an entry. Earlier high-volume entries are dropped, then the
    /// rest is cut to `capacity - 1` so the new entry fits. Never fails.
    pub fn record(&self, category: LogCategory, message: impl Into<String>, payload: LogPayload) {
        let entry = LogEntry {
            category,
            message: message.into(),
            payload,
            timestamp: SystemTime::now(),
        };

        tracing::trace!(category = %entry.category, message = %entry.message, "event log");

        let keep = self.capacity - 1;
        self.entries.send_modify(|current| {
            let mut next = Vec::with_capacity(self.capacity);
            next.push(entry);
            next.extend(
                current
                    .iter()
                    .filter(|e| !e.category.is_high_volume())
                    .take(keep)
                    .cloned(),
            );
            *current = Arc::new(next);
        });
    }

    /// Current entries, most recent first
    pub fn snapshot(&self) -> LogSnapshot {
        self.entries.borrow().clone()
    }

    /// Receiver notified after every `record`
    pub fn subscribe(&self) -> watch::Receiver<LogSnapshot> {
        self.entries.subscribe()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::SubmitSmResponse;

    fn messages(log: &EventLog) -> Vec<String> {
        log.snapshot().iter().map(|e| e.message.clone()).collect()
    }

    #[test]
    fn most_recent_first_with_hard_cap() {
        let log = EventLog::new(3);
        for i in 1..=5 {
            log.record(LogCategory::Session, format!("event {i}"), LogPayload::None);
        }

        assert_eq!(messages(&log), vec!["event 5", "event 4", "event 3"]);
    }

    #[test]
    fn high_volume_entries_are_displaced() {
        let log = EventLog::new(5);
        log.record(LogCategory::Session, "Session Bound", LogPayload::None);
        for len in [16, 17, 18] {
            log.record(
                LogCategory::SocketDataIn,
                "data in",
                LogPayload::Wire {
                    command_id: CommandId::EnquireLink,
                    length: len,
                },
            );
        }
        log.record(LogCategory::SocketDataOut, "data out", LogPayload::None);

        let snapshot = log.snapshot();
        let high_volume: Vec<_> = snapshot
            .iter()
            .filter(|e| e.category.is_high_volume())
            .collect();
        assert_eq!(high_volume.len(), 1);
        assert_eq!(high_volume[0].category, LogCategory::SocketDataOut);
        assert_eq!(messages(&log), vec!["data out", "Session Bound"]);
    }

    #[test]
    fn regular_entry_clears_socket_noise() {
        let log = EventLog::default();
        log.record(LogCategory::SocketDataIn, "data in", LogPayload::None);
        log.record(LogCategory::DeliverSm, "Deliver SM received", LogPayload::None);

        assert_eq!(messages(&log), vec!["Deliver SM received"]);
    }

    #[test]
    fn capacity_is_never_exceeded() {
        let log = EventLog::new(2);
        let categories = [
            LogCategory::Session,
            LogCategory::SocketDataIn,
            LogCategory::SubmitSm,
            LogCategory::SocketDataOut,
            LogCategory::Anomaly,
        ];
        for category in categories.iter().cycle().take(40) {
            log.record(*category, category.as_str(), LogPayload::None);
            assert!(log.snapshot().len() <= 2);
        }
    }

    #[test]
    fn zero_capacity_keeps_latest_entry() {
        let log = EventLog::new(0);
        log.record(LogCategory::Session, "a", LogPayload::None);
        log.record(LogCategory::Session, "b", LogPayload::None);
        assert_eq!(messages(&log), vec!["b"]);
    }

    #[test]
    fn snapshots_are_not_affected_by_later_writes() {
        let log = EventLog::default();
        log.record(LogCategory::Session, "first", LogPayload::None);
        let before = log.snapshot();
        log.record(LogCategory::Session, "second", LogPayload::None);

        assert_eq!(before.len(), 1);
        assert_eq!(log.snapshot().len(), 2);
    }

    #[test]
    fn pdu_payload_keeps_raw_status() {
        let frame = Frame::SubmitSmResp(SubmitSmResponse::error(4, CommandStatus::Other(0x40B)));
        let payload = LogPayload::from(&frame);

        match payload {
            LogPayload::Pdu(summary) => {
                assert_eq!(summary.raw_status(), 0x40B);
                assert_eq!(summary.sequence_number, 4);
                assert_eq!(summary.command_id, CommandId::SubmitSmResp);
            }
            other => panic!("Expected Pdu payload, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn subscribers_see_each_record() {
        let log = EventLog::default();
        let mut rx = log.subscribe();

        log.record(LogCategory::Session, "Session Bound", LogPayload::None);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update()[0].message, "Session Bound");
    }
}
