// ABOUTME: Bind/unbind state machine driving one SMPP session over a pluggable transport
// ABOUTME: Segments and submits messages, answers unsolicited PDUs and records everything in the event log

use crate::client::error::{SmppError, SmppResult};
use crate::client::keepalive::KeepAliveManager;
use crate::client::state::SessionState;
use crate::client::types::{
    ConnectionConfig, EngineConfig, OutboundMessage, PartOutcome, PartResult,
};
use crate::codec::{Encodable, Frame};
use crate::correlator::{Correlator, PendingResponse, RequestOutcome};
use crate::datatypes::{
    BindType, CommandId, DeliverSmResponse, EnquireLink, EnquireLinkResponse, Unbind,
    UnbindResponse,
};
use crate::event_log::{EventLog, LogCategory, LogPayload, LogSnapshot};
use crate::segmenter::{LengthCounter, MessageStats, Segmenter, SmsLengthCounter};
use crate::transport::{
    Connector, Direction, EventReceiver, TcpConnector, Transport, TransportEvent,
};
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

/// How long unbind waits for unbind_resp when no request timeout is set
const UNBIND_TIMEOUT: Duration = Duration::from_secs(10);

/// One SMPP session: bind, submit, observe, unbind.
///
/// Cloning is cheap and every clone drives the same session. Operations
/// run on spawned tasks, so a session always reaches a settled state even
/// if the caller stops waiting.
///
/// ```rust,no_run
/// use smpp_sender::client::{ConnectionConfig, EngineConfig, OutboundMessage, SessionEngine};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let engine = SessionEngine::new(EngineConfig::default());
/// engine
///     .bind(ConnectionConfig::new("localhost", 2775, "system_id", "password"))
///     .await?;
///
/// let message = OutboundMessage::builder()
///     .from("Sender")
///     .to("447700900000")
///     .text("Hello!")
///     .build()?;
/// for outcome in engine.submit(&message).await? {
///     println!("part {}: {:?}", outcome.part_index, outcome.result);
/// }
///
/// engine.unbind().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionEngine<C: Connector = TcpConnector> {
    connector: Arc<C>,
    core: Arc<Core>,
}

impl<C: Connector> Clone for SessionEngine<C> {
    fn clone(&self) -> Self {
        Self {
            connector: self.connector.clone(),
            core: self.core.clone(),
        }
    }
}

impl SessionEngine<TcpConnector> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_connector(TcpConnector, config)
    }
}

impl<C: Connector> SessionEngine<C> {
    pub fn with_connector(connector: C, config: EngineConfig) -> Self {
        Self::with_length_counter(connector, config, SmsLengthCounter)
    }

    /// Use `counter` to decide how many parts a message body needs
    pub fn with_length_counter<L>(connector: C, config: EngineConfig, counter: L) -> Self
    where
        L: LengthCounter + 'static,
    {
        let (state, _) = watch::channel(SessionState::Unbound);
        let counter: Box<dyn LengthCounter> = Box::new(counter);

        Self {
            connector: Arc::new(connector),
            core: Arc::new(Core {
                log: Arc::new(EventLog::new(config.log_capacity)),
                config,
                state,
                session: Mutex::new(None),
                generation: AtomicU64::new(0),
                segmenter: Segmenter::with_counter(counter),
            }),
        }
    }

    /// Connect and bind. Only legal while Unbound; configuration errors are
    /// returned before any connection attempt.
    pub async fn bind(&self, config: ConnectionConfig) -> SmppResult<()> {
        config.validate()?;

        let generation = {
            let _session = self.core.lock_session();
            let state = self.core.state();
            if state != SessionState::Unbound {
                return Err(SmppError::InvalidState(state));
            }
            self.core.set_state(SessionState::Binding);
            self.core.generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let core = self.core.clone();
        let connector = self.connector.clone();
        tokio::spawn(async move { core.run_bind(connector.as_ref(), generation, config).await })
            .await
            .map_err(task_failed)?
    }

    /// Send unbind and close the connection once it is answered
    pub async fn unbind(&self) -> SmppResult<()> {
        let (generation, correlator) = {
            let session = self.core.lock_session();
            let state = self.core.state();
            match session.as_ref() {
                Some(session) if state == SessionState::Bound => {
                    self.core.set_state(SessionState::Unbinding);
                    (session.generation, session.correlator.clone())
                }
                _ => return Err(SmppError::InvalidState(state)),
            }
        };

        let core = self.core.clone();
        tokio::spawn(async move { core.run_unbind(generation, correlator).await })
            .await
            .map_err(task_failed)?
    }

    /// Segment `message` and submit every part, returning one outcome per
    /// part in part order. Rejected with `NotBound` unless the session is
    /// bound for transmitting; nothing reaches the transport in that case.
    pub async fn submit(&self, message: &OutboundMessage) -> SmppResult<Vec<PartOutcome>> {
        let correlator = {
            let session = self.core.lock_session();
            let state = self.core.state();
            match session.as_ref() {
                Some(session) if state == SessionState::Bound && session.bind_type.can_transmit() => {
                    session.correlator.clone()
                }
                other => {
                    let bind_type = other.map(|session| session.bind_type);
                    drop(session);
                    self.core.reject_submit(state, bind_type);
                    return Err(SmppError::NotBound);
                }
            }
        };

        message.validate()?;
        let parts = self.core.segmenter.segment(&message.body)?;
        let mut pdus = Vec::with_capacity(parts.len());
        for part in &parts {
            let pdu = message.submit_sm(part, 1)?;
            pdu.to_bytes()
                .map_err(|e| SmppError::Config(e.to_string()))?;
            pdus.push(pdu);
        }

        debug!(
            parts = parts.len(),
            destination = %message.dest_addr,
            "submitting message"
        );

        let mut sent = Vec::with_capacity(parts.len());
        for (part, pdu) in parts.iter().zip(pdus) {
            let pending = correlator.send(move |sequence_number| {
                let mut pdu = pdu;
                pdu.sequence_number = sequence_number;
                Frame::SubmitSm(Box::new(pdu))
            });
            sent.push((part.part_index, part.part_count, pending));
        }

        self.core.log.record(
            LogCategory::SubmitSm,
            "Message submitted",
            LogPayload::Text(format!(
                "{} part(s) from {} to {}",
                parts.len(),
                message.source_addr,
                message.dest_addr
            )),
        );

        let core = self.core.clone();
        tokio::spawn(async move { core.collect_outcomes(sent).await })
            .await
            .map_err(task_failed)
    }

    pub fn state(&self) -> SessionState {
        self.core.state()
    }

    pub fn is_bound(&self) -> bool {
        self.core.state().is_bound()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.core.state.subscribe()
    }

    pub fn log_snapshot(&self) -> LogSnapshot {
        self.core.log.snapshot()
    }

    pub fn subscribe_log(&self) -> watch::Receiver<LogSnapshot> {
        self.core.log.subscribe()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.core.config
    }

    /// Length, encoding and part count the segmenter would use for `body`
    pub fn message_stats(&self, body: &str) -> MessageStats {
        self.core.segmenter.stats(body)
    }

    /// Requests still waiting for a response on the current connection
    pub fn outstanding_requests(&self) -> usize {
        self.core
            .lock_session()
            .as_ref()
            .map_or(0, |session| session.correlator.outstanding())
    }
}

fn task_failed(err: JoinError) -> SmppError {
    SmppError::Connection(io::Error::other(err))
}

/// The live connection. Exists from a successful connect until the session
/// returns to Unbound.
struct Session {
    generation: u64,
    bind_type: BindType,
    correlator: Arc<Correlator>,
    keep_alive: Option<JoinHandle<()>>,
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.keep_alive.take() {
            task.abort();
        }
    }
}

struct Core {
    config: EngineConfig,
    log: Arc<EventLog>,
    state: watch::Sender<SessionState>,
    session: Mutex<Option<Session>>,
    generation: AtomicU64,
    segmenter: Segmenter<Box<dyn LengthCounter>>,
}

impl Core {
    fn lock_session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Callers hold the session lock so transitions are serialized
    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(from = %previous, to = %state, "session state");
        }
    }

    /// Drop the session if it still belongs to `generation`: state becomes
    /// Unbound, pending requests resolve as closed and the transport is
    /// closed. Returns the state it ended from.
    fn end_session(&self, generation: u64) -> Option<SessionState> {
        let (session, previous) = {
            let mut guard = self.lock_session();
            if !guard.as_ref().is_some_and(|s| s.generation == generation) {
                return None;
            }
            let previous = self.state();
            self.set_state(SessionState::Unbound);
            (guard.take(), previous)
        };

        if let Some(session) = session {
            session.correlator.close();
        }
        Some(previous)
    }

    async fn run_bind<C: Connector>(
        self: Arc<Self>,
        connector: &C,
        generation: u64,
        config: ConnectionConfig,
    ) -> SmppResult<()> {
        info!(
            host = %config.host,
            port = config.port,
            system_id = %config.system_id,
            bind_type = config.bind_type.as_str(),
            "binding"
        );

        let (events, rx) = mpsc::unbounded_channel();
        let transport = match connector.connect(&config.host, config.port, events).await {
            Ok(transport) => transport,
            Err(e) => {
                error!(error = %e, "connect failed");
                self.log.record(
                    LogCategory::Session,
                    "Connection Error",
                    LogPayload::Text(e.to_string()),
                );
                let _session = self.lock_session();
                self.set_state(SessionState::Unbound);
                return Err(e);
            }
        };

        let correlator = Arc::new(self.correlator_for(transport));
        *self.lock_session() = Some(Session {
            generation,
            bind_type: config.bind_type,
            correlator: correlator.clone(),
            keep_alive: None,
        });
        tokio::spawn(pump(
            Arc::downgrade(&self),
            generation,
            correlator.clone(),
            rx,
        ));

        let pending = match correlator.send(|seq| Frame::Bind(config.bind_request(seq))) {
            Ok(pending) => pending,
            Err(e) => {
                self.fail_bind(generation, LogPayload::Text(e.to_string()));
                return Err(e);
            }
        };

        let sequence_number = pending.sequence_number;
        match self.await_with_timeout(pending).await {
            RequestOutcome::Response(frame) => match &frame {
                Frame::BindResp(resp) if resp.command_status.is_ok() => {
                    if !self.complete_bind(generation, &correlator) {
                        return Err(SmppError::ConnectionClosed);
                    }
                    info!(system_id = %resp.system_id, "session bound");
                    self.log
                        .record(LogCategory::Session, "Session Bound", LogPayload::from(&frame));
                    Ok(())
                }
                _ => {
                    let status = frame.command_status();
                    let err = if status.is_ok() {
                        SmppError::UnexpectedPdu {
                            expected: config.bind_type.response_command_id().name().to_string(),
                            actual: frame.command_id().name().to_string(),
                        }
                    } else {
                        SmppError::Protocol(status)
                    };
                    warn!(status = %status, "bind rejected");
                    self.fail_bind(generation, LogPayload::from(&frame));
                    Err(err)
                }
            },
            RequestOutcome::Closed => {
                self.fail_bind(
                    generation,
                    LogPayload::Text("connection closed during bind".to_string()),
                );
                Err(SmppError::ConnectionClosed)
            }
            RequestOutcome::TimedOut => {
                correlator.cancel(sequence_number);
                self.fail_bind(generation, LogPayload::Text("bind timed out".to_string()));
                Err(SmppError::Timeout)
            }
        }
    }

    /// Binding -> Bound, starting the keep-alive ticker. False when the
    /// session went away while the response was in flight.
    fn complete_bind(self: &Arc<Self>, generation: u64, correlator: &Arc<Correlator>) -> bool {
        let mut guard = self.lock_session();
        let state = self.state();
        match guard.as_mut() {
            Some(session) if session.generation == generation && state == SessionState::Binding => {
                self.set_state(SessionState::Bound);
                session.keep_alive = self.spawn_keep_alive(generation, correlator.clone());
                true
            }
            _ => false,
        }
    }

    /// Binding -> Error -> Unbound, closing the connection.
    ///
    /// When the transport closes mid-bind the pump has already moved
    /// Binding -> Unbound without an Error stop. The entry is still recorded,
    /// after the state has settled.
    fn fail_bind(&self, generation: u64, payload: LogPayload) {
        self.log
            .record(LogCategory::Session, "Connection Error", payload);

        let session = {
            let mut guard = self.lock_session();
            if !guard.as_ref().is_some_and(|s| s.generation == generation) {
                return;
            }
            self.set_state(SessionState::Error);
            let session = guard.take();
            self.set_state(SessionState::Unbound);
            session
        };

        if let Some(session) = session {
            session.correlator.close();
        }
    }

    async fn run_unbind(&self, generation: u64, correlator: Arc<Correlator>) -> SmppResult<()> {
        info!("unbinding");

        let pending = match correlator.send(|seq| Frame::Unbind(Unbind::new(seq))) {
            Ok(pending) => pending,
            Err(e) => {
                self.end_session(generation);
                self.log.record(
                    LogCategory::Unbind,
                    "Session Unbound",
                    LogPayload::Text(e.to_string()),
                );
                return Err(e);
            }
        };

        let wait = self.config.request_timeout.unwrap_or(UNBIND_TIMEOUT);
        let outcome = tokio::time::timeout(wait, pending.outcome())
            .await
            .unwrap_or(RequestOutcome::TimedOut);

        // Anything still outstanding resolves as closed here.
        self.end_session(generation);

        match outcome {
            RequestOutcome::Response(frame) => {
                info!(status = %frame.command_status(), "session unbound");
                self.log
                    .record(LogCategory::Unbind, "Session Unbound", LogPayload::from(&frame));
                Ok(())
            }
            RequestOutcome::Closed => {
                self.log.record(
                    LogCategory::Unbind,
                    "Session Unbound",
                    LogPayload::Text("connection closed before unbind_resp".to_string()),
                );
                Err(SmppError::ConnectionClosed)
            }
            RequestOutcome::TimedOut => {
                warn!("no unbind_resp, closing anyway");
                self.log.record(
                    LogCategory::Unbind,
                    "Session Unbound",
                    LogPayload::Text("unbind_resp not received".to_string()),
                );
                Err(SmppError::Timeout)
            }
        }
    }

    async fn await_with_timeout(&self, pending: PendingResponse) -> RequestOutcome {
        match self.config.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, pending.outcome())
                .await
                .unwrap_or(RequestOutcome::TimedOut),
            None => pending.outcome().await,
        }
    }

    fn reject_submit(&self, state: SessionState, bind_type: Option<BindType>) {
        let reason = match bind_type {
            Some(BindType::Receiver) if state == SessionState::Bound => {
                "submit rejected: bound as receiver".to_string()
            }
            _ => format!("submit rejected: session is {state}"),
        };
        warn!(state = %state, "{reason}");
        self.log
            .record(LogCategory::Session, "Not Bound", LogPayload::Text(reason));
    }

    async fn collect_outcomes(
        &self,
        sent: Vec<(u8, u8, SmppResult<PendingResponse>)>,
    ) -> Vec<PartOutcome> {
        let mut outcomes = Vec::with_capacity(sent.len());

        for (part_index, part_count, pending) in sent {
            let (sequence_number, result, payload) = match pending {
                Ok(pending) => {
                    let sequence_number = pending.sequence_number;
                    let (result, payload) = match pending.outcome().await {
                        RequestOutcome::Response(frame) => {
                            let payload = LogPayload::from(&frame);
                            let result = match frame {
                                Frame::SubmitSmResp(resp) if resp.command_status.is_ok() => {
                                    PartResult::Accepted {
                                        message_id: resp.message_id,
                                    }
                                }
                                other => PartResult::Rejected {
                                    status: other.command_status(),
                                },
                            };
                            (result, payload)
                        }
                        RequestOutcome::Closed => (
                            PartResult::Closed,
                            LogPayload::Text("connection closed".to_string()),
                        ),
                        RequestOutcome::TimedOut => (
                            PartResult::TimedOut,
                            LogPayload::Text("no response".to_string()),
                        ),
                    };
                    (Some(sequence_number), result, payload)
                }
                Err(e) => (None, PartResult::Closed, LogPayload::Text(e.to_string())),
            };

            let outcome = PartOutcome {
                part_index,
                part_count,
                sequence_number,
                result,
            };

            if outcome.is_accepted() {
                debug!(part = part_index, of = part_count, "part accepted");
                self.log.record(
                    LogCategory::SubmitSm,
                    format!("Message Part {part_index} of {part_count} sent successfully"),
                    payload,
                );
            } else {
                warn!(part = part_index, of = part_count, result = ?outcome.result, "part failed");
                self.log.record(
                    LogCategory::SubmitSm,
                    format!("Failed to send part {part_index} of {part_count}"),
                    payload,
                );
            }

            outcomes.push(outcome);
        }

        outcomes
    }

    /// Correlator with the handlers for requests the SMSC may send us
    fn correlator_for(&self, transport: Arc<dyn Transport>) -> Correlator {
        let mut correlator = Correlator::new(transport, self.log.clone());

        let log = self.log.clone();
        correlator.register(CommandId::DeliverSm, move |frame, transport| {
            let message = match frame {
                Frame::DeliverSm(pdu) if pdu.is_delivery_receipt() => "Delivery receipt received",
                _ => "Deliver SM received",
            };
            log.record(LogCategory::DeliverSm, message, LogPayload::from(frame));
            reply(
                transport,
                Frame::DeliverSmResp(DeliverSmResponse::new(frame.sequence_number(), "")),
            );
        });

        let log = self.log.clone();
        correlator.register(CommandId::EnquireLink, move |frame, transport| {
            log.record(
                LogCategory::EnquireLink,
                "Enquire Link received",
                LogPayload::from(frame),
            );
            reply(
                transport,
                Frame::EnquireLinkResp(EnquireLinkResponse::new(frame.sequence_number())),
            );
        });

        let log = self.log.clone();
        correlator.register(CommandId::Unbind, move |frame, transport| {
            info!("unbind requested by peer");
            log.record(LogCategory::Unbind, "Unbind received", LogPayload::from(frame));
            reply(
                transport,
                Frame::UnbindResp(UnbindResponse::new(frame.sequence_number())),
            );
            transport.close();
        });

        correlator
    }

    fn on_transport_closed(&self, generation: u64, reason: Option<String>) {
        match self.end_session(generation) {
            Some(SessionState::Bound) => {
                let reason = reason.unwrap_or_else(|| "closed by peer".to_string());
                warn!(reason = %reason, "connection lost");
                self.log
                    .record(LogCategory::Session, "Connection closed", LogPayload::Text(reason));
            }
            // mid-bind the bind task records the failure once its request resolves
            Some(previous) => debug!(state = %previous, "connection closed"),
            None => {}
        }
    }

    fn record_socket_data(&self, direction: Direction, command_id: CommandId, length: usize) {
        if !self.config.log_socket_data {
            return;
        }
        let (category, message) = match direction {
            Direction::Inbound => (LogCategory::SocketDataIn, "Data received"),
            Direction::Outbound => (LogCategory::SocketDataOut, "Data sent"),
        };
        self.log
            .record(category, message, LogPayload::Wire { command_id, length });
    }

    fn spawn_keep_alive(
        self: &Arc<Self>,
        generation: u64,
        correlator: Arc<Correlator>,
    ) -> Option<JoinHandle<()>> {
        if !self.config.keep_alive.enabled && self.config.request_timeout.is_none() {
            return None;
        }
        Some(tokio::spawn(keep_alive(
            Arc::downgrade(self),
            generation,
            correlator,
            self.config.clone(),
        )))
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        let session = self
            .session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(session) = session {
            session.correlator.close();
        }
    }
}

fn reply(transport: &dyn Transport, frame: Frame) {
    let command = frame.command_id();
    if let Err(e) = transport.send(frame) {
        warn!(error = %e, command = command.name(), "could not send response");
    }
}

/// Feeds one connection's events into the engine until it closes
async fn pump(
    core: Weak<Core>,
    generation: u64,
    correlator: Arc<Correlator>,
    mut events: EventReceiver,
) {
    while let Some(event) = events.recv().await {
        let Some(core) = core.upgrade() else { break };
        match event {
            TransportEvent::Pdu(frame) => correlator.on_inbound(frame),
            TransportEvent::Data {
                direction,
                command_id,
                length,
            } => core.record_socket_data(direction, command_id, length),
            TransportEvent::Closed { reason } => {
                core.on_transport_closed(generation, reason);
                break;
            }
        }
    }

    correlator.close();
}

/// enquire_link on the configured interval plus request expiry, for as long
/// as the session of `generation` is bound
async fn keep_alive(
    core: Weak<Core>,
    generation: u64,
    correlator: Arc<Correlator>,
    config: EngineConfig,
) {
    let mut manager = KeepAliveManager::new(config.keep_alive.clone());
    manager.start();

    loop {
        let wait = [manager.next_ping_in(), config.request_timeout]
            .into_iter()
            .flatten()
            .min();
        let Some(wait) = wait else { break };
        tokio::time::sleep(wait).await;

        if correlator.is_closed() {
            break;
        }

        if let Some(timeout) = config.request_timeout {
            let expired = correlator.expire_stale(timeout);
            if expired > 0 {
                let Some(core) = core.upgrade() else { break };
                warn!(count = expired, "requests timed out");
                core.log.record(
                    LogCategory::Anomaly,
                    format!("{expired} request(s) timed out"),
                    LogPayload::None,
                );
            }
        }

        if !manager.should_ping() {
            continue;
        }
        match core.upgrade().map(|core| core.state()) {
            Some(SessionState::Bound) => {}
            _ => break,
        }

        let Ok(pending) = correlator.send(|seq| Frame::EnquireLink(EnquireLink::new(seq))) else {
            break;
        };
        let sequence_number = pending.sequence_number;
        manager.on_ping_sent();

        match tokio::time::timeout(manager.timeout(), pending.outcome()).await {
            Ok(RequestOutcome::Response(frame)) if frame.command_status().is_ok() => {
                manager.on_ping_success();
                if let Some(core) = core.upgrade() {
                    core.log.record(
                        LogCategory::EnquireLinkResp,
                        "Enquire Link Response received",
                        LogPayload::from(&frame),
                    );
                }
            }
            Ok(RequestOutcome::Closed) => break,
            Ok(_) => manager.on_ping_failure(),
            Err(_) => {
                correlator.cancel(sequence_number);
                manager.on_ping_failure();
            }
        }

        if manager.is_connection_failed() {
            let Some(core) = core.upgrade() else { break };
            let status = manager.status();
            error!(
                failures = status.consecutive_failures,
                "keep-alive failed, dropping session"
            );
            core.log.record(
                LogCategory::Session,
                "Connection Error",
                LogPayload::Text(format!(
                    "{} consecutive enquire_link failures",
                    status.consecutive_failures
                )),
            );
            core.end_session(generation);
            break;
        }
    }
}
