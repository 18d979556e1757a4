// ABOUTME: Pairs outbound requests with their responses by sequence number
// ABOUTME: Dispatches unsolicited inbound requests through a command-id handler table

use crate::client::{SmppError, SmppResult};
use crate::codec::Frame;
use crate::datatypes::{CommandId, GenericNack};
use crate::event_log::{EventLog, LogCategory, LogPayload};
use crate::transport::Transport;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

/// Highest sequence number handed out; the upper half is never used.
const MAX_SEQUENCE: u32 = 0x7FFF_FFFF;

/// How an outstanding request ended
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// The matching response, or a generic_nack carrying the same sequence
    Response(Frame),
    Closed,
    TimedOut,
}

/// Handle to an outstanding request
#[derive(Debug)]
pub struct PendingResponse {
    pub sequence_number: u32,
    pub command_id: CommandId,
    rx: oneshot::Receiver<RequestOutcome>,
}

impl PendingResponse {
    pub async fn outcome(self) -> RequestOutcome {
        self.rx.await.unwrap_or(RequestOutcome::Closed)
    }
}

#[derive(Debug)]
struct PendingRequest {
    command_id: CommandId,
    submitted_at: Instant,
    completion: oneshot::Sender<RequestOutcome>,
}

impl PendingRequest {
    fn resolve(self, outcome: RequestOutcome) {
        // The caller may have stopped waiting.
        let _ = self.completion.send(outcome);
    }

    fn accepts(&self, response: CommandId) -> bool {
        response == self.command_id.response_id() || response == CommandId::GenericNack
    }
}

#[derive(Debug)]
struct State {
    next_sequence: u32,
    pending: HashMap<u32, PendingRequest>,
    closed: bool,
}

impl State {
    fn allocate_sequence(&mut self) -> u32 {
        loop {
            let candidate = self.next_sequence;
            self.next_sequence = if candidate >= MAX_SEQUENCE {
                1
            } else {
                candidate + 1
            };
            if !self.pending.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}

/// Handles an unsolicited inbound request. Responsible for sending any
/// response through the transport it is given.
pub type InboundHandler = Box<dyn Fn(&Frame, &dyn Transport) + Send + Sync>;

/// Request/response bookkeeping for one connection
pub struct Correlator {
    transport: Arc<dyn Transport>,
    log: Arc<EventLog>,
    handlers: HashMap<CommandId, InboundHandler>,
    state: Mutex<State>,
}

impl Correlator {
    pub fn new(transport: Arc<dyn Transport>, log: Arc<EventLog>) -> Self {
        Self {
            transport,
            log,
            handlers: HashMap::new(),
            state: Mutex::new(State {
                next_sequence: 1,
                pending: HashMap::new(),
                closed: false,
            }),
        }
    }

    /// Install the handler for inbound requests with `command_id`
    pub fn register<F>(&mut self, command_id: CommandId, handler: F)
    where
        F: Fn(&Frame, &dyn Transport) + Send + Sync + 'static,
    {
        self.handlers.insert(command_id, Box::new(handler));
    }

    pub fn handles(&self, command_id: CommandId) -> bool {
        self.handlers.contains_key(&command_id)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Assign a sequence number, record the request and transmit it.
    /// `build` receives the sequence number to put in the header.
    pub fn send<F>(&self, build: F) -> SmppResult<PendingResponse>
    where
        F: FnOnce(u32) -> Frame,
    {
        let mut state = self.lock();
        if state.closed {
            return Err(SmppError::ConnectionClosed);
        }

        let sequence_number = state.allocate_sequence();
        let frame = build(sequence_number);
        let command_id = frame.command_id();
        let (completion, rx) = oneshot::channel();

        state.pending.insert(
            sequence_number,
            PendingRequest {
                command_id,
                submitted_at: Instant::now(),
                completion,
            },
        );

        if let Err(e) = self.transport.send(frame) {
            state.pending.remove(&sequence_number);
            return Err(e);
        }

        trace!(sequence = sequence_number, command = command_id.name(), "request sent");
        Ok(PendingResponse {
            sequence_number,
            command_id,
            rx,
        })
    }

    /// Route one decoded inbound PDU
    pub fn on_inbound(&self, frame: Frame) {
        if frame.is_response() {
            self.on_response(frame);
            return;
        }

        if self.lock().closed {
            debug!(command = frame.command_id().name(), "request after close ignored");
            return;
        }

        match self.handlers.get(&frame.command_id()) {
            Some(handler) => handler(&frame, self.transport.as_ref()),
            None => self.reject_unsupported(&frame),
        }
    }

    fn on_response(&self, frame: Frame) {
        let sequence_number = frame.sequence_number();
        let command_id = frame.command_id();

        let request = {
            let mut state = self.lock();
            let matches = state
                .pending
                .get(&sequence_number)
                .is_some_and(|request| request.accepts(command_id));
            if matches {
                state.pending.remove(&sequence_number)
            } else {
                None
            }
        };

        match request {
            Some(request) => {
                trace!(
                    sequence = sequence_number,
                    command = command_id.name(),
                    latency_ms = request.submitted_at.elapsed().as_millis() as u64,
                    "response matched"
                );
                request.resolve(RequestOutcome::Response(frame));
            }
            None => {
                warn!(
                    sequence = sequence_number,
                    command = command_id.name(),
                    "response without a matching request"
                );
                self.log.record(
                    LogCategory::Anomaly,
                    format!("Unexpected {} (sequence {sequence_number})", command_id.name()),
                    LogPayload::from(&frame),
                );
            }
        }
    }

    fn reject_unsupported(&self, frame: &Frame) {
        let sequence_number = frame.sequence_number();
        warn!(
            sequence = sequence_number,
            command_id = u32::from(frame.command_id()),
            "unsupported request, replying generic_nack"
        );
        self.log.record(
            LogCategory::Anomaly,
            format!("Unsupported command {:#010x}", u32::from(frame.command_id())),
            LogPayload::from(frame),
        );

        let nack = GenericNack::invalid_command_id(sequence_number);
        if let Err(e) = self.transport.send(Frame::GenericNack(nack)) {
            debug!(error = %e, "could not send generic_nack");
        }
    }

    /// Stop waiting for `sequence_number`. A late response is then reported
    /// as an anomaly.
    pub fn cancel(&self, sequence_number: u32) -> bool {
        self.lock().pending.remove(&sequence_number).is_some()
    }

    /// Resolve requests outstanding for at least `timeout` as timed out
    pub fn expire_stale(&self, timeout: Duration) -> usize {
        let expired: Vec<PendingRequest> = {
            let mut state = self.lock();
            let stale: Vec<u32> = state
                .pending
                .iter()
                .filter(|(_, request)| request.submitted_at.elapsed() >= timeout)
                .map(|(sequence, _)| *sequence)
                .collect();
            stale
                .iter()
                .filter_map(|sequence| state.pending.remove(sequence))
                .collect()
        };

        let count = expired.len();
        for request in expired {
            debug!(command = request.command_id.name(), "request timed out");
            request.resolve(RequestOutcome::TimedOut);
        }
        count
    }

    /// Resolve everything outstanding as closed and close the transport.
    /// Safe to call more than once.
    pub fn close(&self) {
        let drained: Vec<PendingRequest> = {
            let mut state = self.lock();
            state.closed = true;
            state.pending.drain().map(|(_, request)| request).collect()
        };

        if !drained.is_empty() {
            debug!(count = drained.len(), "failing outstanding requests");
        }
        for request in drained {
            request.resolve(RequestOutcome::Closed);
        }

        self.transport.close();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn outstanding(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

impl std::fmt::Debug for Correlator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Correlator")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{
        DeliverSm, DeliverSmResponse, EnquireLink, EnquireLinkResponse, SubmitSm,
        SubmitSmResponse,
    };
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct RecordingTransport {
        sent: Mutex<Vec<Frame>>,
        closed: AtomicBool,
    }

    impl RecordingTransport {
        fn sent(&self) -> Vec<Frame> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Transport for RecordingTransport {
        fn send(&self, frame: Frame) -> SmppResult<()> {
            if self.is_closed() {
                return Err(SmppError::ConnectionClosed);
            }
            self.sent.lock().unwrap().push(frame);
            Ok(())
        }

        fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    fn setup() -> (Arc<RecordingTransport>, Arc<EventLog>, Correlator) {
        let transport = Arc::new(RecordingTransport::default());
        let log = Arc::new(EventLog::new(10));
        let correlator = Correlator::new(transport.clone(), log.clone());
        (transport, log, correlator)
    }

    fn enquire(correlator: &Correlator) -> PendingResponse {
        correlator
            .send(|seq| Frame::EnquireLink(EnquireLink::new(seq)))
            .unwrap()
    }

    #[tokio::test]
    async fn response_resolves_matching_request() {
        let (transport, _, correlator) = setup();
        let pending = correlator
            .send(|seq| {
                Frame::SubmitSm(Box::new(SubmitSm {
                    sequence_number: seq,
                    ..Default::default()
                }))
            })
            .unwrap();

        assert_eq!(transport.sent().len(), 1);
        assert_eq!(correlator.outstanding(), 1);

        let seq = pending.sequence_number;
        correlator.on_inbound(Frame::SubmitSmResp(SubmitSmResponse::new(seq, "abc")));

        match pending.outcome().await {
            RequestOutcome::Response(Frame::SubmitSmResp(resp)) => assert_eq!(resp.message_id, "abc"),
            other => panic!("Expected submit_sm_resp, got {other:?}"),
        }
        assert_eq!(correlator.outstanding(), 0);
    }

    #[tokio::test]
    async fn out_of_order_responses_match_by_sequence() {
        let (_, _, correlator) = setup();
        let first = enquire(&correlator);
        let second = enquire(&correlator);
        let (s1, s2) = (first.sequence_number, second.sequence_number);

        correlator.on_inbound(Frame::EnquireLinkResp(EnquireLinkResponse::new(s2)));
        correlator.on_inbound(Frame::EnquireLinkResp(EnquireLinkResponse::new(s1)));

        for (pending, seq) in [(first, s1), (second, s2)] {
            match pending.outcome().await {
                RequestOutcome::Response(frame) => assert_eq!(frame.sequence_number(), seq),
                other => panic!("Expected response, got {other:?}"),
            }
        }
    }

    #[test]
    fn sequence_numbers_are_unique_while_outstanding() {
        let (_, _, correlator) = setup();
        let handles: Vec<_> = (0..100).map(|_| enquire(&correlator)).collect();
        let unique: HashSet<u32> = handles.iter().map(|p| p.sequence_number).collect();

        assert_eq!(unique.len(), 100);
        assert!(unique.iter().all(|seq| (1..=MAX_SEQUENCE).contains(seq)));
    }

    #[test]
    fn sequence_wraps_and_skips_outstanding() {
        let mut state = State {
            next_sequence: MAX_SEQUENCE,
            pending: HashMap::new(),
            closed: false,
        };
        let (completion, _rx) = oneshot::channel();
        state.pending.insert(
            1,
            PendingRequest {
                command_id: CommandId::EnquireLink,
                submitted_at: Instant::now(),
                completion,
            },
        );

        assert_eq!(state.allocate_sequence(), MAX_SEQUENCE);
        assert_eq!(state.allocate_sequence(), 2);
    }

    #[test]
    fn unmatched_response_is_logged_once() {
        let (_, log, correlator) = setup();
        correlator.on_inbound(Frame::SubmitSmResp(SubmitSmResponse::new(77, "x")));

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].category, LogCategory::Anomaly);
    }

    #[tokio::test]
    async fn wrong_response_type_leaves_request_pending() {
        let (_, log, correlator) = setup();
        let pending = enquire(&correlator);
        let seq = pending.sequence_number;

        correlator.on_inbound(Frame::SubmitSmResp(SubmitSmResponse::new(seq, "x")));
        assert_eq!(correlator.outstanding(), 1);
        assert_eq!(log.snapshot()[0].category, LogCategory::Anomaly);

        correlator.on_inbound(Frame::EnquireLinkResp(EnquireLinkResponse::new(seq)));
        assert!(matches!(pending.outcome().await, RequestOutcome::Response(_)));
    }

    #[tokio::test]
    async fn generic_nack_resolves_request() {
        let (_, _, correlator) = setup();
        let pending = enquire(&correlator);
        let seq = pending.sequence_number;

        correlator.on_inbound(Frame::GenericNack(GenericNack::invalid_command_id(seq)));
        match pending.outcome().await {
            RequestOutcome::Response(frame) => {
                assert_eq!(frame.command_id(), CommandId::GenericNack);
            }
            other => panic!("Expected generic_nack, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn close_resolves_everything_and_is_idempotent() {
        let (transport, _, correlator) = setup();
        let a = enquire(&correlator);
        let b = enquire(&correlator);

        correlator.close();
        correlator.close();

        assert_eq!(a.outcome().await, RequestOutcome::Closed);
        assert_eq!(b.outcome().await, RequestOutcome::Closed);
        assert!(transport.is_closed());
        assert!(matches!(
            correlator.send(|seq| Frame::EnquireLink(EnquireLink::new(seq))),
            Err(SmppError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn failed_transmit_is_not_left_pending() {
        let (transport, _, correlator) = setup();
        transport.close();

        assert!(correlator
            .send(|seq| Frame::EnquireLink(EnquireLink::new(seq)))
            .is_err());
        assert_eq!(correlator.outstanding(), 0);
    }

    #[tokio::test]
    async fn stale_requests_expire() {
        let (_, _, correlator) = setup();
        let pending = enquire(&correlator);

        assert_eq!(correlator.expire_stale(Duration::from_secs(60)), 0);
        assert_eq!(correlator.expire_stale(Duration::ZERO), 1);
        assert_eq!(pending.outcome().await, RequestOutcome::TimedOut);
    }

    #[test]
    fn handler_receives_request_and_replies() {
        let (transport, _, mut correlator) = setup();
        correlator.register(CommandId::DeliverSm, |frame, transport| {
            let seq = frame.sequence_number();
            transport
                .send(Frame::DeliverSmResp(DeliverSmResponse::new(seq, "")))
                .unwrap();
        });

        correlator.on_inbound(Frame::DeliverSm(Box::new(DeliverSm {
            sequence_number: 12,
            ..Default::default()
        })));

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].command_id(), CommandId::DeliverSmResp);
        assert_eq!(sent[0].sequence_number(), 12);
    }

    #[test]
    fn unhandled_request_gets_generic_nack() {
        let (transport, log, correlator) = setup();
        correlator.on_inbound(Frame::EnquireLink(EnquireLink::new(5)));

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Frame::GenericNack(nack) => {
                assert_eq!(nack.sequence_number, 5);
                assert_eq!(u32::from(nack.command_status), 0x0000_0003);
            }
            other => panic!("Expected generic_nack, got {other:?}"),
        }
        assert_eq!(log.snapshot()[0].category, LogCategory::Anomaly);
    }
}
