// ABOUTME: Narrow capability interface between the session engine and the raw connection
// ABOUTME: Includes the TCP implementation that runs reader and writer tasks per connection

use crate::client::{SmppError, SmppResult};
use crate::codec::Frame;
use crate::connection::{FrameReader, FrameWriter};
use crate::datatypes::CommandId;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// Notifications delivered by a transport to the session engine
#[derive(Debug)]
pub enum TransportEvent {
    /// A decoded inbound PDU
    Pdu(Frame),
    /// One frame of raw traffic crossed the socket
    Data {
        direction: Direction,
        command_id: CommandId,
        length: usize,
    },
    /// The connection is gone. Sent at most once per connection; `reason` is
    /// `None` for a local close or a clean EOF.
    Closed { reason: Option<String> },
}

pub type EventSender = mpsc::UnboundedSender<TransportEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// An open connection. `send` never blocks; `close` is idempotent.
pub trait Transport: Send + Sync {
    fn send(&self, frame: Frame) -> SmppResult<()>;

    fn close(&self);

    fn is_closed(&self) -> bool;
}

/// Opens transports. Inbound traffic and lifecycle events go to `events`.
pub trait Connector: Send + Sync + 'static {
    fn connect(
        &self,
        host: &str,
        port: u16,
        events: EventSender,
    ) -> impl Future<Output = SmppResult<Arc<dyn Transport>>> + Send;
}

/// Plain TCP to an SMSC
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    async fn connect(
        &self,
        host: &str,
        port: u16,
        events: EventSender,
    ) -> SmppResult<Arc<dyn Transport>> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        debug!(host, port, "tcp connection established");

        Ok(TcpTransport::spawn(stream, events))
    }
}

#[derive(Debug)]
struct TcpShared {
    events: EventSender,
    closed: AtomicBool,
    close_reported: AtomicBool,
    shutdown: watch::Sender<bool>,
}

impl TcpShared {
    fn shut(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.shutdown.send_replace(true);
    }

    fn report_closed(&self, reason: Option<String>) {
        if !self.close_reported.swap(true, Ordering::SeqCst) {
            let _ = self.events.send(TransportEvent::Closed { reason });
        }
    }
}

/// TCP transport backed by one reader task and one writer task
#[derive(Debug)]
pub struct TcpTransport {
    outbound: mpsc::UnboundedSender<Frame>,
    shared: Arc<TcpShared>,
}

impl TcpTransport {
    pub fn spawn(stream: TcpStream, events: EventSender) -> Arc<dyn Transport> {
        let (read_half, write_half) = stream.into_split();
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown, shutdown_rx) = watch::channel(false);

        let shared = Arc::new(TcpShared {
            events,
            closed: AtomicBool::new(false),
            close_reported: AtomicBool::new(false),
            shutdown,
        });

        tokio::spawn(read_loop(
            FrameReader::new(read_half),
            shared.clone(),
            shutdown_rx.clone(),
        ));
        tokio::spawn(write_loop(
            FrameWriter::new(write_half),
            outbound_rx,
            shared.clone(),
            shutdown_rx,
        ));

        Arc::new(TcpTransport { outbound, shared })
    }
}

impl Transport for TcpTransport {
    fn send(&self, frame: Frame) -> SmppResult<()> {
        if self.is_closed() {
            return Err(SmppError::ConnectionClosed);
        }
        self.outbound
            .send(frame)
            .map_err(|_| SmppError::ConnectionClosed)
    }

    fn close(&self) {
        if !self.shared.closed.load(Ordering::SeqCst) {
            debug!("closing tcp transport");
        }
        self.shared.shut();
    }

    fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }
}

async fn read_loop(
    mut reader: FrameReader<tokio::net::tcp::OwnedReadHalf>,
    shared: Arc<TcpShared>,
    mut shutdown: watch::Receiver<bool>,
) {
    let reason = loop {
        tokio::select! {
            _ = shutdown.changed() => break None,
            result = reader.read_frame() => match result {
                Ok(Some((frame, length))) => {
                    let _ = shared.events.send(TransportEvent::Data {
                        direction: Direction::Inbound,
                        command_id: frame.command_id(),
                        length,
                    });
                    if shared.events.send(TransportEvent::Pdu(frame)).is_err() {
                        break None;
                    }
                }
                Ok(None) => {
                    debug!("peer closed the connection");
                    break None;
                }
                Err(e) => {
                    warn!(error = %e, "read failed, dropping connection");
                    break Some(e.to_string());
                }
            },
        }
    };

    shared.shut();
    shared.report_closed(reason);
}

async fn write_loop(
    mut writer: FrameWriter<tokio::net::tcp::OwnedWriteHalf>,
    mut outbound: mpsc::UnboundedReceiver<Frame>,
    shared: Arc<TcpShared>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            // Frames queued before a close still go out, so unbind_resp is
            // not lost when the engine closes right after sending it.
            biased;
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                match writer.write_frame(&frame).await {
                    Ok(length) => {
                        let _ = shared.events.send(TransportEvent::Data {
                            direction: Direction::Outbound,
                            command_id: frame.command_id(),
                            length,
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, command = frame.command_id().name(), "write failed");
                        shared.shut();
                        shared.report_closed(Some(e.to_string()));
                        return;
                    }
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    let _ = writer.shutdown().await;
}
