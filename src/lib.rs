pub mod client;
pub mod codec;
pub mod connection;
pub mod correlator;
pub mod datatypes;
pub mod event_log;
pub(crate) mod macros;
pub mod segmenter;
pub mod transport;


// Re-export codec types for direct access
pub use codec::{CodecError, Decodable, Encodable, Frame, PduHeader, PduRegistry};

// Re-export the session engine API for easy access
pub use client::{
    ConnectionConfig, EngineConfig, OutboundMessage, PartOutcome, PartResult, SessionEngine,
    SessionState, SmppError, SmppResult,
};
pub use event_log::{EventLog, LogCategory, LogEntry, LogPayload, LogSnapshot};
pub use segmenter::{LengthCounter, MessagePart, Segmenter, SmsLengthCounter};
pub use transport::{Connector, TcpConnector, Transport, TransportEvent};
