// ABOUTME: SMPP session error types shared by the engine, correlator and transport
// ABOUTME: Separates configuration, transport, protocol and illegal-state failures

use crate::client::state::SessionState;
use crate::codec::CodecError;
use crate::datatypes::CommandStatus;
use crate::segmenter::SegmentError;
use std::io;
use thiserror::Error;

/// Error type for SMPP session operations
#[derive(Debug, Error)]
pub enum SmppError {
    /// Missing or invalid connection/message field, reported before any I/O
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error during network operations (connection, read, write)
    #[error("Connection error: {0}")]
    Connection(#[from] io::Error),

    /// Malformed data on the wire or a PDU field that cannot be encoded
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// SMPP protocol error indicated by command_status field
    #[error("Protocol error: {0}")]
    Protocol(CommandStatus),

    /// Operation timeout
    #[error("Operation timeout")]
    Timeout,

    /// Unexpected PDU received (wrong response type for request)
    #[error("Unexpected PDU: expected {expected}, got {actual}")]
    UnexpectedPdu { expected: String, actual: String },

    /// Connection closed before the operation completed
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation not allowed in the current session state
    #[error("Invalid session state: {0}")]
    InvalidState(SessionState),

    /// submit attempted while the session is not bound for transmitting
    #[error("Not bound")]
    NotBound,
}

/// Result type alias for SMPP operations
pub type SmppResult<T> = Result<T, SmppError>;

impl From<SegmentError> for SmppError {
    fn from(err: SegmentError) -> Self {
        SmppError::Config(err.to_string())
    }
}

impl SmppError {
    /// Configuration problems are the caller's to fix; nothing was sent
    pub fn is_config(&self) -> bool {
        matches!(self, SmppError::Config(_))
    }
}
