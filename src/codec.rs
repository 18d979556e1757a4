// SMPP v3.4 Codec - Separates parsing/encoding logic from domain models
//
// Each PDU implements Encodable/Decodable; the PduRegistry maps command ids to
// decoders and the Frame enum is the tagged union the session engine works on.

use crate::datatypes::{
    BindRequest, BindResponse, CommandId, CommandStatus, DeliverSm, DeliverSmResponse,
    EnquireLink, EnquireLinkResponse, GenericNack, SubmitSm, SubmitSmResponse, Unbind,
    UnbindResponse,
};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::OnceLock;
use thiserror::Error;

/// Maximum allowed PDU size to prevent memory exhaustion attacks
pub const MAX_PDU_SIZE: u32 = 65536; // 64KB

/// SMPP v3.4 PDU Header (16 bytes, common to all PDUs)
#[derive(Debug, Clone, PartialEq)]
pub struct PduHeader {
    pub command_length: u32,
    pub command_id: CommandId,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl PduHeader {
    pub const SIZE: usize = 16;

    /// Decode PDU header from buffer with validation
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < Self::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = buf.get_u32();
        let command_id = CommandId::from(buf.get_u32());
        let command_status = CommandStatus::from(buf.get_u32());
        let sequence_number = buf.get_u32();

        if !(Self::SIZE as u32..=MAX_PDU_SIZE).contains(&command_length) {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: Self::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        // Requests must carry command_status = 0
        if !command_id.is_response() && command_status != CommandStatus::Ok {
            return Err(CodecError::InvalidRequestStatus {
                command_id,
                command_status,
            });
        }

        // A generic_nack may carry 0 when the offending sequence was unreadable
        let reserved = sequence_number == 0xFFFF_FFFF
            || (sequence_number == 0 && command_id != CommandId::GenericNack);
        if reserved {
            return Err(CodecError::ReservedSequenceNumber(sequence_number));
        }

        Ok(PduHeader {
            command_length,
            command_id,
            command_status,
            sequence_number,
        })
    }

    /// Encode PDU header to buffer
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        buf.put_u32(self.command_length);
        buf.put_u32(u32::from(self.command_id));
        buf.put_u32(u32::from(self.command_status));
        buf.put_u32(self.sequence_number);
        Ok(())
    }
}

/// Trait for types that can be encoded to bytes
pub trait Encodable {
    /// Encode this PDU to the buffer. The command_length written may be a
    /// placeholder; `to_bytes` patches it.
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError>;

    /// Calculate the encoded size without keeping the encoding
    fn encoded_size(&self) -> usize {
        let mut buf = BytesMut::new();
        self.encode(&mut buf).map(|_| buf.len()).unwrap_or(0)
    }

    /// Encode into a fresh buffer and fix the command_length field.
    fn to_bytes(&self) -> Result<Bytes, CodecError> {
        let mut buf = BytesMut::with_capacity(64);
        self.encode(&mut buf)?;

        if buf.len() >= 4 {
            let length = buf.len() as u32;
            buf[0..4].copy_from_slice(&length.to_be_bytes());
        }

        Ok(buf.freeze())
    }
}

/// Trait for types that can be decoded from bytes
pub trait Decodable: Sized {
    /// Decode this PDU from the buffer after header
    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError>;

    /// The command ids this PDU type is decoded for. Bind PDUs share one
    /// layout across three ids.
    fn command_ids() -> &'static [CommandId];

    /// Validate the header is appropriate for this PDU type
    fn validate_header(header: &PduHeader) -> Result<(), CodecError> {
        let expected = Self::command_ids();
        if !expected.contains(&header.command_id) {
            return Err(CodecError::UnexpectedCommandId {
                expected: expected[0],
                actual: header.command_id,
            });
        }
        Ok(())
    }
}

/// Codec errors with detailed context for debugging
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Incomplete PDU: need more data")]
    Incomplete,

    #[error("Invalid PDU length: {length}, must be {min}-{max}")]
    InvalidPduLength { length: u32, min: u32, max: u32 },

    #[error("Request PDU {command_id:?} has non-zero status: {command_status:?}")]
    InvalidRequestStatus {
        command_id: CommandId,
        command_status: CommandStatus,
    },

    #[error("Reserved sequence number: {0} (0 and 0xFFFFFFFF are reserved)")]
    ReservedSequenceNumber(u32),

    #[error("Unexpected command_id: expected {expected:?}, got {actual:?}")]
    UnexpectedCommandId {
        expected: CommandId,
        actual: CommandId,
    },

    #[error("Field '{field}' validation failed: {reason}")]
    FieldValidation { field: &'static str, reason: String },

    #[error("TLV parsing error: {0}")]
    TlvError(String),

    #[error("UTF-8 decoding error in field '{field}': {source}")]
    Utf8Error {
        field: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("Cannot encode {0:?}: frame body is opaque")]
    Unencodable(CommandId),
}

/// Decode a C-Octet string: up to `max_len` octets including the terminating
/// NUL. The cursor is left just past the NUL.
pub fn decode_cstring(
    buf: &mut Cursor<&[u8]>,
    max_len: usize,
    field_name: &'static str,
) -> Result<String, CodecError> {
    let chunk = buf.chunk();
    let window = &chunk[..chunk.len().min(max_len)];

    let Some(end) = window.iter().position(|&b| b == 0) else {
        return Err(if chunk.len() < max_len {
            CodecError::Incomplete
        } else {
            CodecError::FieldValidation {
                field: field_name,
                reason: format!("missing NUL terminator within {max_len} octets"),
            }
        });
    };

    let value = window[..end].to_vec();
    buf.advance(end + 1);

    String::from_utf8(value).map_err(|e| CodecError::Utf8Error {
        field: field_name,
        source: e,
    })
}

/// Decode a single byte
pub fn decode_u8(buf: &mut Cursor<&[u8]>) -> Result<u8, CodecError> {
    if buf.remaining() < 1 {
        return Err(CodecError::Incomplete);
    }
    Ok(buf.get_u8())
}

/// Encode a C-Octet string, rejecting values that do not fit `max_len`
/// (which includes the NUL terminator).
pub fn encode_cstring(
    buf: &mut BytesMut,
    value: &str,
    max_len: usize,
    field_name: &'static str,
) -> Result<(), CodecError> {
    let bytes = value.as_bytes();
    if bytes.len() >= max_len {
        return Err(CodecError::FieldValidation {
            field: field_name,
            reason: format!("{} octets exceeds maximum of {}", bytes.len(), max_len - 1),
        });
    }
    if bytes.contains(&0) {
        return Err(CodecError::FieldValidation {
            field: field_name,
            reason: "embedded NUL".to_string(),
        });
    }

    buf.put_slice(bytes);
    buf.put_u8(0);
    Ok(())
}

/// Placeholder header written by body-carrying PDUs; the length is patched
/// by `Encodable::to_bytes`.
pub(crate) fn encode_header(
    buf: &mut BytesMut,
    command_id: CommandId,
    command_status: CommandStatus,
    sequence_number: u32,
) -> Result<(), CodecError> {
    PduHeader {
        command_length: 0,
        command_id,
        command_status,
        sequence_number,
    }
    .encode(buf)
}

/// Typed PDU in flight between the wire and the session engine
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    // Bind PDUs (transmitter, receiver and transceiver share a layout)
    Bind(BindRequest),
    BindResp(BindResponse),

    // Message PDUs
    SubmitSm(Box<SubmitSm>),
    SubmitSmResp(SubmitSmResponse),
    DeliverSm(Box<DeliverSm>),
    DeliverSmResp(DeliverSmResponse),

    // Keep-alive PDUs
    EnquireLink(EnquireLink),
    EnquireLinkResp(EnquireLinkResponse),

    // Session management PDUs
    Unbind(Unbind),
    UnbindResp(UnbindResponse),

    GenericNack(GenericNack),

    // For unknown PDUs (forward compatibility)
    Unknown { header: PduHeader, body: Bytes },
}

type DecoderFn =
    Box<dyn Fn(PduHeader, &mut Cursor<&[u8]>) -> Result<Frame, CodecError> + Send + Sync>;

/// Registry of PDU decoders keyed by command id
pub struct PduRegistry {
    decoders: HashMap<CommandId, DecoderFn>,
}

impl PduRegistry {
    /// Create a new registry with the session PDUs registered
    pub fn new() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };

        registry.register_pdu::<BindRequest, _>(Frame::Bind);
        registry.register_pdu::<BindResponse, _>(Frame::BindResp);

        registry.register_pdu::<SubmitSm, _>(|pdu| Frame::SubmitSm(Box::new(pdu)));
        registry.register_pdu::<SubmitSmResponse, _>(Frame::SubmitSmResp);
        registry.register_pdu::<DeliverSm, _>(|pdu| Frame::DeliverSm(Box::new(pdu)));
        registry.register_pdu::<DeliverSmResponse, _>(Frame::DeliverSmResp);

        registry.register_pdu::<EnquireLink, _>(Frame::EnquireLink);
        registry.register_pdu::<EnquireLinkResponse, _>(Frame::EnquireLinkResp);
        registry.register_pdu::<Unbind, _>(Frame::Unbind);
        registry.register_pdu::<UnbindResponse, _>(Frame::UnbindResp);
        registry.register_pdu::<GenericNack, _>(Frame::GenericNack);

        registry
    }

    /// Shared registry used by `Frame::parse`
    pub fn global() -> &'static PduRegistry {
        static REGISTRY: OnceLock<PduRegistry> = OnceLock::new();
        REGISTRY.get_or_init(PduRegistry::new)
    }

    fn register_pdu<T, F>(&mut self, frame_constructor: F)
    where
        T: Decodable + 'static,
        F: Fn(T) -> Frame + Clone + Send + Sync + 'static,
    {
        for &command_id in T::command_ids() {
            let constructor = frame_constructor.clone();
            let decoder = Box::new(move |header: PduHeader, buf: &mut Cursor<&[u8]>| {
                let pdu = T::decode(header, buf)?;
                Ok(constructor(pdu))
            });
            self.decoders.insert(command_id, decoder);
        }
    }

    /// Decode a PDU given its header and a cursor over exactly its body
    pub fn decode_pdu(
        &self,
        header: PduHeader,
        buf: &mut Cursor<&[u8]>,
    ) -> Result<Frame, CodecError> {
        match self.decoders.get(&header.command_id) {
            Some(decoder) => decoder(header, buf),
            None => {
                let body = buf.copy_to_bytes(buf.remaining());
                tracing::warn!(
                    command_id = format_args!("{:#010x}", u32::from(header.command_id)),
                    "unknown PDU, treating body as opaque"
                );
                Ok(Frame::Unknown { header, body })
            }
        }
    }

    pub fn is_registered(&self, command_id: CommandId) -> bool {
        self.decoders.contains_key(&command_id)
    }
}

impl Default for PduRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    /// Get the command_id for this frame
    pub fn command_id(&self) -> CommandId {
        match self {
            Frame::Bind(pdu) => pdu.bind_type.request_command_id(),
            Frame::BindResp(pdu) => pdu.bind_type.response_command_id(),
            Frame::SubmitSm(_) => CommandId::SubmitSm,
            Frame::SubmitSmResp(_) => CommandId::SubmitSmResp,
            Frame::DeliverSm(_) => CommandId::DeliverSm,
            Frame::DeliverSmResp(_) => CommandId::DeliverSmResp,
            Frame::EnquireLink(_) => CommandId::EnquireLink,
            Frame::EnquireLinkResp(_) => CommandId::EnquireLinkResp,
            Frame::Unbind(_) => CommandId::Unbind,
            Frame::UnbindResp(_) => CommandId::UnbindResp,
            Frame::GenericNack(_) => CommandId::GenericNack,
            Frame::Unknown { header, .. } => header.command_id,
        }
    }

    /// Get the sequence number for this frame
    pub fn sequence_number(&self) -> u32 {
        match self {
            Frame::Bind(pdu) => pdu.sequence_number,
            Frame::BindResp(pdu) => pdu.sequence_number,
            Frame::SubmitSm(pdu) => pdu.sequence_number,
            Frame::SubmitSmResp(pdu) => pdu.sequence_number,
            Frame::DeliverSm(pdu) => pdu.sequence_number,
            Frame::DeliverSmResp(pdu) => pdu.sequence_number,
            Frame::EnquireLink(pdu) => pdu.sequence_number,
            Frame::EnquireLinkResp(pdu) => pdu.sequence_number,
            Frame::Unbind(pdu) => pdu.sequence_number,
            Frame::UnbindResp(pdu) => pdu.sequence_number,
            Frame::GenericNack(pdu) => pdu.sequence_number,
            Frame::Unknown { header, .. } => header.sequence_number,
        }
    }

    /// The command_status carried in the header (always Ok for requests)
    pub fn command_status(&self) -> CommandStatus {
        match self {
            Frame::BindResp(pdu) => pdu.command_status,
            Frame::SubmitSmResp(pdu) => pdu.command_status,
            Frame::DeliverSmResp(pdu) => pdu.command_status,
            Frame::EnquireLinkResp(pdu) => pdu.command_status,
            Frame::UnbindResp(pdu) => pdu.command_status,
            Frame::GenericNack(pdu) => pdu.command_status,
            Frame::Unknown { header, .. } => header.command_status,
            _ => CommandStatus::Ok,
        }
    }

    /// Check if this frame is a response PDU
    pub fn is_response(&self) -> bool {
        self.command_id().is_response()
    }

    /// Check whether a complete PDU is buffered. Returns its command_length.
    pub fn check(buf: &mut Cursor<&[u8]>) -> Result<usize, CodecError> {
        if buf.remaining() < PduHeader::SIZE {
            return Err(CodecError::Incomplete);
        }

        let command_length = peek_u32(buf);
        if !(PduHeader::SIZE as u32..=MAX_PDU_SIZE).contains(&command_length) {
            return Err(CodecError::InvalidPduLength {
                length: command_length,
                min: PduHeader::SIZE as u32,
                max: MAX_PDU_SIZE,
            });
        }

        if buf.remaining() < command_length as usize {
            return Err(CodecError::Incomplete);
        }

        Ok(command_length as usize)
    }

    /// Parse one complete PDU. The cursor must start at a header and hold at
    /// least command_length bytes (see `check`).
    pub fn parse(buf: &mut Cursor<&[u8]>) -> Result<Frame, CodecError> {
        let start = buf.position() as usize;
        let header = PduHeader::decode(buf)?;

        let end = start + header.command_length as usize;
        let all = *buf.get_ref();
        if all.len() < end {
            return Err(CodecError::Incomplete);
        }

        // Decoders see exactly this PDU's body so trailing TLVs stop at the boundary
        let mut body = Cursor::new(&all[start + PduHeader::SIZE..end]);
        let frame = PduRegistry::global().decode_pdu(header, &mut body)?;

        buf.set_position(end as u64);
        Ok(frame)
    }
}

impl Encodable for Frame {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        match self {
            Frame::Bind(pdu) => pdu.encode(buf),
            Frame::BindResp(pdu) => pdu.encode(buf),
            Frame::SubmitSm(pdu) => pdu.encode(buf),
            Frame::SubmitSmResp(pdu) => pdu.encode(buf),
            Frame::DeliverSm(pdu) => pdu.encode(buf),
            Frame::DeliverSmResp(pdu) => pdu.encode(buf),
            Frame::EnquireLink(pdu) => pdu.encode(buf),
            Frame::EnquireLinkResp(pdu) => pdu.encode(buf),
            Frame::Unbind(pdu) => pdu.encode(buf),
            Frame::UnbindResp(pdu) => pdu.encode(buf),
            Frame::GenericNack(pdu) => pdu.encode(buf),
            Frame::Unknown { header, .. } => Err(CodecError::Unencodable(header.command_id)),
        }
    }
}

fn peek_u32(buf: &Cursor<&[u8]>) -> u32 {
    let chunk = buf.chunk();
    u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{BindType, InterfaceVersion, NumericPlanIndicator, TypeOfNumber};

    #[test]
    fn pdu_header_encode_decode() {
        let header = PduHeader {
            command_length: 16,
            command_id: CommandId::EnquireLink,
            command_status: CommandStatus::Ok,
            sequence_number: 42,
        };

        let mut buf = BytesMut::new();
        header.encode(&mut buf).unwrap();

        let mut cursor = Cursor::new(buf.as_ref());
        let decoded = PduHeader::decode(&mut cursor).unwrap();

        assert_eq!(header, decoded);
    }

    #[test]
    fn pdu_header_validation() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x08, // command_length too small
            0x00, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x01, // sequence_number
        ];
        let mut cursor = Cursor::new(data);
        let result = PduHeader::decode(&mut cursor);
        assert!(matches!(result, Err(CodecError::InvalidPduLength { .. })));

        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x10, // command_length
            0x00, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x00, // sequence_number (reserved)
        ];
        let mut cursor = Cursor::new(data);
        let result = PduHeader::decode(&mut cursor);
        assert!(matches!(result, Err(CodecError::ReservedSequenceNumber(0))));
    }

    #[test]
    fn generic_nack_allows_zero_sequence() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x10, // command_length
            0x80, 0x00, 0x00, 0x00, // generic_nack
            0x00, 0x00, 0x00, 0x02, // ESME_RINVCMDLEN
            0x00, 0x00, 0x00, 0x00, // sequence_number
        ];
        let mut cursor = Cursor::new(data);
        let frame = Frame::parse(&mut cursor).unwrap();
        assert_eq!(frame.command_id(), CommandId::GenericNack);
        assert_eq!(frame.command_status(), CommandStatus::InvalidCommandLength);
    }

    #[test]
    fn vendor_status_is_preserved() {
        let data: &[u8] = &[
            0x00, 0x00, 0x00, 0x11, // command_length
            0x80, 0x00, 0x00, 0x04, // submit_sm_resp
            0x00, 0x00, 0x04, 0x0B, // vendor specific status
            0x00, 0x00, 0x00, 0x07, // sequence_number
            0x00, // empty message_id
        ];
        let mut cursor = Cursor::new(data);
        let frame = Frame::parse(&mut cursor).unwrap();
        assert_eq!(frame.command_status(), CommandStatus::Other(0x40B));
        assert_eq!(u32::from(frame.command_status()), 0x40B);
    }

    #[test]
    fn decode_cstring_variable_length() {
        let data = b"hello\0rest";
        let mut cursor = Cursor::new(&data[..]);
        let result = decode_cstring(&mut cursor, 16, "test").unwrap();
        assert_eq!(result, "hello");
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn decode_cstring_rejects_unterminated_field() {
        let data = b"0123456789abcdefXYZ";
        let mut cursor = Cursor::new(&data[..]);
        let result = decode_cstring(&mut cursor, 16, "system_id");
        assert!(matches!(
            result,
            Err(CodecError::FieldValidation { field: "system_id", .. })
        ));
    }

    #[test]
    fn encode_cstring_enforces_length() {
        let mut buf = BytesMut::new();
        encode_cstring(&mut buf, "hello", 10, "test").unwrap();
        assert_eq!(buf.as_ref(), b"hello\0");

        let err = encode_cstring(&mut buf, "0123456789", 10, "test");
        assert!(err.is_err());
    }

    #[test]
    fn frame_check_waits_for_full_pdu() {
        let bytes = EnquireLink::new(9).to_bytes().unwrap();

        let partial = &bytes[..10];
        let mut cursor = Cursor::new(partial);
        assert!(matches!(Frame::check(&mut cursor), Err(CodecError::Incomplete)));

        let mut cursor = Cursor::new(bytes.as_ref());
        assert_eq!(Frame::check(&mut cursor).unwrap(), 16);
    }

    #[test]
    fn frame_check_rejects_oversized_length() {
        let data = vec![
            0xFF, 0xFF, 0xFF, 0xFF, // command_length = max u32
            0x00, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x01, // sequence_number
        ];
        let mut cursor = Cursor::new(data.as_slice());
        assert!(matches!(
            Frame::check(&mut cursor),
            Err(CodecError::InvalidPduLength { .. })
        ));
    }

    #[test]
    fn registry_decodes_unknown_command_as_opaque() {
        let mut pdu_data = Vec::new();
        pdu_data.extend_from_slice(&20u32.to_be_bytes());
        pdu_data.extend_from_slice(&0x0000_000Au32.to_be_bytes()); // reserved id
        pdu_data.extend_from_slice(&0u32.to_be_bytes());
        pdu_data.extend_from_slice(&1u32.to_be_bytes());
        pdu_data.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]);

        let mut cursor = Cursor::new(pdu_data.as_slice());
        let frame = Frame::parse(&mut cursor).unwrap();

        match frame {
            Frame::Unknown { header, body } => {
                assert_eq!(u32::from(header.command_id), 0x0A);
                assert_eq!(body.as_ref(), &[0x01, 0x02, 0x03, 0x04]);
            }
            other => panic!("Expected Unknown frame, got {other:?}"),
        }
        assert_eq!(cursor.position(), 20);
    }

    #[test]
    fn registry_has_session_pdus() {
        let registry = PduRegistry::new();

        for command_id in [
            CommandId::BindTransmitter,
            CommandId::BindReceiverResp,
            CommandId::BindTransceiver,
            CommandId::SubmitSmResp,
            CommandId::DeliverSm,
            CommandId::EnquireLink,
            CommandId::UnbindResp,
            CommandId::GenericNack,
        ] {
            assert!(registry.is_registered(command_id), "{command_id:?}");
        }
        assert!(!registry.is_registered(CommandId::Other(0x0000_0103)));
    }

    #[test]
    fn parse_consumes_back_to_back_frames() {
        let mut wire = BytesMut::new();
        wire.extend_from_slice(&EnquireLink::new(1).to_bytes().unwrap());
        wire.extend_from_slice(&UnbindResponse::new(2).to_bytes().unwrap());

        let mut cursor = Cursor::new(wire.as_ref());
        let first = Frame::parse(&mut cursor).unwrap();
        let second = Frame::parse(&mut cursor).unwrap();

        assert_eq!(first.command_id(), CommandId::EnquireLink);
        assert_eq!(second.command_id(), CommandId::UnbindResp);
        assert_eq!(second.sequence_number(), 2);
        assert!(second.is_response());
    }

    #[test]
    fn frame_encode_patches_length() {
        let frame = Frame::Bind(BindRequest {
            bind_type: BindType::Transceiver,
            sequence_number: 3,
            system_id: "smppclient1".to_string(),
            password: "password".to_string(),
            system_type: String::new(),
            interface_version: InterfaceVersion::SmppV34,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: String::new(),
        });

        let bytes = frame.to_bytes().unwrap();
        assert_eq!(
            u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
            bytes.len()
        );

        let mut cursor = Cursor::new(bytes.as_ref());
        assert_eq!(Frame::parse(&mut cursor).unwrap(), frame);
    }

    #[test]
    fn unknown_frame_cannot_be_encoded() {
        let frame = Frame::Unknown {
            header: PduHeader {
                command_length: 16,
                command_id: CommandId::Other(0x0000_0103),
                command_status: CommandStatus::Ok,
                sequence_number: 1,
            },
            body: Bytes::new(),
        };
        assert!(matches!(frame.to_bytes(), Err(CodecError::Unencodable(_))));
    }
}
