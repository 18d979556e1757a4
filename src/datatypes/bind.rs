use crate::codec::{
    decode_cstring, decode_u8, encode_cstring, encode_header, CodecError, Decodable, Encodable,
    PduHeader,
};
use crate::datatypes::tlv::{tags, Tlv};
use crate::datatypes::{
    CommandId, CommandStatus, InterfaceVersion, NumericPlanIndicator, TypeOfNumber,
    MAX_PASSWORD_LENGTH, MAX_SYSTEM_ID_LENGTH, MAX_SYSTEM_TYPE_LENGTH,
};
use bytes::{Buf, BufMut, BytesMut};
use std::io::Cursor;

const MAX_ADDRESS_RANGE_LENGTH: usize = 40;

/// Type of SMPP bind operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BindType {
    /// Bind as transmitter (can send submit_sm)
    Transmitter,
    /// Bind as receiver (can receive deliver_sm)
    Receiver,
    /// Bind as transceiver (both transmitter and receiver capabilities)
    #[default]
    Transceiver,
}

impl BindType {
    pub fn request_command_id(self) -> CommandId {
        match self {
            BindType::Transmitter => CommandId::BindTransmitter,
            BindType::Receiver => CommandId::BindReceiver,
            BindType::Transceiver => CommandId::BindTransceiver,
        }
    }

    pub fn response_command_id(self) -> CommandId {
        self.request_command_id().response_id()
    }

    /// Inverse of `request_command_id` / `response_command_id`
    pub fn from_command_id(command_id: CommandId) -> Option<BindType> {
        match command_id {
            CommandId::BindTransmitter | CommandId::BindTransmitterResp => {
                Some(BindType::Transmitter)
            }
            CommandId::BindReceiver | CommandId::BindReceiverResp => Some(BindType::Receiver),
            CommandId::BindTransceiver | CommandId::BindTransceiverResp => {
                Some(BindType::Transceiver)
            }
            _ => None,
        }
    }

    /// Whether a session bound this way may submit messages
    pub fn can_transmit(self) -> bool {
        matches!(self, BindType::Transmitter | BindType::Transceiver)
    }

    /// Whether a session bound this way receives deliver_sm
    pub fn can_receive(self) -> bool {
        matches!(self, BindType::Receiver | BindType::Transceiver)
    }

    /// Short form used by operator tooling ("tx", "rx", "trx")
    pub fn as_str(self) -> &'static str {
        match self {
            BindType::Transmitter => "tx",
            BindType::Receiver => "rx",
            BindType::Transceiver => "trx",
        }
    }
}

impl std::str::FromStr for BindType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tx" | "transmitter" => Ok(BindType::Transmitter),
            "rx" | "receiver" => Ok(BindType::Receiver),
            "trx" | "transceiver" => Ok(BindType::Transceiver),
            other => Err(format!("unknown bind type '{other}', expected tx, rx or trx")),
        }
    }
}

/// bind_transmitter / bind_receiver / bind_transceiver. The three requests
/// share one body layout; `bind_type` selects the command id.
#[derive(Clone, Debug, PartialEq)]
pub struct BindRequest {
    pub bind_type: BindType,
    pub sequence_number: u32,

    /// 5.2.1 system_id: identification of the ESME requesting to bind. Up
    ///       to 15 characters.
    pub system_id: String,

    /// 5.2.2 password: up to 8 characters; empty when the SMSC needs none.
    pub password: String,

    /// 5.2.3 system_type: categorizes the ESME ("VMS", "OTA"...). Up to 12
    ///       characters.
    pub system_type: String,

    /// 5.2.4 interface_version: SMPP version supported by the ESME.
    pub interface_version: InterfaceVersion,

    pub addr_ton: TypeOfNumber,
    pub addr_npi: NumericPlanIndicator,

    /// 5.2.7 address_range: range of SME addresses served by the ESME.
    pub address_range: String,
}

impl Decodable for BindRequest {
    fn command_ids() -> &'static [CommandId] {
        &[
            CommandId::BindTransmitter,
            CommandId::BindReceiver,
            CommandId::BindTransceiver,
        ]
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let bind_type = BindType::from_command_id(header.command_id).ok_or(
            CodecError::UnexpectedCommandId {
                expected: CommandId::BindTransceiver,
                actual: header.command_id,
            },
        )?;

        let system_id = decode_cstring(buf, MAX_SYSTEM_ID_LENGTH + 1, "system_id")?;
        let password = decode_cstring(buf, MAX_PASSWORD_LENGTH + 1, "password")?;
        let system_type = decode_cstring(buf, MAX_SYSTEM_TYPE_LENGTH + 1, "system_type")?;

        let interface_version = InterfaceVersion::try_from(decode_u8(buf)?).map_err(|e| {
            CodecError::FieldValidation {
                field: "interface_version",
                reason: e.to_string(),
            }
        })?;
        let addr_ton =
            TypeOfNumber::try_from(decode_u8(buf)?).map_err(|e| CodecError::FieldValidation {
                field: "addr_ton",
                reason: e.to_string(),
            })?;
        let addr_npi = NumericPlanIndicator::try_from(decode_u8(buf)?).map_err(|e| {
            CodecError::FieldValidation {
                field: "addr_npi",
                reason: e.to_string(),
            }
        })?;

        let address_range = decode_cstring(buf, MAX_ADDRESS_RANGE_LENGTH + 1, "address_range")?;

        Ok(BindRequest {
            bind_type,
            sequence_number: header.sequence_number,
            system_id,
            password,
            system_type,
            interface_version,
            addr_ton,
            addr_npi,
            address_range,
        })
    }
}

impl Encodable for BindRequest {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        encode_header(
            buf,
            self.bind_type.request_command_id(),
            CommandStatus::Ok,
            self.sequence_number,
        )?;

        encode_cstring(buf, &self.system_id, MAX_SYSTEM_ID_LENGTH + 1, "system_id")?;
        encode_cstring(buf, &self.password, MAX_PASSWORD_LENGTH + 1, "password")?;
        encode_cstring(buf, &self.system_type, MAX_SYSTEM_TYPE_LENGTH + 1, "system_type")?;
        buf.put_u8(self.interface_version as u8);
        buf.put_u8(self.addr_ton as u8);
        buf.put_u8(self.addr_npi as u8);
        encode_cstring(
            buf,
            &self.address_range,
            MAX_ADDRESS_RANGE_LENGTH + 1,
            "address_range",
        )
    }
}

/// bind_*_resp. On error the SMSC may omit the body.
#[derive(Clone, Debug, PartialEq)]
pub struct BindResponse {
    pub bind_type: BindType,
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub system_id: String,
    pub sc_interface_version: Option<InterfaceVersion>,
}

impl BindResponse {
    pub fn new(bind_type: BindType, sequence_number: u32, system_id: impl Into<String>) -> Self {
        Self {
            bind_type,
            command_status: CommandStatus::Ok,
            sequence_number,
            system_id: system_id.into(),
            sc_interface_version: None,
        }
    }

    pub fn error(bind_type: BindType, sequence_number: u32, status: CommandStatus) -> Self {
        Self {
            bind_type,
            command_status: status,
            sequence_number,
            system_id: String::new(),
            sc_interface_version: None,
        }
    }
}

impl Decodable for BindResponse {
    fn command_ids() -> &'static [CommandId] {
        &[
            CommandId::BindTransmitterResp,
            CommandId::BindReceiverResp,
            CommandId::BindTransceiverResp,
        ]
    }

    fn decode(header: PduHeader, buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        Self::validate_header(&header)?;

        let bind_type = BindType::from_command_id(header.command_id).ok_or(
            CodecError::UnexpectedCommandId {
                expected: CommandId::BindTransceiverResp,
                actual: header.command_id,
            },
        )?;

        let system_id = if buf.has_remaining() {
            decode_cstring(buf, MAX_SYSTEM_ID_LENGTH + 1, "system_id")?
        } else {
            String::new()
        };

        let sc_interface_version = Tlv::decode_all(buf)?
            .into_iter()
            .find(|tlv| tlv.tag == tags::SC_INTERFACE_VERSION)
            .and_then(|tlv| tlv.value.first().copied())
            .and_then(|raw| InterfaceVersion::try_from(raw).ok());

        Ok(BindResponse {
            bind_type,
            command_status: header.command_status,
            sequence_number: header.sequence_number,
            system_id,
            sc_interface_version,
        })
    }
}

impl Encodable for BindResponse {
    fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        encode_header(
            buf,
            self.bind_type.response_command_id(),
            self.command_status,
            self.sequence_number,
        )?;

        encode_cstring(buf, &self.system_id, MAX_SYSTEM_ID_LENGTH + 1, "system_id")?;

        if let Some(version) = self.sc_interface_version {
            Tlv::new(tags::SC_INTERFACE_VERSION, vec![version as u8]).encode(buf)?;
        }
        Ok(())
    }
}
