// ABOUTME: Connection, engine and message configuration for the session engine
// ABOUTME: Builders carry the operator defaults; validation happens before any transport activity

use crate::client::error::{SmppError, SmppResult};
use crate::client::keepalive::KeepAliveConfig;
use crate::datatypes::{
    BindRequest, BindType, CommandStatus, DataCoding, EsmClass, InterfaceVersion,
    NumericPlanIndicator, SubmitSm, TypeOfNumber, MAX_ADDRESS_LENGTH, MAX_PASSWORD_LENGTH,
    MAX_SYSTEM_ID_LENGTH, MAX_SYSTEM_TYPE_LENGTH,
};
use crate::event_log::DEFAULT_LOG_CAPACITY;
use crate::segmenter::MessagePart;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 2775;

/// Where and how to bind. Only consulted when `bind` is called, so changes
/// take effect on the next bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub system_id: String,
    pub password: String,
    pub bind_type: BindType,
    /// Empty when the SMSC does not need one
    pub system_type: String,
    pub interface_version: InterfaceVersion,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            system_id: String::new(),
            password: String::new(),
            bind_type: BindType::Transceiver,
            system_type: String::new(),
            interface_version: InterfaceVersion::SmppV34,
        }
    }
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        system_id: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            system_id: system_id.into(),
            password: password.into(),
            ..Default::default()
        }
    }

    pub fn with_bind_type(mut self, bind_type: BindType) -> Self {
        self.bind_type = bind_type;
        self
    }

    pub fn with_system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = system_type.into();
        self
    }

    pub fn with_version(mut self, interface_version: InterfaceVersion) -> Self {
        self.interface_version = interface_version;
        self
    }

    /// Required fields and SMPP length limits
    pub fn validate(&self) -> SmppResult<()> {
        if self.host.trim().is_empty() {
            return Err(SmppError::Config("host is required".into()));
        }
        if self.port == 0 {
            return Err(SmppError::Config("port must be non-zero".into()));
        }
        if self.system_id.is_empty() {
            return Err(SmppError::Config("system_id is required".into()));
        }
        check_length("system_id", &self.system_id, MAX_SYSTEM_ID_LENGTH)?;
        check_length("password", &self.password, MAX_PASSWORD_LENGTH)?;
        check_length("system_type", &self.system_type, MAX_SYSTEM_TYPE_LENGTH)?;
        Ok(())
    }

    pub(crate) fn bind_request(&self, sequence_number: u32) -> BindRequest {
        BindRequest {
            bind_type: self.bind_type,
            sequence_number,
            system_id: self.system_id.clone(),
            password: self.password.clone(),
            system_type: self.system_type.clone(),
            interface_version: self.interface_version,
            addr_ton: TypeOfNumber::Unknown,
            addr_npi: NumericPlanIndicator::Unknown,
            address_range: String::new(),
        }
    }
}

fn check_length(field: &str, value: &str, max: usize) -> SmppResult<()> {
    if value.len() > max {
        return Err(SmppError::Config(format!(
            "{field} is {} characters, maximum is {max}",
            value.len()
        )));
    }
    Ok(())
}

/// Engine-wide settings
///
/// ```rust
/// use smpp_sender::client::{EngineConfig, KeepAliveConfig};
/// use std::time::Duration;
///
/// let config = EngineConfig::default()
///     .with_log_capacity(20)
///     .with_keep_alive(KeepAliveConfig::disabled())
///     .with_request_timeout(Duration::from_secs(30));
/// assert_eq!(config.log_capacity, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub log_capacity: usize,
    pub keep_alive: KeepAliveConfig,
    /// Outstanding requests older than this resolve as timed out. `None`
    /// leaves them pending until a response or close.
    pub request_timeout: Option<Duration>,
    /// Record raw socket traffic in the event log
    pub log_socket_data: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_capacity: DEFAULT_LOG_CAPACITY,
            keep_alive: KeepAliveConfig::default(),
            request_timeout: None,
            log_socket_data: true,
        }
    }
}

impl EngineConfig {
    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: KeepAliveConfig) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_socket_data_logging(mut self, enabled: bool) -> Self {
        self.log_socket_data = enabled;
        self
    }
}

/// A text message to submit. Long bodies are split by the segmenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub source_addr: String,
    pub dest_addr: String,
    pub source_ton: TypeOfNumber,
    pub source_npi: NumericPlanIndicator,
    pub dest_ton: TypeOfNumber,
    pub dest_npi: NumericPlanIndicator,
    pub data_coding: DataCoding,
    /// Base esm_class; UDHI is set or cleared per part
    pub esm_class: EsmClass,
    pub registered_delivery: u8,
    pub body: String,
}

impl OutboundMessage {
    pub fn builder() -> OutboundMessageBuilder {
        OutboundMessageBuilder::default()
    }

    /// Both addresses present and within the submit_sm field limits
    pub fn validate(&self) -> SmppResult<()> {
        if self.source_addr.is_empty() {
            return Err(SmppError::Config("source address is required".into()));
        }
        if self.dest_addr.is_empty() {
            return Err(SmppError::Config("destination address is required".into()));
        }
        check_length("source address", &self.source_addr, MAX_ADDRESS_LENGTH)?;
        check_length("destination address", &self.dest_addr, MAX_ADDRESS_LENGTH)
    }

    /// submit_sm carrying one part. The UDH, when present, leads
    /// short_message and UDHI is set in esm_class.
    pub(crate) fn submit_sm(&self, part: &MessagePart, sequence_number: u32) -> SmppResult<SubmitSm> {
        let data_coding = part.data_coding(self.data_coding);
        let short_message = part
            .short_message(data_coding)
            .map_err(|e| SmppError::Config(e.to_string()))?;

        Ok(SubmitSm {
            sequence_number,
            source_addr_ton: self.source_ton,
            source_addr_npi: self.source_npi,
            source_addr: self.source_addr.clone(),
            dest_addr_ton: self.dest_ton,
            dest_addr_npi: self.dest_npi,
            destination_addr: self.dest_addr.clone(),
            esm_class: part.esm_class(self.esm_class),
            registered_delivery: self.registered_delivery,
            data_coding,
            short_message,
            ..Default::default()
        })
    }
}

/// Builder with the operator defaults: alphanumeric sender (TON 5, NPI 0),
/// international ISDN destination (TON 1, NPI 1), default alphabet and
/// esm_class 0x40.
#[derive(Debug)]
pub struct OutboundMessageBuilder {
    from: Option<String>,
    to: Option<String>,
    text: String,
    source_ton: TypeOfNumber,
    source_npi: NumericPlanIndicator,
    dest_ton: TypeOfNumber,
    dest_npi: NumericPlanIndicator,
    data_coding: DataCoding,
    esm_class: EsmClass,
    registered_delivery: u8,
}

impl Default for OutboundMessageBuilder {
    fn default() -> Self {
        Self {
            from: None,
            to: None,
            text: String::new(),
            source_ton: TypeOfNumber::Alphanumeric,
            source_npi: NumericPlanIndicator::Unknown,
            dest_ton: TypeOfNumber::International,
            dest_npi: NumericPlanIndicator::Isdn,
            data_coding: DataCoding::DEFAULT,
            esm_class: EsmClass::from_bits(EsmClass::UDHI),
            registered_delivery: 0,
        }
    }
}

impl OutboundMessageBuilder {
    pub fn from(mut self, source_addr: impl Into<String>) -> Self {
        self.from = Some(source_addr.into());
        self
    }

    pub fn to(mut self, dest_addr: impl Into<String>) -> Self {
        self.to = Some(dest_addr.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn source_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.source_ton = ton;
        self.source_npi = npi;
        self
    }

    pub fn dest_numbering(mut self, ton: TypeOfNumber, npi: NumericPlanIndicator) -> Self {
        self.dest_ton = ton;
        self.dest_npi = npi;
        self
    }

    pub fn data_coding(mut self, data_coding: DataCoding) -> Self {
        self.data_coding = data_coding;
        self
    }

    pub fn esm_class(mut self, esm_class: EsmClass) -> Self {
        self.esm_class = esm_class;
        self
    }

    pub fn with_delivery_receipt(mut self) -> Self {
        self.registered_delivery = 1;
        self
    }

    pub fn build(self) -> SmppResult<OutboundMessage> {
        let message = OutboundMessage {
            source_addr: self.from.unwrap_or_default(),
            dest_addr: self.to.unwrap_or_default(),
            source_ton: self.source_ton,
            source_npi: self.source_npi,
            dest_ton: self.dest_ton,
            dest_npi: self.dest_npi,
            data_coding: self.data_coding,
            esm_class: self.esm_class,
            registered_delivery: self.registered_delivery,
            body: self.text,
        };
        message.validate()?;
        Ok(message)
    }
}

/// What happened to one submitted part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartResult {
    Accepted { message_id: String },
    /// The SMSC answered with a non-zero command_status
    Rejected { status: CommandStatus },
    /// The connection closed before the response arrived, or the part could
    /// not be handed to the transport
    Closed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartOutcome {
    pub part_index: u8,
    pub part_count: u8,
    /// `None` when the part never reached the transport
    pub sequence_number: Option<u32>,
    pub result: PartResult,
}

impl PartOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self.result, PartResult::Accepted { .. })
    }
}
