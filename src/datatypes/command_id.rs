use num_enum::{FromPrimitive, IntoPrimitive};

/// SMPP v3.4 command identifiers for the session PDUs. Anything else decodes
/// to `Other` so unknown requests can be answered with generic_nack.
#[derive(FromPrimitive, IntoPrimitive)]
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    GenericNack = 0x8000_0000,
    BindReceiver = 0x0000_0001,
    BindReceiverResp = 0x8000_0001,
    BindTransmitter = 0x0000_0002,
    BindTransmitterResp = 0x8000_0002,
    SubmitSm = 0x0000_0004,
    SubmitSmResp = 0x8000_0004,
    DeliverSm = 0x0000_0005,
    DeliverSmResp = 0x8000_0005,
    Unbind = 0x0000_0006,
    UnbindResp = 0x8000_0006,
    BindTransceiver = 0x0000_0009,
    BindTransceiverResp = 0x8000_0009,
    EnquireLink = 0x0000_0015,
    EnquireLinkResp = 0x8000_0015,
    #[num_enum(catch_all)]
    Other(u32),
}

impl CommandId {
    /// Check if this command_id represents a response PDU
    pub fn is_response(&self) -> bool {
        u32::from(*self) & 0x8000_0000 != 0
    }

    /// The response id paired with a request id
    pub fn response_id(&self) -> CommandId {
        CommandId::from(u32::from(*self) | 0x8000_0000)
    }

    /// Lower-case SMPP name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            CommandId::GenericNack => "generic_nack",
            CommandId::BindReceiver => "bind_receiver",
            CommandId::BindReceiverResp => "bind_receiver_resp",
            CommandId::BindTransmitter => "bind_transmitter",
            CommandId::BindTransmitterResp => "bind_transmitter_resp",
            CommandId::SubmitSm => "submit_sm",
            CommandId::SubmitSmResp => "submit_sm_resp",
            CommandId::DeliverSm => "deliver_sm",
            CommandId::DeliverSmResp => "deliver_sm_resp",
            CommandId::Unbind => "unbind",
            CommandId::UnbindResp => "unbind_resp",
            CommandId::BindTransceiver => "bind_transceiver",
            CommandId::BindTransceiverResp => "bind_transceiver_resp",
            CommandId::EnquireLink => "enquire_link",
            CommandId::EnquireLinkResp => "enquire_link_resp",
            CommandId::Other(_) => "unknown",
        }
    }
}
