use crate::datatypes::{
    CommandId, CommandStatus, DataCoding, EsmClass, NumericPlanIndicator, Tlv, TypeOfNumber,
};
use crate::macros::{impl_message_id_response, impl_short_message_pdu};
use bytes::Bytes;

/// This operation is used by an ESME to submit a short message to the SMSC for onward transmission
/// to a specified short message entity (SME).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct SubmitSm {
    pub sequence_number: u32,

    // Mandatory parameters
    /// 4.1.1 service_type: SMS application service associated with the message. Empty for the
    ///       SMSC default. Max length: 5 octets.
    pub service_type: String,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    /// 4.1.4 source_addr: Max length 20 octets.
    pub source_addr: String,
    pub dest_addr_ton: TypeOfNumber,
    pub dest_addr_npi: NumericPlanIndicator,
    /// 4.1.7 destination_addr: Max length 20 octets.
    pub destination_addr: String,
    /// 4.1.8 esm_class: UDHI (0x40) is set when short_message starts with a User Data Header.
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: u8,
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: DataCoding,
    pub sm_default_msg_id: u8,
    /// 4.1.18 short_message: up to 254 octets of user data; sm_length is derived from it.
    pub short_message: Bytes,

    // Optional parameters
    pub tlvs: Vec<Tlv>,
}

/// submit_sm_resp carries the SMSC-assigned message_id
#[derive(Clone, Debug, PartialEq)]
pub struct SubmitSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
}

impl_short_message_pdu!(SubmitSm, CommandId::SubmitSm);
impl_message_id_response!(SubmitSmResponse, CommandId::SubmitSmResp);
