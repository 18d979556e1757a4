use crate::datatypes::{
    CommandId, CommandStatus, DataCoding, EsmClass, NumericPlanIndicator, Tlv, TypeOfNumber,
};
use crate::macros::{impl_message_id_response, impl_short_message_pdu};
use bytes::Bytes;

/// This operation is used by the SMSC to deliver a short message to an ESME.
/// The deliver_sm PDU is used to deliver both mobile originated messages and
/// delivery receipts from the SMSC to the ESME.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DeliverSm {
    pub sequence_number: u32,

    pub service_type: String,
    pub source_addr_ton: TypeOfNumber,
    pub source_addr_npi: NumericPlanIndicator,
    pub source_addr: String,
    pub dest_addr_ton: TypeOfNumber,
    pub dest_addr_npi: NumericPlanIndicator,
    pub destination_addr: String,
    pub esm_class: EsmClass,
    pub protocol_id: u8,
    pub priority_flag: u8,
    // Unused on deliver_sm, always empty
    pub schedule_delivery_time: String,
    pub validity_period: String,
    pub registered_delivery: u8,
    pub replace_if_present_flag: u8,
    pub data_coding: DataCoding,
    pub sm_default_msg_id: u8,
    pub short_message: Bytes,

    pub tlvs: Vec<Tlv>,
}

impl DeliverSm {
    pub fn is_delivery_receipt(&self) -> bool {
        self.esm_class.is_delivery_receipt()
    }
}

/// deliver_sm_resp. The message_id is unused and sent empty.
#[derive(Clone, Debug, PartialEq)]
pub struct DeliverSmResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
    pub message_id: String,
}

impl_short_message_pdu!(DeliverSm, CommandId::DeliverSm);
impl_message_id_response!(DeliverSmResponse, CommandId::DeliverSmResp);
