use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_header_only_pdu;

/// GenericNack is used to acknowledge the receipt of a PDU when the receiving
/// entity cannot process the PDU due to errors such as invalid command_id,
/// invalid command_status, or other format errors.
///
/// The generic_nack PDU has no message body and only contains the standard
/// SMPP header.
#[derive(Clone, Debug, PartialEq)]
pub struct GenericNack {
    /// The command_status field indicates the reason for the generic_nack
    pub command_status: CommandStatus,
    /// The sequence_number from the original PDU that caused the error.
    /// If the original sequence_number cannot be determined, this should be 0.
    pub sequence_number: u32,
}

impl GenericNack {
    /// Creates a new GenericNack with the specified command status and sequence number
    pub fn new(command_status: CommandStatus, sequence_number: u32) -> Self {
        Self {
            command_status,
            sequence_number,
        }
    }

    /// Creates a GenericNack for an invalid command ID error
    pub fn invalid_command_id(sequence_number: u32) -> Self {
        Self::new(CommandStatus::InvalidCommandId, sequence_number)
    }
}

impl_header_only_pdu!(GenericNack, CommandId::GenericNack);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encodable;

    #[test]
    fn generic_nack_to_bytes() {
        let bytes = GenericNack::invalid_command_id(0x2A).to_bytes().unwrap();

        let expected: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x10, // command_length
            0x80, 0x00, 0x00, 0x00, // command_id
            0x00, 0x00, 0x00, 0x03, // ESME_RINVCMDID
            0x00, 0x00, 0x00, 0x2A, // sequence_number
        ];
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }
}
