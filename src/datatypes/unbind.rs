use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_complete_header_only_pdu;

/// The purpose of the SMPP unbind operation is to deregister an instance of an ESME from the SMSC
/// and inform the SMSC that the ESME no longer wishes to use this network connection for the
/// submission or delivery of messages.
///
/// Thus, the unbind operation may be viewed as a form of SMSC logoff request to close the current
/// SMPP session.
#[derive(Clone, Debug, PartialEq)]
pub struct Unbind {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnbindResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl_complete_header_only_pdu!(Unbind, CommandId::Unbind);
impl_complete_header_only_pdu!(UnbindResponse, CommandId::UnbindResp);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encodable;

    #[test]
    fn unbind_to_bytes() {
        let bytes = Unbind::new(7).to_bytes().unwrap();

        let expected: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x10, // command_length
            0x00, 0x00, 0x00, 0x06, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x07, // sequence_number
        ];
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn unbind_response_carries_status() {
        let bytes = UnbindResponse::error(7, CommandStatus::SystemError)
            .to_bytes()
            .unwrap();
        assert_eq!(&bytes[4..12], &[0x80, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x08]);
    }
}
