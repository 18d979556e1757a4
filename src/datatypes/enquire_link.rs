use crate::datatypes::{CommandId, CommandStatus};
use crate::macros::impl_complete_header_only_pdu;

/// Keep-alive probe. Either side may send it at any time while bound.
#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLink {
    // EnquireLink always sets the command status to NULL
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnquireLinkResponse {
    pub command_status: CommandStatus,
    pub sequence_number: u32,
}

impl_complete_header_only_pdu!(EnquireLink, CommandId::EnquireLink);
impl_complete_header_only_pdu!(EnquireLinkResponse, CommandId::EnquireLinkResp);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Encodable;

    #[test]
    fn enquire_link_to_bytes() {
        let bytes = EnquireLink::new(1).to_bytes().unwrap();

        let expected: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x10, // command_length
            0x00, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x00, 0x00, 0x00, 0x01, // sequence_number
        ];
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }

    #[test]
    fn enquire_link_response_to_bytes() {
        let bytes = EnquireLinkResponse::new(0x0102_0304).to_bytes().unwrap();

        let expected: Vec<u8> = vec![
            0x00, 0x00, 0x00, 0x10, // command_length
            0x80, 0x00, 0x00, 0x15, // command_id
            0x00, 0x00, 0x00, 0x00, // command_status
            0x01, 0x02, 0x03, 0x04, // sequence_number
        ];
        assert_eq!(bytes.as_ref(), expected.as_slice());
    }
}
