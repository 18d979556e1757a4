use crate::codec::CodecError;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;

/// Well-known optional parameter tags seen on session PDUs
pub mod tags {
    pub const SC_INTERFACE_VERSION: u16 = 0x0210;
    pub const RECEIPTED_MESSAGE_ID: u16 = 0x001E;
    pub const MESSAGE_STATE: u16 = 0x0427;
    pub const MESSAGE_PAYLOAD: u16 = 0x0424;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Tlv {
    /// The Tag field is used to uniquely identify the particular optional parameter in question.
    pub tag: u16,

    /// The Value field contains the actual data for the optional parameter in question.
    /// Its length is written as the Length field on the wire.
    pub value: Bytes,
}

impl Tlv {
    pub fn new(tag: u16, value: impl Into<Bytes>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        let length = u16::try_from(self.value.len())
            .map_err(|_| CodecError::TlvError(format!("value for tag {:#06x} too long", self.tag)))?;

        buf.put_u16(self.tag);
        buf.put_u16(length);
        buf.put_slice(&self.value);
        Ok(())
    }

    pub fn encoded_size(&self) -> usize {
        4 + self.value.len()
    }

    /// Decode one TLV from the cursor
    pub fn decode(buf: &mut Cursor<&[u8]>) -> Result<Self, CodecError> {
        if buf.remaining() < 4 {
            return Err(CodecError::TlvError(format!(
                "truncated TLV header: {} octets left",
                buf.remaining()
            )));
        }

        let tag = buf.get_u16();
        let length = buf.get_u16() as usize;
        if buf.remaining() < length {
            return Err(CodecError::TlvError(format!(
                "tag {tag:#06x} declares {length} octets, {} available",
                buf.remaining()
            )));
        }

        Ok(Self {
            tag,
            value: buf.copy_to_bytes(length),
        })
    }

    /// Decode every TLV until the cursor is exhausted
    pub fn decode_all(buf: &mut Cursor<&[u8]>) -> Result<Vec<Tlv>, CodecError> {
        let mut tlvs = Vec::new();
        while buf.has_remaining() {
            tlvs.push(Tlv::decode(buf)?);
        }
        Ok(tlvs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tlv_to_bytes() {
        let tlv = Tlv::new(tags::SC_INTERFACE_VERSION, vec![0x34]);
        let mut buf = BytesMut::new();
        tlv.encode(&mut buf).unwrap();

        assert_eq!(buf.as_ref(), &[0x02, 0x10, 0x00, 0x01, 0x34]);
        assert_eq!(tlv.encoded_size(), 5);
    }

    #[test]
    fn decode_all_reads_consecutive_tlvs() {
        let data: &[u8] = &[
            0x00, 0x1E, 0x00, 0x03, b'a', b'b', 0x00, // receipted_message_id
            0x04, 0x27, 0x00, 0x01, 0x02, // message_state
        ];
        let mut cursor = Cursor::new(data);
        let tlvs = Tlv::decode_all(&mut cursor).unwrap();

        assert_eq!(tlvs.len(), 2);
        assert_eq!(tlvs[0].tag, tags::RECEIPTED_MESSAGE_ID);
        assert_eq!(tlvs[1].value.as_ref(), &[0x02]);
    }

    #[test]
    fn decode_rejects_truncated_value() {
        let data: &[u8] = &[0x04, 0x24, 0x00, 0x10, 0x01];
        let mut cursor = Cursor::new(data);
        assert!(matches!(Tlv::decode(&mut cursor), Err(CodecError::TlvError(_))));
    }
}
