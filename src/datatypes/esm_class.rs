// ABOUTME: SMPP esm_class bitfield as a small copyable newtype
// ABOUTME: Tracks the UDHI and reply-path features plus the delivery receipt message type

use std::fmt;

/// esm_class octet. Bits 1-0 are the messaging mode, bits 5-2 the message
/// type and bits 7-6 the GSM network features.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EsmClass(u8);

impl EsmClass {
    /// User Data Header Indicator: short_message starts with a UDH
    pub const UDHI: u8 = 0x40;
    pub const REPLY_PATH: u8 = 0x80;

    const MESSAGE_TYPE_MASK: u8 = 0b0011_1100;
    const DELIVERY_RECEIPT: u8 = 0b0000_0100;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn has_udhi(self) -> bool {
        self.0 & Self::UDHI != 0
    }

    pub fn with_udhi(self) -> Self {
        Self(self.0 | Self::UDHI)
    }

    pub fn without_udhi(self) -> Self {
        Self(self.0 & !Self::UDHI)
    }

    pub fn has_reply_path(self) -> bool {
        self.0 & Self::REPLY_PATH != 0
    }

    /// deliver_sm carrying an SMSC delivery receipt rather than an MO message
    pub fn is_delivery_receipt(self) -> bool {
        self.0 & Self::MESSAGE_TYPE_MASK == Self::DELIVERY_RECEIPT
    }
}

impl From<u8> for EsmClass {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<EsmClass> for u8 {
    fn from(esm: EsmClass) -> Self {
        esm.0
    }
}

impl fmt::Debug for EsmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EsmClass")
            .field("bits", &format_args!("{:#04x}", self.0))
            .field("udhi", &self.has_udhi())
            .finish()
    }
}
