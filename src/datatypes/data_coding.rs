// ABOUTME: data_coding scheme values and text conversion to and from short_message octets
// ABOUTME: Default alphabet is GSM 03.38 one septet per octet, UCS-2 is UTF-16BE, Latin-1 byte-for-byte

use crate::codec::CodecError;
use bytes::Bytes;

/// GSM 03.38 default alphabet, in septet order
const GSM7_BASIC: &str = "@£$¥èéùìòÇ\nØø\rÅåΔ_ΦΓΛΩΠΨΣΘΞ\u{1b}ÆæßÉ !\"#¤%&'()*+,-./0123456789:;<=>?\
                          ¡ABCDEFGHIJKLMNOPQRSTUVWXYZÄÖÑÜ§¿abcdefghijklmnopqrstuvwxyzäöñüà";

/// Extension table, reached through the escape septet
const GSM7_EXTENDED: [(char, u8); 10] = [
    ('\u{c}', 0x0A),
    ('^', 0x14),
    ('{', 0x28),
    ('}', 0x29),
    ('\\', 0x2F),
    ('[', 0x3C),
    ('~', 0x3D),
    (']', 0x3E),
    ('|', 0x40),
    ('€', 0x65),
];

const GSM7_ESCAPE: u8 = 0x1B;

/// Septet of `c` in the default alphabet. The escape slot has no character.
pub fn gsm7_basic(c: char) -> Option<u8> {
    GSM7_BASIC
        .chars()
        .position(|b| b == c)
        .and_then(|i| u8::try_from(i).ok())
        .filter(|&septet| septet != GSM7_ESCAPE)
}

/// Septet of `c` in the extension table; on the wire it follows an escape
pub fn gsm7_extended(c: char) -> Option<u8> {
    GSM7_EXTENDED
        .iter()
        .find(|(e, _)| *e == c)
        .map(|(_, code)| *code)
}

/// data_coding octet of submit_sm / deliver_sm
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct DataCoding(u8);

impl DataCoding {
    /// SMSC default alphabet
    pub const DEFAULT: DataCoding = DataCoding(0x00);
    pub const IA5: DataCoding = DataCoding(0x01);
    pub const OCTET: DataCoding = DataCoding(0x02);
    pub const LATIN1: DataCoding = DataCoding(0x03);
    pub const UCS2: DataCoding = DataCoding(0x08);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn is_ucs2(self) -> bool {
        self == Self::UCS2
    }

    /// Convert text to the octets placed in short_message
    pub fn encode_text(self, text: &str) -> Result<Bytes, CodecError> {
        match self {
            Self::UCS2 => Ok(text
                .encode_utf16()
                .flat_map(|unit| unit.to_be_bytes())
                .collect::<Vec<u8>>()
                .into()),
            Self::LATIN1 => text
                .chars()
                .map(|c| {
                    u8::try_from(u32::from(c)).map_err(|_| CodecError::FieldValidation {
                        field: "short_message",
                        reason: format!("{c:?} is not representable in Latin-1"),
                    })
                })
                .collect::<Result<Vec<u8>, _>>()
                .map(Bytes::from),
            Self::DEFAULT => {
                let mut octets = Vec::with_capacity(text.len());
                for c in text.chars() {
                    if let Some(septet) = gsm7_basic(c) {
                        octets.push(septet);
                    } else if let Some(septet) = gsm7_extended(c) {
                        octets.extend([GSM7_ESCAPE, septet]);
                    } else {
                        return Err(CodecError::FieldValidation {
                            field: "short_message",
                            reason: format!("{c:?} is not in the GSM 03.38 default alphabet"),
                        });
                    }
                }
                Ok(octets.into())
            }
            _ => Ok(Bytes::copy_from_slice(text.as_bytes())),
        }
    }

    /// Best-effort text rendering of received short_message octets
    pub fn decode_text(self, octets: &[u8]) -> String {
        match self {
            Self::UCS2 => {
                let units: Vec<u16> = octets
                    .chunks(2)
                    .map(|pair| match pair {
                        [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                        [hi] => u16::from(*hi) << 8,
                        _ => 0,
                    })
                    .collect();
                String::from_utf16_lossy(&units)
            }
            Self::LATIN1 => octets.iter().map(|&b| char::from(b)).collect(),
            Self::DEFAULT => {
                let basic: Vec<char> = GSM7_BASIC.chars().collect();
                let mut text = String::with_capacity(octets.len());
                let mut iter = octets.iter().copied();
                while let Some(septet) = iter.next() {
                    let c = if septet == GSM7_ESCAPE {
                        iter.next().and_then(|code| {
                            GSM7_EXTENDED
                                .iter()
                                .find(|(_, e)| *e == code)
                                .map(|(c, _)| *c)
                        })
                    } else {
                        basic.get(usize::from(septet)).copied()
                    };
                    text.push(c.unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                text
            }
            _ => String::from_utf8_lossy(octets).into_owned(),
        }
    }
}

impl From<u8> for DataCoding {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<DataCoding> for u8 {
    fn from(dc: DataCoding) -> Self {
        dc.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ucs2_is_utf16_big_endian() {
        let octets = DataCoding::UCS2.encode_text("Hé€").unwrap();
        assert_eq!(octets.as_ref(), &[0x00, 0x48, 0x00, 0xE9, 0x20, 0xAC]);
        assert_eq!(DataCoding::UCS2.decode_text(&octets), "Hé€");
    }

    #[test]
    fn latin1_rejects_wide_characters() {
        assert_eq!(
            DataCoding::LATIN1.encode_text("café").unwrap().as_ref(),
            &[b'c', b'a', b'f', 0xE9]
        );
        assert!(DataCoding::LATIN1.encode_text("€").is_err());
    }

    #[test]
    fn default_alphabet_is_one_octet_per_septet() {
        let octets = DataCoding::DEFAULT.encode_text("Hello").unwrap();
        assert_eq!(octets.as_ref(), b"Hello");
        assert_eq!(DataCoding::DEFAULT.decode_text(b"Hello"), "Hello");

        let octets = DataCoding::DEFAULT.encode_text("é£@Ü").unwrap();
        assert_eq!(octets.as_ref(), &[0x05, 0x01, 0x00, 0x5E]);
        assert_eq!(DataCoding::DEFAULT.decode_text(&octets), "é£@Ü");
    }

    #[test]
    fn default_alphabet_escapes_extension_characters() {
        let octets = DataCoding::DEFAULT.encode_text("€{x}").unwrap();
        assert_eq!(octets.as_ref(), &[0x1B, 0x65, 0x1B, 0x28, b'x', 0x1B, 0x29]);
        assert_eq!(DataCoding::DEFAULT.decode_text(&octets), "€{x}");
    }

    #[test]
    fn default_alphabet_rejects_unmapped_characters() {
        assert!(DataCoding::DEFAULT.encode_text("日本").is_err());
        assert!(DataCoding::DEFAULT.encode_text("😀").is_err());
    }

    #[test]
    fn gsm_tables_cover_the_full_alphabet() {
        assert_eq!(GSM7_BASIC.chars().count(), 128);
        assert_eq!(gsm7_basic('@'), Some(0x00));
        assert_eq!(gsm7_basic('à'), Some(0x7F));
        assert_eq!(gsm7_basic('€'), None);
        assert_eq!(gsm7_basic('\u{1b}'), None);
        assert_eq!(gsm7_extended('€'), Some(0x65));
    }
}
