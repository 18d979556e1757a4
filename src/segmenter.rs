// ABOUTME: Splits outbound text into submit_sm-sized parts tagged with concatenation UDHs
// ABOUTME: Part budgets come from a pluggable LengthCounter; the default implements GSM 03.38 / UCS-2 rules

use crate::codec::CodecError;
use crate::datatypes::{gsm7_basic, gsm7_extended, DataCoding, EsmClass, MAX_SHORT_MESSAGE_LENGTH};
use bytes::{BufMut, Bytes, BytesMut};
use std::sync::atomic::{AtomicU8, Ordering};
use thiserror::Error;

const GSM7_SINGLE: usize = 160;
const GSM7_MULTIPART: usize = 153;
const UCS2_SINGLE: usize = 70;
const UCS2_MULTIPART: usize = 67;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gsm7,
    Ucs2,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Gsm7 => "GSM_7BIT",
            Encoding::Ucs2 => "UTF16",
        }
    }

    /// Units `c` occupies: septets for GSM, UTF-16 code units for UCS-2
    pub fn units(&self, c: char) -> usize {
        match self {
            Encoding::Gsm7 if gsm7_extended(c).is_some() => 2,
            Encoding::Gsm7 => 1,
            Encoding::Ucs2 => c.len_utf16(),
        }
    }
}

/// Output of a length calculation for one message body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageStats {
    /// Length in encoding units (septets or UTF-16 code units)
    pub length: usize,
    pub encoding: Encoding,
    pub chars_per_part: usize,
    pub parts: usize,
}

/// Computes the per-part character budget for a body
pub trait LengthCounter: Send + Sync {
    fn count(&self, text: &str) -> MessageStats;
}

impl<T: LengthCounter + ?Sized> LengthCounter for Box<T> {
    fn count(&self, text: &str) -> MessageStats {
        (**self).count(text)
    }
}

/// GSM 03.38 when every character fits the default alphabet, UCS-2 otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct SmsLengthCounter;

impl LengthCounter for SmsLengthCounter {
    fn count(&self, text: &str) -> MessageStats {
        let gsm_length = text.chars().try_fold(0usize, |acc, c| {
            if gsm7_basic(c).is_some() {
                Some(acc + 1)
            } else if gsm7_extended(c).is_some() {
                Some(acc + 2)
            } else {
                None
            }
        });

        let (length, encoding, single, multi) = match gsm_length {
            Some(length) => (length, Encoding::Gsm7, GSM7_SINGLE, GSM7_MULTIPART),
            None => (
                text.encode_utf16().count(),
                Encoding::Ucs2,
                UCS2_SINGLE,
                UCS2_MULTIPART,
            ),
        };

        let (chars_per_part, parts) = if length <= single {
            (single, usize::from(length > 0))
        } else {
            // escapes and surrogate pairs never straddle a boundary, so a
            // part may fall short of the budget
            (multi, pack(text, encoding, multi).len())
        };

        MessageStats {
            length,
            encoding,
            chars_per_part,
            parts,
        }
    }
}

/// Concatenated SMS information element with an 8-bit reference:
/// `[UDHL=5, IEI=0, IEDL=3, reference, total, index]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatHeader {
    pub reference: u8,
    pub total: u8,
    pub index: u8,
}

impl ConcatHeader {
    pub const LEN: usize = 6;

    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        [5, 0x00, 3, self.reference, self.total, self.index]
    }

    /// Recognizes only the 8-bit reference form
    pub fn parse(udh: &[u8]) -> Option<Self> {
        match udh {
            [5, 0x00, 3, reference, total, index, ..] => Some(Self {
                reference: *reference,
                total: *total,
                index: *index,
            }),
            _ => None,
        }
    }
}

/// One submit_sm worth of a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    /// Empty for single-part messages
    pub udh: Bytes,
    pub payload: String,
    /// Alphabet the payload was budgeted in
    pub encoding: Encoding,
    pub reference_number: u8,
    /// 1-based
    pub part_index: u8,
    pub part_count: u8,
}

impl MessagePart {
    pub fn is_concatenated(&self) -> bool {
        !self.udh.is_empty()
    }

    /// esm_class for this part: UDHI set exactly when a header is carried
    pub fn esm_class(&self, base: EsmClass) -> EsmClass {
        if self.is_concatenated() {
            base.with_udhi()
        } else {
            base.without_udhi()
        }
    }

    /// data_coding to send for this part. A UCS-2 payload under the
    /// default alphabet is sent as UCS-2; explicit schemes are kept.
    pub fn data_coding(&self, requested: DataCoding) -> DataCoding {
        if requested == DataCoding::DEFAULT && self.encoding == Encoding::Ucs2 {
            DataCoding::UCS2
        } else {
            requested
        }
    }

    /// UDH followed by the payload encoded per `data_coding`
    pub fn short_message(&self, data_coding: DataCoding) -> Result<Bytes, CodecError> {
        let text = data_coding.encode_text(&self.payload)?;
        let total = self.udh.len() + text.len();
        if total > MAX_SHORT_MESSAGE_LENGTH {
            return Err(CodecError::FieldValidation {
                field: "short_message",
                reason: format!(
                    "part {} of {} encodes to {total} octets, maximum is {MAX_SHORT_MESSAGE_LENGTH}",
                    self.part_index, self.part_count
                ),
            });
        }

        let mut buf = BytesMut::with_capacity(total);
        buf.put_slice(&self.udh);
        buf.put_slice(&text);
        Ok(buf.freeze())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SegmentError {
    #[error("message needs {0} parts, a concatenated message carries at most 255")]
    TooManyParts(usize),
}

/// Session-scoped rolling 1-byte reference for concatenated groups
#[derive(Debug)]
pub struct ReferenceCounter(AtomicU8);

impl ReferenceCounter {
    pub fn new(start: u8) -> Self {
        Self(AtomicU8::new(start))
    }

    /// Returns the current value and advances, wrapping at 255
    pub fn next(&self) -> u8 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for ReferenceCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

pub struct Segmenter<C = SmsLengthCounter> {
    counter: C,
    references: ReferenceCounter,
}

impl Segmenter<SmsLengthCounter> {
    pub fn new() -> Self {
        Self::with_counter(SmsLengthCounter)
    }
}

impl Default for Segmenter<SmsLengthCounter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: LengthCounter> Segmenter<C> {
    pub fn with_counter(counter: C) -> Self {
        Self {
            counter,
            references: ReferenceCounter::default(),
        }
    }

    pub fn stats(&self, body: &str) -> MessageStats {
        self.counter.count(body)
    }

    /// Split `body`, drawing a fresh reference number only when it needs
    /// more than one part.
    pub fn segment(&self, body: &str) -> Result<Vec<MessagePart>, SegmentError> {
        let stats = self.counter.count(body);
        if stats.parts <= 1 {
            return split(body, &stats, 0);
        }
        split(body, &stats, self.references.next())
    }
}

/// Greedy cut of `text` into chunks of at most `width` units of `encoding`.
/// Characters are never divided, so an escape pair or a surrogate pair that
/// would cross a boundary starts the next chunk.
pub fn pack(text: &str, encoding: Encoding, width: usize) -> Vec<&str> {
    let width = width.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut used = 0;
    for (at, c) in text.char_indices() {
        let cost = encoding.units(c);
        if used > 0 && used + cost > width {
            chunks.push(&text[start..at]);
            start = at;
            used = 0;
        }
        used += cost;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Cut in the counter's units. `partsNeeded <= 1` yields one part without a
/// header even when the body sits exactly at the budget.
pub fn split(
    body: &str,
    stats: &MessageStats,
    reference: u8,
) -> Result<Vec<MessagePart>, SegmentError> {
    if stats.parts <= 1 {
        return Ok(vec![MessagePart {
            udh: Bytes::new(),
            payload: body.to_string(),
            encoding: stats.encoding,
            reference_number: 0,
            part_index: 1,
            part_count: 1,
        }]);
    }

    let chunks = pack(body, stats.encoding, stats.chars_per_part);
    let total = u8::try_from(chunks.len()).map_err(|_| SegmentError::TooManyParts(chunks.len()))?;

    Ok(chunks
        .into_iter()
        .zip(1..=total)
        .map(|(payload, index)| {
            let header = ConcatHeader {
                reference,
                total,
                index,
            };
            MessagePart {
                udh: Bytes::copy_from_slice(&header.to_bytes()),
                payload: payload.to_string(),
                encoding: stats.encoding,
                reference_number: reference,
                part_index: index,
                part_count: total,
            }
        })
        .collect())
}
