// ABOUTME: This module provides macros to reduce boilerplate in SMPP PDU implementations
// ABOUTME: Covers header-only PDUs and the message_id responses of submit_sm and deliver_sm

/// Implements Encodable/Decodable for a PDU that is only the 16-byte header.
///
/// The struct must have `command_status` and `sequence_number` fields.
macro_rules! impl_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        impl $crate::codec::Decodable for $pdu_type {
            fn command_ids() -> &'static [$crate::datatypes::CommandId] {
                &[$command_id]
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                Self::validate_header(&header)?;

                if buf.has_remaining() {
                    return Err($crate::codec::CodecError::FieldValidation {
                        field: concat!(stringify!($pdu_type), "_body"),
                        reason: concat!(stringify!($pdu_type), " PDU should have no body")
                            .to_string(),
                    });
                }

                Ok($pdu_type {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                })
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                let header = $crate::codec::PduHeader {
                    command_length: $crate::codec::PduHeader::SIZE as u32,
                    command_id: $command_id,
                    command_status: self.command_status,
                    sequence_number: self.sequence_number,
                };
                header.encode(buf)
            }

            fn encoded_size(&self) -> usize {
                $crate::codec::PduHeader::SIZE
            }
        }
    };
}

/// `new(sequence_number)` and `error(sequence_number, status)` constructors
/// for header-only PDUs
macro_rules! impl_header_only_constructors {
    ($pdu_type:ident) => {
        impl $pdu_type {
            /// Create a new PDU with Ok status
            pub fn new(sequence_number: u32) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                }
            }

            /// Create a PDU with error status
            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                }
            }
        }
    };
}

/// Codec plus constructors for a header-only PDU
macro_rules! impl_complete_header_only_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        $crate::macros::impl_header_only_pdu!($pdu_type, $command_id);
        $crate::macros::impl_header_only_constructors!($pdu_type);
    };
}

/// Codec for responses whose body is a single message_id C-Octet string.
///
/// An error response may omit the body entirely; that decodes to an empty
/// message_id.
macro_rules! impl_message_id_response {
    ($pdu_type:ident, $command_id:expr) => {
        impl $pdu_type {
            pub fn new(sequence_number: u32, message_id: impl Into<String>) -> Self {
                Self {
                    command_status: $crate::datatypes::CommandStatus::Ok,
                    sequence_number,
                    message_id: message_id.into(),
                }
            }

            pub fn error(sequence_number: u32, status: $crate::datatypes::CommandStatus) -> Self {
                Self {
                    command_status: status,
                    sequence_number,
                    message_id: String::new(),
                }
            }
        }

        impl $crate::codec::Decodable for $pdu_type {
            fn command_ids() -> &'static [$crate::datatypes::CommandId] {
                &[$command_id]
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use bytes::Buf;

                Self::validate_header(&header)?;

                let message_id = if buf.has_remaining() {
                    $crate::codec::decode_cstring(buf, 65, "message_id")?
                } else {
                    String::new()
                };

                Ok($pdu_type {
                    command_status: header.command_status,
                    sequence_number: header.sequence_number,
                    message_id,
                })
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                $crate::codec::encode_header(
                    buf,
                    $command_id,
                    self.command_status,
                    self.sequence_number,
                )?;
                $crate::codec::encode_cstring(buf, &self.message_id, 65, "message_id")
            }
        }
    };
}

/// Codec for submit_sm and deliver_sm, which share one mandatory body layout
/// followed by optional TLVs.
macro_rules! impl_short_message_pdu {
    ($pdu_type:ident, $command_id:expr) => {
        impl $crate::codec::Decodable for $pdu_type {
            fn command_ids() -> &'static [$crate::datatypes::CommandId] {
                &[$command_id]
            }

            fn decode(
                header: $crate::codec::PduHeader,
                buf: &mut std::io::Cursor<&[u8]>,
            ) -> Result<Self, $crate::codec::CodecError> {
                use $crate::codec::{decode_cstring, decode_u8, CodecError};
                use $crate::datatypes::{NumericPlanIndicator, TypeOfNumber};
                use bytes::Buf;

                Self::validate_header(&header)?;

                let ton = |raw: u8, field: &'static str| {
                    TypeOfNumber::try_from(raw).map_err(|e| CodecError::FieldValidation {
                        field,
                        reason: e.to_string(),
                    })
                };
                let npi = |raw: u8, field: &'static str| {
                    NumericPlanIndicator::try_from(raw).map_err(|e| {
                        CodecError::FieldValidation {
                            field,
                            reason: e.to_string(),
                        }
                    })
                };

                let service_type = decode_cstring(buf, 6, "service_type")?;
                let source_addr_ton = ton(decode_u8(buf)?, "source_addr_ton")?;
                let source_addr_npi = npi(decode_u8(buf)?, "source_addr_npi")?;
                let source_addr = decode_cstring(buf, 21, "source_addr")?;
                let dest_addr_ton = ton(decode_u8(buf)?, "dest_addr_ton")?;
                let dest_addr_npi = npi(decode_u8(buf)?, "dest_addr_npi")?;
                let destination_addr = decode_cstring(buf, 21, "destination_addr")?;
                let esm_class = $crate::datatypes::EsmClass::from(decode_u8(buf)?);
                let protocol_id = decode_u8(buf)?;
                let priority_flag = decode_u8(buf)?;
                let schedule_delivery_time = decode_cstring(buf, 17, "schedule_delivery_time")?;
                let validity_period = decode_cstring(buf, 17, "validity_period")?;
                let registered_delivery = decode_u8(buf)?;
                let replace_if_present_flag = decode_u8(buf)?;
                let data_coding = $crate::datatypes::DataCoding::from(decode_u8(buf)?);
                let sm_default_msg_id = decode_u8(buf)?;

                let sm_length = decode_u8(buf)? as usize;
                if buf.remaining() < sm_length {
                    return Err(CodecError::FieldValidation {
                        field: "sm_length",
                        reason: format!(
                            "declares {sm_length} octets, {} available",
                            buf.remaining()
                        ),
                    });
                }
                let short_message = buf.copy_to_bytes(sm_length);

                let tlvs = $crate::datatypes::Tlv::decode_all(buf)?;

                Ok($pdu_type {
                    sequence_number: header.sequence_number,
                    service_type,
                    source_addr_ton,
                    source_addr_npi,
                    source_addr,
                    dest_addr_ton,
                    dest_addr_npi,
                    destination_addr,
                    esm_class,
                    protocol_id,
                    priority_flag,
                    schedule_delivery_time,
                    validity_period,
                    registered_delivery,
                    replace_if_present_flag,
                    data_coding,
                    sm_default_msg_id,
                    short_message,
                    tlvs,
                })
            }
        }

        impl $crate::codec::Encodable for $pdu_type {
            fn encode(&self, buf: &mut bytes::BytesMut) -> Result<(), $crate::codec::CodecError> {
                use $crate::codec::{encode_cstring, encode_header, CodecError};
                use bytes::BufMut;

                let sm_length = u8::try_from(self.short_message.len())
                    .ok()
                    .filter(|len| usize::from(*len) <= $crate::datatypes::MAX_SHORT_MESSAGE_LENGTH)
                    .ok_or_else(|| CodecError::FieldValidation {
                        field: "short_message",
                        reason: format!(
                            "{} octets exceeds maximum of {}",
                            self.short_message.len(),
                            $crate::datatypes::MAX_SHORT_MESSAGE_LENGTH
                        ),
                    })?;

                encode_header(
                    buf,
                    $command_id,
                    $crate::datatypes::CommandStatus::Ok,
                    self.sequence_number,
                )?;

                encode_cstring(buf, &self.service_type, 6, "service_type")?;
                buf.put_u8(self.source_addr_ton as u8);
                buf.put_u8(self.source_addr_npi as u8);
                encode_cstring(buf, &self.source_addr, 21, "source_addr")?;
                buf.put_u8(self.dest_addr_ton as u8);
                buf.put_u8(self.dest_addr_npi as u8);
                encode_cstring(buf, &self.destination_addr, 21, "destination_addr")?;
                buf.put_u8(self.esm_class.bits());
                buf.put_u8(self.protocol_id);
                buf.put_u8(self.priority_flag);
                encode_cstring(buf, &self.schedule_delivery_time, 17, "schedule_delivery_time")?;
                encode_cstring(buf, &self.validity_period, 17, "validity_period")?;
                buf.put_u8(self.registered_delivery);
                buf.put_u8(self.replace_if_present_flag);
                buf.put_u8(self.data_coding.bits());
                buf.put_u8(self.sm_default_msg_id);
                buf.put_u8(sm_length);
                buf.put_slice(&self.short_message);

                for tlv in &self.tlvs {
                    tlv.encode(buf)?;
                }
                Ok(())
            }
        }

        impl $pdu_type {
            /// The User Data Header at the start of short_message, when UDHI is set
            pub fn udh(&self) -> Option<&[u8]> {
                if !self.esm_class.has_udhi() {
                    return None;
                }
                let udhl = usize::from(*self.short_message.first()?);
                self.short_message.get(..=udhl)
            }

            /// short_message text with any UDH stripped, decoded per data_coding
            pub fn text(&self) -> String {
                let offset = self.udh().map_or(0, <[u8]>::len);
                self.data_coding
                    .decode_text(self.short_message.get(offset..).unwrap_or_default())
            }
        }
    };
}

pub(crate) use {
    impl_complete_header_only_pdu, impl_header_only_constructors, impl_header_only_pdu,
    impl_message_id_response, impl_short_message_pdu,
};
