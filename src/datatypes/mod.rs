mod bind;
mod command_id;
mod command_status;
mod data_coding;
mod deliver_sm;
mod enquire_link;
mod esm_class;
mod generic_nack;
mod interface_version;
mod numeric_plan_indicator;
mod submit_sm;
pub mod tlv;
mod type_of_number;
mod unbind;

pub use bind::{BindRequest, BindResponse, BindType};
pub use command_id::CommandId;
pub use command_status::CommandStatus;
pub use data_coding::{gsm7_basic, gsm7_extended, DataCoding};
pub use deliver_sm::{DeliverSm, DeliverSmResponse};
pub use enquire_link::{EnquireLink, EnquireLinkResponse};
pub use esm_class::EsmClass;
pub use generic_nack::GenericNack;
pub use interface_version::InterfaceVersion;
pub use numeric_plan_indicator::NumericPlanIndicator;
pub use submit_sm::{SubmitSm, SubmitSmResponse};
pub use tlv::Tlv;
pub use type_of_number::TypeOfNumber;
pub use unbind::{Unbind, UnbindResponse};

// SMPP v3.4 field length limits (excluding null terminator)
pub const MAX_SYSTEM_ID_LENGTH: usize = 15;
pub const MAX_PASSWORD_LENGTH: usize = 8;
pub const MAX_SYSTEM_TYPE_LENGTH: usize = 12;
pub const MAX_ADDRESS_LENGTH: usize = 20;
pub const MAX_SHORT_MESSAGE_LENGTH: usize = 254;
