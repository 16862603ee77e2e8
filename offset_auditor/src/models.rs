mod audit_record;
mod consumed_offset_record;
mod coordination_kind;
mod produced_offset_bound;
mod reset_request;

pub use audit_record::*;
pub use consumed_offset_record::*;
pub use coordination_kind::*;
pub use produced_offset_bound::*;
pub use reset_request::*;
