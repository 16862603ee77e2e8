pub mod audit_offsets;
pub mod get_consumed_offsets;
pub mod get_produced_offsets;
pub mod list_groups;
pub mod list_topics;
