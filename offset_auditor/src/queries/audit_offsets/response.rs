use crate::models::AuditMap;
use crate::queries::get_consumed_offsets::GroupFailure;

#[derive(Debug, Default)]
pub struct AuditOffsetsResponse {
    pub records: AuditMap,
    /// Groups left out of `records` because their offsets couldn't be resolved.
    pub failures: Vec<GroupFailure>,
}
