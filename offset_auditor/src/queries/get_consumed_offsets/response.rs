use crate::error::AuditError;
use crate::models::ConsumedOffsets;
use std::collections::BTreeMap;

/// A group whose offsets couldn't be resolved. Other groups are unaffected.
#[derive(Debug)]
pub struct GroupFailure {
    pub group: String,
    pub error: AuditError,
}

#[derive(Debug, Default)]
pub struct ConsumedOffsetsResponse {
    pub consumed: BTreeMap<String, ConsumedOffsets>,
    pub failures: Vec<GroupFailure>,
}
