use crate::models::CoordinationKind;
use std::collections::BTreeMap;

/// Committed offset value used when a partition has never been committed.
pub const UNCOMMITTED_OFFSET: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumedOffsetRecord {
    pub consumed_offset: i64,
    pub owning_member: String,
    pub coordination_kind: CoordinationKind,
}

impl ConsumedOffsetRecord {
    pub fn is_committed(&self) -> bool {
        self.consumed_offset >= 0
    }
}

/// Topic -> partition -> consumed record of a single group.
pub type ConsumedOffsets = BTreeMap<String, BTreeMap<i32, ConsumedOffsetRecord>>;
