use crate::error::AuditError;
use crate::models::{CoordinationKind, ProducedOffsetBound, ResetRequest};

#[derive(Debug)]
pub struct ResetOffsetResponse {
    pub request: ResetRequest,
    pub coordination_kind: CoordinationKind,
    /// Bound the target was validated against.
    pub bound: ProducedOffsetBound,
}

#[derive(Debug)]
pub struct ResetFailure {
    pub request: ResetRequest,
    pub error: AuditError,
}

/// Snapshot record without a committed offset; there is nothing to restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPartition {
    pub group: String,
    pub topic: String,
    pub partition: i32,
}

#[derive(Debug, Default)]
pub struct BulkResetResponse {
    pub applied: Vec<ResetOffsetResponse>,
    pub skipped: Vec<SkippedPartition>,
    pub failures: Vec<ResetFailure>,
}
