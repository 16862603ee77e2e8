use crate::models::CoordinationKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Consumed position of a group on one partition joined with the partition's produced bound.
///
/// `oldest_offset`/`newest_offset` are `None` when no bound was observed for the partition
/// (deleted topic, metadata not yet propagated). `lag` is `None` whenever one side is unknown,
/// including partitions the group never committed. A negative lag is kept as reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub oldest_offset: Option<i64>,
    pub newest_offset: Option<i64>,
    pub lag: Option<i64>,
    pub consumed_offset: i64,
    pub owning_member: String,
    pub coordination_kind: CoordinationKind,
}

impl AuditRecord {
    pub fn is_committed(&self) -> bool {
        self.consumed_offset >= 0
    }
}

/// Group -> topic -> partition -> record.
pub type AuditMap = BTreeMap<String, BTreeMap<String, BTreeMap<i32, AuditRecord>>>;

/// One flattened row of an [`AuditMap`].
#[derive(Debug, Clone, Copy)]
pub struct AuditRow<'a> {
    pub group: &'a str,
    pub topic: &'a str,
    pub partition: i32,
    pub record: &'a AuditRecord,
}

pub fn audit_rows(map: &AuditMap) -> impl Iterator<Item = AuditRow<'_>> {
    map.iter().flat_map(|(group, topics)| {
        topics.iter().flat_map(move |(topic, partitions)| {
            partitions.iter().map(move |(partition, record)| AuditRow {
                group,
                topic,
                partition: *partition,
                record,
            })
        })
    })
}
