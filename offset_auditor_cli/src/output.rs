use comfy_table::Table;
use offset_auditor::commands::reset_offset::{BulkResetResponse, ResetOffsetResponse};
use offset_auditor::models::{audit_rows, AuditMap};
use offset_auditor::queries::get_consumed_offsets::GroupFailure;
use offset_auditor::queries::list_groups::GroupDirectory;
use std::collections::BTreeMap;

const UNKNOWN: &str = "None";

fn or_unknown(value: Option<i64>) -> String {
    value.map_or_else(|| UNKNOWN.to_owned(), |x| x.to_string())
}

pub fn groups_table(groups: &GroupDirectory) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Group", "Type"]);
    for (group, kind) in groups {
        table.add_row(vec![group.clone(), kind.to_string()]);
    }
    table
}

pub fn topics_table(topics: &BTreeMap<String, Vec<i32>>) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Topic", "Partitions"]);
    for (topic, partitions) in topics {
        table.add_row(vec![topic.clone(), partitions.len().to_string()]);
    }
    table
}

pub fn audit_table(records: &AuditMap) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Group",
        "Topic",
        "Partition",
        "Oldest",
        "Newest",
        "Consumed",
        "Lag",
        "Owner",
        "Type",
    ]);

    for row in audit_rows(records) {
        let record = row.record;
        let consumed = if record.is_committed() {
            record.consumed_offset.to_string()
        } else {
            UNKNOWN.to_owned()
        };
        let owner = if record.owning_member.is_empty() {
            UNKNOWN.to_owned()
        } else {
            record.owning_member.clone()
        };

        table.add_row(vec![
            row.group.to_owned(),
            row.topic.to_owned(),
            row.partition.to_string(),
            or_unknown(record.oldest_offset),
            or_unknown(record.newest_offset),
            consumed,
            or_unknown(record.lag),
            owner,
            record.coordination_kind.to_string(),
        ]);
    }
    table
}

pub fn group_failures_table(failures: &[GroupFailure]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Group", "Error"]);
    for failure in failures {
        table.add_row(vec![failure.group.clone(), failure.error.report()]);
    }
    table
}

pub fn reset_table(response: &BulkResetResponse) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Group",
        "Topic",
        "Partition",
        "Offset",
        "Type",
        "Result",
    ]);

    for applied in &response.applied {
        table.add_row(applied_row(applied));
    }
    for skipped in &response.skipped {
        table.add_row(vec![
            skipped.group.clone(),
            skipped.topic.clone(),
            skipped.partition.to_string(),
            UNKNOWN.to_owned(),
            String::new(),
            "skipped, never committed".to_owned(),
        ]);
    }
    for failure in &response.failures {
        let request = &failure.request;
        table.add_row(vec![
            request.group.clone(),
            request.topic.clone(),
            request.partition.to_string(),
            request.target_offset.to_string(),
            String::new(),
            failure.error.report(),
        ]);
    }
    table
}

pub fn single_reset_table(response: &ResetOffsetResponse) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Group",
        "Topic",
        "Partition",
        "Offset",
        "Type",
        "Result",
    ]);
    table.add_row(applied_row(response));
    table
}

fn applied_row(applied: &ResetOffsetResponse) -> Vec<String> {
    let request = &applied.request;
    vec![
        request.group.clone(),
        request.topic.clone(),
        request.partition.to_string(),
        request.target_offset.to_string(),
        applied.coordination_kind.to_string(),
        format!(
            "committed, range {}..={}",
            applied.bound.oldest_offset(),
            applied.bound.newest_offset()
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use offset_auditor::models::{AuditRecord, CoordinationKind, UNCOMMITTED_OFFSET};

    fn record(consumed_offset: i64, newest_offset: Option<i64>) -> AuditRecord {
        AuditRecord {
            oldest_offset: newest_offset.map(|_| 0),
            newest_offset,
            lag: newest_offset
                .filter(|_| consumed_offset >= 0)
                .map(|x| x - consumed_offset),
            consumed_offset,
            owning_member: String::new(),
            coordination_kind: CoordinationKind::BrokerManaged,
        }
    }

    #[test]
    fn unknown_values_are_rendered_as_none() {
        let mut records = AuditMap::new();
        records
            .entry("orders".to_owned())
            .or_default()
            .entry("gone".to_owned())
            .or_default()
            .insert(0, record(UNCOMMITTED_OFFSET, None));

        let rendered = audit_table(&records).to_string();

        assert!(rendered.contains("orders"));
        assert!(rendered.contains("gone"));
        assert!(rendered.contains(UNKNOWN));
        assert!(!rendered.contains("-1"));
    }

    #[test]
    fn lag_is_rendered_for_committed_partitions() {
        let mut records = AuditMap::new();
        records
            .entry("orders".to_owned())
            .or_default()
            .entry("payments".to_owned())
            .or_default()
            .insert(
                3,
                AuditRecord {
                    owning_member: "consumer-1".to_owned(),
                    ..record(7, Some(10))
                },
            );

        let rendered = audit_table(&records).to_string();

        assert!(rendered.contains("payments"));
        assert!(rendered.contains(" 7 "));
        assert!(rendered.contains(" 3 "));
        assert!(!rendered.contains(UNKNOWN));
    }

    #[test]
    fn groups_are_listed_with_their_kind() {
        let groups = GroupDirectory::from([
            ("billing".to_owned(), CoordinationKind::BrokerManaged),
            ("legacy-etl".to_owned(), CoordinationKind::LegacyZk),
        ]);

        let rendered = groups_table(&groups).to_string();

        assert!(rendered.contains("legacy-etl"));
        assert!(rendered.contains(" zk "));
        assert!(rendered.contains(" kf "));
    }
}
