use crate::models::{AuditMap, AuditRecord, ConsumedOffsets, ProducedOffsets};
use std::collections::BTreeMap;

/// Joins consumed records of every group with the produced bounds of the same partition.
///
/// Partitions without a produced bound are kept with unknown bounds and lag so that a
/// vanished topic stays visible.
pub fn aggregate(
    produced: &ProducedOffsets,
    consumed_by_group: BTreeMap<String, ConsumedOffsets>,
) -> AuditMap {
    let mut audit = AuditMap::new();

    for (group, topics) in consumed_by_group {
        let group_records = audit.entry(group).or_default();
        for (topic, partitions) in topics {
            let produced_partitions = produced.get(&topic);
            let topic_records = group_records.entry(topic).or_default();
            for (partition, consumed) in partitions {
                let bound = produced_partitions.and_then(|x| x.get(&partition));
                let oldest_offset = bound.map(|x| *x.oldest_offset());
                let newest_offset = bound.map(|x| *x.newest_offset());
                let lag = match newest_offset {
                    Some(newest) if consumed.is_committed() => Some(newest - consumed.consumed_offset),
                    _ => None,
                };

                topic_records.insert(
                    partition,
                    AuditRecord {
                        oldest_offset,
                        newest_offset,
                        lag,
                        consumed_offset: consumed.consumed_offset,
                        owning_member: consumed.owning_member,
                        coordination_kind: consumed.coordination_kind,
                    },
                );
            }
        }
    }

    audit
}
