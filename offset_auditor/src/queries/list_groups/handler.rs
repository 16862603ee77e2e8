use crate::clients::ClusterHandle;
use crate::error::AuditError;
use crate::models::CoordinationKind;
use crate::queries::list_groups::{GroupDirectory, ListGroupsQuery};
use crate::utils::with_timeout;
use anyhow::Context;
use tracing::debug;

/// Lists groups of both coordination backends. A group known to both is reported once as
/// [`CoordinationKind::Any`]. Without a legacy store only broker-managed groups are listed.
#[tracing::instrument(skip_all)]
pub async fn list_groups(
    handle: &ClusterHandle,
    query: ListGroupsQuery,
) -> Result<GroupDirectory, AuditError> {
    let timeout = handle.settings().request_timeout;

    let broker_groups = async {
        with_timeout(timeout, handle.groups().list_groups())
            .await
            .context("While listing broker-managed groups")
    };
    let legacy_groups = async {
        match handle.legacy() {
            Some(store) => with_timeout(timeout, store.list_groups())
                .await
                .context("While listing legacy groups"),
            None => Ok(vec![]),
        }
    };

    let (broker_groups, legacy_groups) =
        tokio::try_join!(broker_groups, legacy_groups).map_err(AuditError::Metadata)?;

    debug!(
        "Got {} broker-managed and {} legacy groups",
        broker_groups.len(),
        legacy_groups.len()
    );

    Ok(merge_groups(broker_groups, legacy_groups, query))
}

fn merge_groups(
    broker_groups: Vec<String>,
    legacy_groups: Vec<String>,
    query: ListGroupsQuery,
) -> GroupDirectory {
    let mut directory = GroupDirectory::new();
    let tagged = broker_groups
        .into_iter()
        .map(|group| (group, CoordinationKind::BrokerManaged))
        .chain(
            legacy_groups
                .into_iter()
                .map(|group| (group, CoordinationKind::LegacyZk)),
        );

    for (group, kind) in tagged {
        directory
            .entry(group)
            .and_modify(|existing| *existing = existing.merge(kind))
            .or_insert(kind);
    }

    directory.retain(|_, kind| query.kind.matches(*kind));
    directory
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KindSelector;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn group_in_both_backends_is_reported_once_as_any() {
        let directory = merge_groups(
            names(&["orders", "billing"]),
            names(&["orders", "legacy-etl"]),
            ListGroupsQuery::default(),
        );

        assert_eq!(directory.len(), 3);
        assert_eq!(directory["orders"], CoordinationKind::Any);
        assert_eq!(directory["billing"], CoordinationKind::BrokerManaged);
        assert_eq!(directory["legacy-etl"], CoordinationKind::LegacyZk);
    }

    #[test]
    fn selector_keeps_matching_kinds_only() {
        let directory = merge_groups(
            names(&["orders", "billing"]),
            names(&["orders", "legacy-etl"]),
            ListGroupsQuery {
                kind: KindSelector::LegacyZk,
            },
        );

        assert_eq!(
            directory.keys().cloned().collect::<Vec<_>>(),
            names(&["legacy-etl", "orders"])
        );
    }
}
