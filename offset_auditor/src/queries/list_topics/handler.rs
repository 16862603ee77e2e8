use crate::clients::ClusterHandle;
use crate::error::AuditError;
use crate::filter::GlobPattern;
use crate::utils::with_timeout;
use anyhow::Context;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Every topic visible to the cluster client. No partial answer is usable, so any failure
/// is a [`AuditError::Metadata`].
#[tracing::instrument(skip_all)]
pub async fn list_topics(handle: &ClusterHandle) -> Result<BTreeSet<String>, AuditError> {
    let topics = with_timeout(
        handle.settings().request_timeout,
        handle.cluster().list_topics(),
    )
    .await
    .map_err(AuditError::Metadata)?;

    debug!("Got {} topics from cluster", topics.len());

    Ok(topics.into_iter().collect())
}

/// Topics matching `filter` with their partition ids.
#[tracing::instrument(skip_all, fields(filter = filter.as_str()))]
pub async fn describe_topics(
    handle: &ClusterHandle,
    filter: &GlobPattern,
) -> Result<BTreeMap<String, Vec<i32>>, AuditError> {
    let timeout = handle.settings().request_timeout;
    let topics = list_topics(handle).await?;

    let mut described = BTreeMap::new();
    for topic in topics.into_iter().filter(|x| filter.matches(x)) {
        let mut partitions = with_timeout(timeout, handle.cluster().partitions_of(&topic))
            .await
            .with_context(|| format!("While fetching partitions of topic {}", topic))
            .map_err(AuditError::Metadata)?;
        partitions.sort_unstable();
        described.insert(topic, partitions);
    }

    Ok(described)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{in_memory_handle, InMemoryCluster};

    #[tokio::test]
    async fn describes_matching_topics_only() {
        let cluster = InMemoryCluster::new()
            .with_partition("orders", 1, 0, 10)
            .with_partition("orders", 0, 0, 10)
            .with_partition("payments", 0, 0, 3);
        let handle = in_memory_handle(&cluster, None);

        let described = describe_topics(&handle, &GlobPattern::new("ord*").unwrap())
            .await
            .unwrap();

        assert_eq!(described.len(), 1);
        assert_eq!(described["orders"], vec![0, 1]);
    }
}
