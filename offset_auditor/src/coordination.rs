use crate::clients::{BrokerGroupClient, ClusterHandle, LegacyOffsetStore, TopicPartitions};
use crate::models::{
    ConsumedOffsetRecord, ConsumedOffsets, CoordinationKind, UNCOMMITTED_OFFSET,
};
use crate::utils::with_timeout;
use anyhow::{bail, Context};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Backend holding a group's committed offsets.
#[derive(Clone)]
pub enum CoordinationBackend {
    Legacy(Arc<dyn LegacyOffsetStore>),
    Broker(Arc<dyn BrokerGroupClient>),
}

impl CoordinationBackend {
    /// Backends to query for a group of `kind`. For [`CoordinationKind::Any`] the legacy store
    /// comes first, so merged results prefer the broker-managed view.
    pub fn for_kind(
        handle: &ClusterHandle,
        kind: CoordinationKind,
    ) -> Result<Vec<CoordinationBackend>, anyhow::Error> {
        let mut backends = Vec::with_capacity(2);
        if kind.uses_legacy_store() {
            let Some(store) = handle.legacy() else {
                bail!("Group is coordinated by zookeeper, but no zookeeper servers are configured")
            };
            backends.push(CoordinationBackend::Legacy(store.clone()));
        }
        if kind.uses_broker() {
            backends.push(CoordinationBackend::Broker(handle.groups().clone()));
        }

        Ok(backends)
    }

    pub fn kind(&self) -> CoordinationKind {
        match self {
            CoordinationBackend::Legacy(_) => CoordinationKind::LegacyZk,
            CoordinationBackend::Broker(_) => CoordinationKind::BrokerManaged,
        }
    }

    pub async fn resolve_consumed(
        &self,
        group: &str,
        topics: &[TopicPartitions],
        timeout: Duration,
    ) -> Result<ConsumedOffsets, anyhow::Error> {
        match self {
            CoordinationBackend::Legacy(store) => {
                resolve_legacy(store.as_ref(), group, timeout).await
            }
            CoordinationBackend::Broker(client) => {
                resolve_broker(client.as_ref(), group, topics, timeout).await
            }
        }
    }

    /// Offset currently committed for one partition, `None` when there is none.
    pub async fn read_committed(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
        timeout: Duration,
    ) -> Result<Option<i64>, anyhow::Error> {
        match self {
            CoordinationBackend::Legacy(store) => {
                with_timeout(timeout, store.read_offset(group, topic, partition)).await
            }
            CoordinationBackend::Broker(client) => {
                let partitions = [TopicPartitions {
                    topic: topic.to_owned(),
                    partitions: vec![partition],
                }];
                let committed =
                    with_timeout(timeout, client.fetch_committed_offsets(group, &partitions))
                        .await?;

                Ok(committed
                    .into_iter()
                    .find(|x| x.topic == topic && x.partition == partition)
                    .map(|x| x.offset)
                    .filter(|x| *x >= 0))
            }
        }
    }

    pub async fn commit_offset(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
        offset: i64,
        timeout: Duration,
    ) -> Result<(), anyhow::Error> {
        match self {
            CoordinationBackend::Legacy(store) => {
                with_timeout(timeout, store.write_offset(group, topic, partition, offset)).await
            }
            CoordinationBackend::Broker(client) => {
                with_timeout(timeout, client.commit_offset(group, topic, partition, offset)).await
            }
        }
    }
}

async fn resolve_legacy(
    store: &dyn LegacyOffsetStore,
    group: &str,
    timeout: Duration,
) -> Result<ConsumedOffsets, anyhow::Error> {
    let mut consumed = ConsumedOffsets::new();

    let topics = with_timeout(timeout, store.list_consumed_topics(group))
        .await
        .context("While listing consumed topics")?;

    for topic in topics {
        let partitions = with_timeout(timeout, store.list_partitions(group, &topic))
            .await
            .with_context(|| format!("While listing partitions of topic {}", topic))?;

        let records = consumed.entry(topic.clone()).or_default();
        for partition in partitions {
            let (offset, owner) = tokio::try_join!(
                with_timeout(timeout, store.read_offset(group, &topic, partition)),
                with_timeout(timeout, store.read_owner(group, &topic, partition)),
            )
            .with_context(|| format!("While reading topic {} partition {}", topic, partition))?;

            records.insert(
                partition,
                ConsumedOffsetRecord {
                    consumed_offset: offset.unwrap_or(UNCOMMITTED_OFFSET),
                    owning_member: owner.unwrap_or_default(),
                    coordination_kind: CoordinationKind::LegacyZk,
                },
            );
        }
    }

    consumed.retain(|_, partitions| !partitions.is_empty());
    Ok(consumed)
}

async fn resolve_broker(
    client: &dyn BrokerGroupClient,
    group: &str,
    topics: &[TopicPartitions],
    timeout: Duration,
) -> Result<ConsumedOffsets, anyhow::Error> {
    let committed = with_timeout(timeout, client.fetch_committed_offsets(group, topics))
        .await
        .context("While fetching committed offsets")?;

    let mut consumed = ConsumedOffsets::new();
    for entry in committed {
        // the broker reports "no commit" as a negative sentinel
        let consumed_offset = if entry.offset < 0 {
            UNCOMMITTED_OFFSET
        } else {
            entry.offset
        };
        if consumed_offset == UNCOMMITTED_OFFSET && entry.member_id.is_none() {
            continue;
        }

        trace!(
            "Group {} topic {} partition {}: committed {}",
            group,
            entry.topic,
            entry.partition,
            consumed_offset
        );
        consumed.entry(entry.topic).or_default().insert(
            entry.partition,
            ConsumedOffsetRecord {
                consumed_offset,
                owning_member: entry.member_id.unwrap_or_default(),
                coordination_kind: CoordinationKind::BrokerManaged,
            },
        );
    }

    Ok(consumed)
}
