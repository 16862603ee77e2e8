use crate::clients::{ClusterHandle, TopicPartitions};
use crate::coordination::CoordinationBackend;
use crate::error::AuditError;
use crate::models::{ConsumedOffsets, CoordinationKind, ProducedOffsets};
use crate::queries::get_consumed_offsets::{ConsumedOffsetsResponse, GroupFailure};
use crate::queries::list_groups::GroupDirectory;
use anyhow::Context;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn, Instrument, Span};

/// Resolves committed offsets and owners of one group through the backends of `kind`.
///
/// `topics` is the partition layout the broker-managed backend is asked about; the legacy
/// backend discovers consumed topics from the store itself.
pub async fn resolve_consumed(
    handle: &ClusterHandle,
    group: &str,
    kind: CoordinationKind,
    topics: &[TopicPartitions],
) -> Result<ConsumedOffsets, AuditError> {
    let timeout = handle.settings().request_timeout;
    let to_error = |source| AuditError::ConsumedResolution {
        group: group.to_owned(),
        source,
    };

    let backends = CoordinationBackend::for_kind(handle, kind).map_err(to_error)?;

    let mut merged = ConsumedOffsets::new();
    for backend in backends {
        let consumed = backend
            .resolve_consumed(group, topics, timeout)
            .await
            .with_context(|| format!("While resolving {} offsets", backend.kind()))
            .map_err(to_error)?;

        for (topic, partitions) in consumed {
            merged.entry(topic).or_default().extend(partitions);
        }
    }

    Ok(merged)
}

/// Resolves every group of `groups` concurrently. Failures are collected per group and never
/// stop the other groups.
#[tracing::instrument(skip_all)]
pub async fn resolve_all_groups(
    handle: &ClusterHandle,
    groups: &GroupDirectory,
    produced: &ProducedOffsets,
) -> ConsumedOffsetsResponse {
    info!("Resolving consumed offsets of {} groups", groups.len());

    let topics = Arc::new(topic_layout(produced));

    let mut tasks = JoinSet::new();
    for (group, kind) in groups {
        let handle = handle.clone();
        let topics = topics.clone();
        let group = group.clone();
        let kind = *kind;
        let future = async move {
            let result = match handle.in_flight().clone().acquire_owned().await {
                Ok(_permit) => resolve_consumed(&handle, &group, kind, &topics).await,
                Err(e) => Err(AuditError::ConsumedResolution {
                    group: group.clone(),
                    source: anyhow::Error::new(e).context("In-flight limiter was closed"),
                }),
            };
            (group, result)
        }
        .instrument(Span::current());

        tasks.spawn(future);
    }

    let mut response = ConsumedOffsetsResponse::default();
    while let Some(joined) = tasks.join_next().await {
        let (group, result) = match joined {
            Ok(x) => x,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => continue,
        };

        match result {
            Ok(consumed) => {
                debug!("Resolved {} topics of group {}", consumed.len(), group);
                response.consumed.insert(group, consumed);
            }
            Err(error) => {
                warn!("{}", error.report());
                response.failures.push(GroupFailure { group, error });
            }
        }
    }

    response
}

fn topic_layout(produced: &ProducedOffsets) -> Vec<TopicPartitions> {
    produced
        .iter()
        .map(|(topic, partitions)| TopicPartitions {
            topic: topic.clone(),
            partitions: partitions.keys().copied().collect(),
        })
        .collect()
}
