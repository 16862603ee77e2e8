use crate::clients::ClusterHandle;
use crate::error::AuditError;
use crate::models::{ProducedOffsetBound, ProducedOffsets};
use crate::utils::with_timeout;
use anyhow::Context;
use std::collections::{BTreeMap, BTreeSet};
use tokio::select;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn, Instrument, Span};

type TopicOffsets = (String, BTreeMap<i32, ProducedOffsetBound>);

/// Fetches oldest and newest offsets of every partition of `topics`.
///
/// One task per topic, bounded by the handle's in-flight limit. The first failing partition
/// cancels the remaining tasks and fails the whole phase: lag can't be computed against an
/// incomplete table.
#[tracing::instrument(skip_all)]
pub async fn fetch_produced_offsets(
    handle: &ClusterHandle,
    topics: &BTreeSet<String>,
) -> Result<ProducedOffsets, AuditError> {
    info!("Fetching produced offsets of {} topics", topics.len());

    let cancellation_token = CancellationToken::new();
    let mut tasks = JoinSet::new();
    for topic in topics {
        // spawned into the set before it starts, so the barrier below always sees it
        tasks.spawn(
            fetch_topic_offsets(handle.clone(), topic.clone(), cancellation_token.clone())
                .instrument(Span::current()),
        );
    }

    let mut produced = ProducedOffsets::new();
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let result = match joined {
            Ok(result) => result,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => continue,
        };

        match result {
            Ok(Some((topic, partitions))) => {
                produced.insert(topic, partitions);
            }
            Ok(None) => {}
            Err(e) if first_error.is_none() => {
                warn!("{}, cancelling remaining topics", e);
                cancellation_token.cancel();
                first_error = Some(e);
            }
            Err(e) => trace!("Ignoring error after cancellation: {}", e),
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    debug!("Fetched produced offsets of {} topics", produced.len());
    Ok(produced)
}

/// Returns `Ok(None)` when cancelled before completion.
async fn fetch_topic_offsets(
    handle: ClusterHandle,
    topic: String,
    cancellation_token: CancellationToken,
) -> Result<Option<TopicOffsets>, AuditError> {
    let timeout = handle.settings().request_timeout;

    let _permit = select! {
        permit = handle.in_flight().clone().acquire_owned() => permit
            .context("In-flight limiter was closed")
            .map_err(|e| offset_query_error(&topic, None, e))?,
        _ = cancellation_token.cancelled() => return Ok(None),
    };

    let partitions = select! {
        partitions = with_timeout(timeout, handle.cluster().partitions_of(&topic)) => partitions
            .context("While fetching partitions")
            .map_err(|e| offset_query_error(&topic, None, e))?,
        _ = cancellation_token.cancelled() => return Ok(None),
    };

    let mut bounds = BTreeMap::new();
    for partition in partitions {
        let fetched = select! {
            fetched = with_timeout(timeout, handle.cluster().fetch_log_bounds(&topic, partition)) => fetched,
            _ = cancellation_token.cancelled() => return Ok(None),
        };

        let bound = fetched
            .and_then(|x| ProducedOffsetBound::try_new(x.oldest, x.newest))
            .map_err(|e| offset_query_error(&topic, Some(partition), e))?;

        trace!(
            "Topic {} partition {}: oldest {}, newest {}",
            topic,
            partition,
            bound.oldest_offset(),
            bound.newest_offset()
        );
        bounds.insert(partition, bound);
    }

    Ok(Some((topic, bounds)))
}

fn offset_query_error(topic: &str, partition: Option<i32>, source: anyhow::Error) -> AuditError {
    AuditError::OffsetQuery {
        topic: topic.to_owned(),
        partition,
        source,
    }
}
