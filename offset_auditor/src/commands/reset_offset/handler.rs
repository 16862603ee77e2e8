use crate::clients::ClusterHandle;
use crate::commands::reset_offset::{
    BulkResetResponse, ResetFailure, ResetOffsetResponse, SkippedPartition,
};
use crate::coordination::CoordinationBackend;
use crate::error::AuditError;
use crate::models::{audit_rows, CoordinationKind, ProducedOffsetBound, ResetRequest};
use crate::queries::list_groups::{list_groups, ListGroupsQuery};
use crate::snapshot::OffsetSnapshot;
use crate::utils::with_timeout;
use anyhow::Context;
use std::time::Duration;
use tracing::{info, warn};

/// Commits `request.target_offset` as the group's offset on one partition.
///
/// The target has to lie inside the partition's current retained range, otherwise
/// [`AuditError::OutOfRangeReset`] is returned and nothing is written. Groups unknown to
/// both backends are committed to the brokers. A group kept in both backends is written to
/// the brokers first; when a later write fails the earlier ones are restored and the error
/// names whatever could not be restored.
#[tracing::instrument(skip_all, fields(group = %request.group, topic = %request.topic, partition = request.partition))]
pub async fn reset_offset(
    handle: &ClusterHandle,
    request: ResetRequest,
) -> Result<ResetOffsetResponse, AuditError> {
    let groups = list_groups(handle, ListGroupsQuery::default()).await?;
    let kind = groups
        .get(&request.group)
        .copied()
        .unwrap_or(CoordinationKind::BrokerManaged);

    apply_reset(handle, kind, request).await
}

/// Replays every committed offset of `snapshot`. Each partition is reset on its own; a
/// failure is recorded and the remaining partitions are still applied.
#[tracing::instrument(skip_all)]
pub async fn reset_from_snapshot(
    handle: &ClusterHandle,
    snapshot: &OffsetSnapshot,
) -> Result<BulkResetResponse, AuditError> {
    let groups = list_groups(handle, ListGroupsQuery::default()).await?;
    let mut response = BulkResetResponse::default();

    for row in audit_rows(snapshot.records()) {
        if !row.record.is_committed() {
            response.skipped.push(SkippedPartition {
                group: row.group.to_owned(),
                topic: row.topic.to_owned(),
                partition: row.partition,
            });
            continue;
        }

        let request = ResetRequest {
            group: row.group.to_owned(),
            topic: row.topic.to_owned(),
            partition: row.partition,
            target_offset: row.record.consumed_offset,
        };
        // the live directory wins; the exported kind covers groups that vanished since export
        let kind = groups
            .get(row.group)
            .copied()
            .unwrap_or(row.record.coordination_kind);

        match apply_reset(handle, kind, request.clone()).await {
            Ok(applied) => response.applied.push(applied),
            Err(error) => {
                warn!("{}", error.report());
                response.failures.push(ResetFailure { request, error });
            }
        }
    }

    info!(
        "Snapshot reset finished. Applied: {}, skipped: {}, failed: {}",
        response.applied.len(),
        response.skipped.len(),
        response.failures.len()
    );

    Ok(response)
}

async fn apply_reset(
    handle: &ClusterHandle,
    kind: CoordinationKind,
    request: ResetRequest,
) -> Result<ResetOffsetResponse, AuditError> {
    let timeout = handle.settings().request_timeout;

    let bound = with_timeout(
        timeout,
        handle
            .cluster()
            .fetch_log_bounds(&request.topic, request.partition),
    )
    .await
    .and_then(|x| ProducedOffsetBound::try_new(x.oldest, x.newest))
    .map_err(|source| AuditError::OffsetQuery {
        topic: request.topic.clone(),
        partition: Some(request.partition),
        source,
    })?;

    if !bound.contains(request.target_offset) {
        return Err(AuditError::OutOfRangeReset {
            group: request.group,
            topic: request.topic,
            partition: request.partition,
            requested: request.target_offset,
            oldest: *bound.oldest_offset(),
            newest: *bound.newest_offset(),
        });
    }

    let mut backends = CoordinationBackend::for_kind(handle, kind)
        .map_err(|e| commit_error(&request, vec![], e))?;
    // broker-managed first
    backends.sort_by_key(|x| x.kind() != CoordinationKind::BrokerManaged);

    // prior offsets are read before any write
    let mut priors = Vec::with_capacity(backends.len());
    if backends.len() > 1 {
        for backend in &backends {
            let prior = backend
                .read_committed(&request.group, &request.topic, request.partition, timeout)
                .await
                .with_context(|| format!("While reading current {} offset", backend.kind()))
                .map_err(|e| commit_error(&request, vec![], e))?;
            priors.push(prior);
        }
    }

    for (index, backend) in backends.iter().enumerate() {
        let committed = backend
            .commit_offset(
                &request.group,
                &request.topic,
                request.partition,
                request.target_offset,
                timeout,
            )
            .await
            .with_context(|| format!("While committing to {}", backend.kind()));

        if let Err(e) = committed {
            let applied_to = roll_back(&request, &backends[..index], &priors, timeout).await;
            return Err(commit_error(&request, applied_to, e));
        }

        info!(
            "Group {} topic {} partition {}: committed offset {} to {}",
            request.group,
            request.topic,
            request.partition,
            request.target_offset,
            backend.kind()
        );
    }

    Ok(ResetOffsetResponse {
        request,
        coordination_kind: kind,
        bound,
    })
}

/// Restores the prior offset of every backend already written. Returns the backends that
/// still hold the new offset.
async fn roll_back(
    request: &ResetRequest,
    written: &[CoordinationBackend],
    priors: &[Option<i64>],
    timeout: Duration,
) -> Vec<CoordinationKind> {
    let mut applied_to = vec![];
    for (backend, prior) in written.iter().zip(priors) {
        let Some(prior) = prior else {
            warn!(
                "Group {} topic {} partition {}: nothing was committed to {} before, new offset is kept",
                request.group,
                request.topic,
                request.partition,
                backend.kind()
            );
            applied_to.push(backend.kind());
            continue;
        };

        match backend
            .commit_offset(&request.group, &request.topic, request.partition, *prior, timeout)
            .await
        {
            Ok(()) => info!(
                "Group {} topic {} partition {}: restored offset {} in {}",
                request.group,
                request.topic,
                request.partition,
                prior,
                backend.kind()
            ),
            Err(e) => {
                warn!(
                    "Group {} topic {} partition {}: failed to restore offset {} in {}: {:#}",
                    request.group,
                    request.topic,
                    request.partition,
                    prior,
                    backend.kind(),
                    e
                );
                applied_to.push(backend.kind());
            }
        }
    }
    applied_to
}

fn commit_error(
    request: &ResetRequest,
    applied_to: Vec<CoordinationKind>,
    source: anyhow::Error,
) -> AuditError {
    AuditError::Commit {
        group: request.group.clone(),
        topic: request.topic.clone(),
        partition: request.partition,
        applied_to,
        source,
    }
}
