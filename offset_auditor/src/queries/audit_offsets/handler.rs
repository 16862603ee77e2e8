use crate::clients::ClusterHandle;
use crate::error::AuditError;
use crate::queries::audit_offsets::{aggregate, AuditOffsetsQuery, AuditOffsetsResponse};
use crate::queries::get_consumed_offsets::resolve_all_groups;
use crate::queries::get_produced_offsets::fetch_produced_offsets;
use crate::queries::list_groups::{list_groups, ListGroupsQuery};
use crate::queries::list_topics::list_topics;
use tracing::info;

/// Runs a full audit: metadata, produced bounds, consumed offsets, join and filter.
///
/// Metadata and produced-offset failures abort the audit. Group failures are returned in
/// [`AuditOffsetsResponse::failures`] next to the records of all other groups.
#[tracing::instrument(skip_all)]
pub async fn audit_offsets(
    handle: &ClusterHandle,
    query: AuditOffsetsQuery,
) -> Result<AuditOffsetsResponse, AuditError> {
    let (topics, mut groups) = tokio::try_join!(
        list_topics(handle),
        list_groups(handle, ListGroupsQuery { kind: query.kind }),
    )?;
    groups.retain(|group, _| query.filter.group.matches(group));

    info!(
        "Auditing {} groups against {} topics",
        groups.len(),
        topics.len()
    );

    // broker-managed groups are looked up against the partition layout found here
    let produced = fetch_produced_offsets(handle, &topics).await?;
    let consumed = resolve_all_groups(handle, &groups, &produced).await;

    let records = query.filter.apply(aggregate(&produced, consumed.consumed));

    Ok(AuditOffsetsResponse {
        records,
        failures: consumed.failures,
    })
}
