use crate::app_config::AppConfig;
use crate::cli::{
    Cli, Command, ListGroupArgs, ListOffsetArgs, ListTopicArgs, ResetOffsetArgs,
};
use crate::error::{ApplicationError, RunOutcome};
use crate::output;
use anyhow::{anyhow, Context};
use offset_auditor::clients::ClusterHandle;
use offset_auditor::commands::reset_offset::{reset_from_snapshot, reset_offset};
use offset_auditor::filter::{GlobPattern, OffsetFilter};
use offset_auditor::models::{audit_rows, ResetRequest};
use offset_auditor::queries::audit_offsets::{audit_offsets, AuditOffsetsQuery};
use offset_auditor::queries::list_groups::{list_groups, ListGroupsQuery};
use offset_auditor::queries::list_topics::describe_topics;
use offset_auditor::snapshot::{export_snapshot, OffsetSnapshot};
use std::time::Instant;
use tracing::{info, warn};

pub async fn run(cli: Cli) -> Result<RunOutcome, ApplicationError> {
    let config = AppConfig::build(cli.connection.config.as_deref())
        .context("While building app config")
        .map_err(ApplicationError::InvalidArgument)?;

    let connection_settings = config.connection_settings(&cli.connection);
    let handle = ClusterHandle::connect(connection_settings, config.audit_settings())
        .await
        .context("While connecting to cluster")
        .map_err(ApplicationError::Unavailable)?;

    let started = Instant::now();
    let (rows, outcome) = match cli.command {
        Command::ListGroup(args) => list_group(&handle, args).await?,
        Command::ListTopic(args) => list_topic(&handle, args).await?,
        Command::ListOffset(args) => list_offset(&handle, args).await?,
        Command::ResetOffset(args) => reset(&handle, args).await?,
    };

    info!(
        "Result: {} rows processed in {:.3} seconds",
        rows,
        started.elapsed().as_secs_f64()
    );

    Ok(outcome)
}

fn pattern(value: &str) -> Result<GlobPattern, ApplicationError> {
    GlobPattern::new(value).map_err(ApplicationError::InvalidArgument)
}

pub async fn list_group(
    handle: &ClusterHandle,
    args: ListGroupArgs,
) -> Result<(usize, RunOutcome), ApplicationError> {
    let filter = pattern(&args.group_filter)?;

    let mut groups = list_groups(handle, ListGroupsQuery { kind: args.kind }).await?;
    groups.retain(|group, _| filter.matches(group));

    println!("{}", output::groups_table(&groups));

    Ok((groups.len(), RunOutcome::Completed))
}

pub async fn list_topic(
    handle: &ClusterHandle,
    args: ListTopicArgs,
) -> Result<(usize, RunOutcome), ApplicationError> {
    let filter = pattern(&args.filter)?;

    let topics = describe_topics(handle, &filter).await?;

    println!("{}", output::topics_table(&topics));

    Ok((topics.len(), RunOutcome::Completed))
}

pub async fn list_offset(
    handle: &ClusterHandle,
    args: ListOffsetArgs,
) -> Result<(usize, RunOutcome), ApplicationError> {
    let filter = OffsetFilter::new(&args.group_filter, &args.topic_filter, &args.consumer_filter)
        .map_err(ApplicationError::InvalidArgument)?;

    let response = audit_offsets(
        handle,
        AuditOffsetsQuery {
            kind: args.kind,
            filter,
        },
    )
    .await?;

    let rows = audit_rows(&response.records).count();
    match &args.export_file {
        Some(path) => {
            export_snapshot(&response.records)
                .write_to(path)
                .await
                .map_err(ApplicationError::InvalidArgument)?;
            info!("Exported {} rows to {}", rows, path.display());
        }
        None => println!("{}", output::audit_table(&response.records)),
    }

    if !response.failures.is_empty() {
        warn!("Offsets of {} groups couldn't be resolved", response.failures.len());
        println!("{}", output::group_failures_table(&response.failures));
    }

    Ok((rows, RunOutcome::from_failures(response.failures.len())))
}

pub async fn reset(
    handle: &ClusterHandle,
    args: ResetOffsetArgs,
) -> Result<(usize, RunOutcome), ApplicationError> {
    if let Some(path) = &args.import_file {
        let snapshot = OffsetSnapshot::read_from(path).await?;
        let response = reset_from_snapshot(handle, &snapshot).await?;

        println!("{}", output::reset_table(&response));

        let rows = response.applied.len() + response.skipped.len() + response.failures.len();
        return Ok((rows, RunOutcome::from_failures(response.failures.len())));
    }

    let request = match (args.group, args.topic, args.partition, args.offset) {
        (Some(group), Some(topic), Some(partition), Some(target_offset)) => ResetRequest {
            group,
            topic,
            partition,
            target_offset,
        },
        _ => {
            return Err(ApplicationError::InvalidArgument(anyhow!(
                "Either --import-file or all of --group, --topic, --partition and --offset are required"
            )))
        }
    };

    let response = reset_offset(handle, request).await?;

    println!("{}", output::single_reset_table(&response));

    Ok((1, RunOutcome::Completed))
}
