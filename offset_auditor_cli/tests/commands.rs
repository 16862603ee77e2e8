use offset_auditor::models::KindSelector;
use offset_auditor::testing::{in_memory_handle, InMemoryCluster};
use offset_auditor_cli::cli::{ListGroupArgs, ListOffsetArgs, ListTopicArgs, ResetOffsetArgs};
use offset_auditor_cli::error::{ApplicationError, RunOutcome};
use offset_auditor_cli::startup::{list_group, list_offset, list_topic, reset};

fn audit_everything(export_file: Option<std::path::PathBuf>) -> ListOffsetArgs {
    ListOffsetArgs {
        group_filter: "*".to_owned(),
        topic_filter: "*".to_owned(),
        consumer_filter: "*".to_owned(),
        kind: KindSelector::All,
        export_file,
    }
}

fn import(path: std::path::PathBuf) -> ResetOffsetArgs {
    ResetOffsetArgs {
        group: None,
        topic: None,
        partition: None,
        offset: None,
        import_file: Some(path),
    }
}

#[tokio::test]
async fn exported_audit_restores_offsets() {
    let cluster = InMemoryCluster::new()
        .with_partition("payments", 0, 0, 100)
        .with_partition("payments", 1, 0, 50)
        .with_commit("orders", "payments", 0, 90)
        .with_commit("orders", "payments", 1, 40);
    let handle = in_memory_handle(&cluster, None);
    let directory = tempfile::tempdir().unwrap();
    let snapshot = directory.path().join("offsets.json");

    let (rows, outcome) = list_offset(&handle, audit_everything(Some(snapshot.clone())))
        .await
        .unwrap();
    assert_eq!((rows, outcome), (2, RunOutcome::Completed));

    let moved = ResetOffsetArgs {
        group: Some("orders".to_owned()),
        topic: Some("payments".to_owned()),
        partition: Some(0),
        offset: Some(5),
        import_file: None,
    };
    reset(&handle, moved).await.unwrap();
    assert_eq!(cluster.committed("orders", "payments", 0), Some(5));

    let (rows, outcome) = reset(&handle, import(snapshot)).await.unwrap();
    assert_eq!((rows, outcome), (2, RunOutcome::Completed));
    assert_eq!(cluster.committed("orders", "payments", 0), Some(90));
    assert_eq!(cluster.committed("orders", "payments", 1), Some(40));
}

#[tokio::test]
async fn failing_group_completes_with_failures() {
    let cluster = InMemoryCluster::new()
        .with_partition("payments", 0, 0, 100)
        .with_commit("orders", "payments", 0, 90)
        .with_commit("billing", "payments", 0, 10);
    cluster.fail_group("billing");
    let handle = in_memory_handle(&cluster, None);

    let (rows, outcome) = list_offset(&handle, audit_everything(None)).await.unwrap();

    assert_eq!(rows, 1);
    assert_eq!(outcome, RunOutcome::CompletedWithFailures);
}

#[tokio::test]
async fn listings_apply_filters() {
    let cluster = InMemoryCluster::new()
        .with_partition("payments", 0, 0, 1)
        .with_partition("refunds", 0, 0, 1)
        .with_group("orders")
        .with_group("billing");
    let handle = in_memory_handle(&cluster, None);

    let (groups, _) = list_group(
        &handle,
        ListGroupArgs {
            group_filter: "ord*".to_owned(),
            kind: KindSelector::All,
        },
    )
    .await
    .unwrap();
    let (topics, _) = list_topic(
        &handle,
        ListTopicArgs {
            filter: "*".to_owned(),
        },
    )
    .await
    .unwrap();

    assert_eq!(groups, 1);
    assert_eq!(topics, 2);
}

#[tokio::test]
async fn missing_snapshot_is_fatal() {
    let cluster = InMemoryCluster::new().with_partition("payments", 0, 0, 1);
    let handle = in_memory_handle(&cluster, None);

    let error = reset(&handle, import("/nonexistent/offsets.json".into()))
        .await
        .unwrap_err();

    assert!(matches!(error, ApplicationError::Audit(_)));
}
