use offset_auditor::commands::reset_offset::{reset_from_snapshot, reset_offset};
use offset_auditor::error::AuditError;
use offset_auditor::models::{CoordinationKind, ResetRequest};
use offset_auditor::queries::audit_offsets::{audit_offsets, AuditOffsetsQuery};
use offset_auditor::snapshot::{export_snapshot, OffsetSnapshot};
use offset_auditor::testing::{in_memory_handle, InMemoryCluster, InMemoryLegacyStore};

fn request(group: &str, topic: &str, partition: i32, target_offset: i64) -> ResetRequest {
    ResetRequest {
        group: group.to_owned(),
        topic: topic.to_owned(),
        partition,
        target_offset,
    }
}

#[tokio::test]
async fn reset_commits_target_and_is_idempotent() {
    let cluster = InMemoryCluster::new()
        .with_partition("t1", 0, 10, 100)
        .with_commit("g1", "t1", 0, 95);
    let handle = in_memory_handle(&cluster, None);

    for _ in 0..2 {
        let response = reset_offset(&handle, request("g1", "t1", 0, 42))
            .await
            .unwrap();
        assert_eq!(response.coordination_kind, CoordinationKind::BrokerManaged);
        assert_eq!(cluster.committed("g1", "t1", 0), Some(42));
    }
}

#[tokio::test]
async fn reset_outside_retained_range_is_rejected_and_leaves_offset() {
    let cluster = InMemoryCluster::new()
        .with_partition("t1", 0, 10, 100)
        .with_commit("g1", "t1", 0, 95);
    let handle = in_memory_handle(&cluster, None);

    for target in [9, 101] {
        let error = reset_offset(&handle, request("g1", "t1", 0, target))
            .await
            .unwrap_err();

        match error {
            AuditError::OutOfRangeReset {
                requested,
                oldest,
                newest,
                ..
            } => {
                assert_eq!(requested, target);
                assert_eq!((oldest, newest), (10, 100));
            }
            other => panic!("Unexpected error: {other:?}"),
        }
    }
    assert_eq!(cluster.committed("g1", "t1", 0), Some(95));
}

#[tokio::test]
async fn range_boundaries_are_accepted() {
    let cluster = InMemoryCluster::new()
        .with_partition("t1", 0, 10, 100)
        .with_commit("g1", "t1", 0, 50);
    let handle = in_memory_handle(&cluster, None);

    reset_offset(&handle, request("g1", "t1", 0, 10)).await.unwrap();
    assert_eq!(cluster.committed("g1", "t1", 0), Some(10));

    reset_offset(&handle, request("g1", "t1", 0, 100)).await.unwrap();
    assert_eq!(cluster.committed("g1", "t1", 0), Some(100));
}

#[tokio::test]
async fn legacy_group_reset_writes_the_coordination_store() {
    let cluster = InMemoryCluster::new().with_partition("t1", 0, 0, 100);
    let legacy = InMemoryLegacyStore::new().with_offset("legacy-etl", "t1", 0, 90);
    let handle = in_memory_handle(&cluster, Some(&legacy));

    let response = reset_offset(&handle, request("legacy-etl", "t1", 0, 20))
        .await
        .unwrap();

    assert_eq!(response.coordination_kind, CoordinationKind::LegacyZk);
    assert_eq!(legacy.offset("legacy-etl", "t1", 0), Some(20));
    assert_eq!(cluster.committed("legacy-etl", "t1", 0), None);
}

#[tokio::test]
async fn migrating_group_reset_writes_both_backends() {
    let cluster = InMemoryCluster::new()
        .with_partition("t1", 0, 0, 100)
        .with_commit("orders", "t1", 0, 80);
    let legacy = InMemoryLegacyStore::new().with_offset("orders", "t1", 0, 70);
    let handle = in_memory_handle(&cluster, Some(&legacy));

    reset_offset(&handle, request("orders", "t1", 0, 5))
        .await
        .unwrap();

    assert_eq!(cluster.committed("orders", "t1", 0), Some(5));
    assert_eq!(legacy.offset("orders", "t1", 0), Some(5));
}

#[tokio::test]
async fn migrating_group_reset_refused_by_brokers_leaves_both_backends() {
    let cluster = InMemoryCluster::new()
        .with_partition("t1", 0, 0, 100)
        .with_commit("orders", "t1", 0, 80);
    let legacy = InMemoryLegacyStore::new().with_offset("orders", "t1", 0, 70);
    cluster.fail_group("orders");
    let handle = in_memory_handle(&cluster, Some(&legacy));

    let error = reset_offset(&handle, request("orders", "t1", 0, 5))
        .await
        .unwrap_err();

    match error {
        AuditError::Commit { applied_to, .. } => assert!(applied_to.is_empty()),
        other => panic!("Unexpected error: {other:?}"),
    }
    assert_eq!(legacy.offset("orders", "t1", 0), Some(70));
    assert_eq!(cluster.committed("orders", "t1", 0), Some(80));
}

#[tokio::test]
async fn migrating_group_reset_is_rolled_back_when_legacy_write_fails() {
    let cluster = InMemoryCluster::new()
        .with_partition("t1", 0, 0, 100)
        .with_commit("orders", "t1", 0, 80);
    let legacy = InMemoryLegacyStore::new().with_offset("orders", "t1", 0, 70);
    legacy.fail_writes("orders");
    let handle = in_memory_handle(&cluster, Some(&legacy));

    let error = reset_offset(&handle, request("orders", "t1", 0, 5))
        .await
        .unwrap_err();

    match &error {
        AuditError::Commit { applied_to, .. } => assert!(applied_to.is_empty()),
        other => panic!("Unexpected error: {other:?}"),
    }
    assert!(error.report().contains("Not authorized"));
    assert_eq!(cluster.committed("orders", "t1", 0), Some(80));
    assert_eq!(legacy.offset("orders", "t1", 0), Some(70));
}

#[tokio::test]
async fn unrestorable_broker_commit_is_reported() {
    let cluster = InMemoryCluster::new()
        .with_partition("t1", 0, 0, 100)
        .with_group("orders");
    let legacy = InMemoryLegacyStore::new().with_offset("orders", "t1", 0, 70);
    legacy.fail_writes("orders");
    let handle = in_memory_handle(&cluster, Some(&legacy));

    let error = reset_offset(&handle, request("orders", "t1", 0, 5))
        .await
        .unwrap_err();

    match error {
        AuditError::Commit { applied_to, .. } => {
            assert_eq!(applied_to, vec![CoordinationKind::BrokerManaged])
        }
        other => panic!("Unexpected error: {other:?}"),
    }
    assert_eq!(cluster.committed("orders", "t1", 0), Some(5));
    assert_eq!(legacy.offset("orders", "t1", 0), Some(70));
}

#[tokio::test]
async fn unknown_group_is_committed_to_the_brokers() {
    let cluster = InMemoryCluster::new().with_partition("t1", 0, 0, 100);
    let handle = in_memory_handle(&cluster, None);

    reset_offset(&handle, request("new-group", "t1", 0, 3))
        .await
        .unwrap();

    assert_eq!(cluster.committed("new-group", "t1", 0), Some(3));
}

#[tokio::test]
async fn snapshot_reset_restores_exported_offsets_and_isolates_failures() {
    let cluster = InMemoryCluster::new()
        .with_partition("t1", 0, 0, 100)
        .with_partition("t1", 1, 0, 100)
        .with_partition("t2", 0, 0, 100)
        .with_commit("g1", "t1", 0, 60)
        .with_commit("g1", "t1", 1, 70)
        .with_commit("g1", "t2", 0, 80)
        .with_group("g2")
        .with_owner("g2", "t1", 0, "g2-member");
    let handle = in_memory_handle(&cluster, None);

    let audit = audit_offsets(&handle, AuditOffsetsQuery::default())
        .await
        .unwrap();
    let snapshot = export_snapshot(&audit.records);

    // consumers move on after the export
    for (topic, partition) in [("t1", 0), ("t1", 1), ("t2", 0)] {
        reset_offset(&handle, request("g1", topic, partition, 99))
            .await
            .unwrap();
    }
    cluster.fail_partition("t1", 1);

    let response = reset_from_snapshot(&handle, &snapshot).await.unwrap();

    assert_eq!(response.applied.len(), 2);
    assert_eq!(response.failures.len(), 1);
    assert_eq!(response.failures[0].request, request("g1", "t1", 1, 70));
    assert!(matches!(
        response.failures[0].error,
        AuditError::OffsetQuery { .. }
    ));
    assert_eq!(response.skipped.len(), 1);
    assert_eq!(response.skipped[0].group, "g2");

    assert_eq!(cluster.committed("g1", "t1", 0), Some(60));
    assert_eq!(cluster.committed("g1", "t1", 1), Some(99));
    assert_eq!(cluster.committed("g1", "t2", 0), Some(80));
}

#[tokio::test]
async fn snapshot_survives_a_file_round_trip() {
    let cluster = InMemoryCluster::new()
        .with_partition("t1", 0, 0, 100)
        .with_partition("t1", 1, 0, 50)
        .with_commit("g1", "t1", 0, 80)
        .with_commit("g1", "t1", 1, 50);
    let legacy = InMemoryLegacyStore::new()
        .with_offset("legacy-etl", "gone", 4, 12)
        .with_owner("legacy-etl", "gone", 4, "legacy-etl_host-1");
    let handle = in_memory_handle(&cluster, Some(&legacy));

    let audit = audit_offsets(&handle, AuditOffsetsQuery::default())
        .await
        .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("offsets.json");

    export_snapshot(&audit.records).write_to(&path).await.unwrap();
    let imported = OffsetSnapshot::read_from(&path).await.unwrap();

    assert_eq!(imported.records(), &audit.records);
    assert_eq!(imported.records()["legacy-etl"]["gone"][&4].newest_offset, None);
}
