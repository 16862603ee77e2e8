use crate::error::AuditError;
use crate::models::AuditMap;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Durable form of an audit: group -> topic -> partition -> record, as a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OffsetSnapshot {
    groups: AuditMap,
}

pub fn export_snapshot(audit: &AuditMap) -> OffsetSnapshot {
    OffsetSnapshot {
        groups: audit.clone(),
    }
}

impl OffsetSnapshot {
    pub fn records(&self) -> &AuditMap {
        &self.groups
    }

    pub fn into_records(self) -> AuditMap {
        self.groups
    }

    pub fn to_json(&self) -> Result<String, anyhow::Error> {
        serde_json::to_string_pretty(self).context("While serializing offset snapshot")
    }

    pub fn from_json(json: &str) -> Result<Self, anyhow::Error> {
        serde_json::from_str(json).context("While deserializing offset snapshot")
    }

    pub async fn write_to(&self, path: &Path) -> Result<(), anyhow::Error> {
        let json = self.to_json()?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("While writing offset snapshot to {}", path.display()))?;

        info!("Exported {} groups to {}", self.groups.len(), path.display());
        Ok(())
    }

    pub async fn read_from(path: &Path) -> Result<Self, AuditError> {
        let to_error = |source| AuditError::Serialization {
            path: path.to_path_buf(),
            source,
        };

        let json = tokio::fs::read_to_string(path)
            .await
            .context("While reading file")
            .map_err(to_error)?;

        Self::from_json(&json).map_err(to_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuditRecord, CoordinationKind};

    fn sample() -> AuditMap {
        let mut audit = AuditMap::new();
        let topics = audit.entry("g1".to_owned()).or_default();
        let partitions = topics.entry("t1".to_owned()).or_default();
        partitions.insert(
            0,
            AuditRecord {
                oldest_offset: Some(0),
                newest_offset: Some(100),
                lag: Some(20),
                consumed_offset: 80,
                owning_member: "g1-1".to_owned(),
                coordination_kind: CoordinationKind::LegacyZk,
            },
        );
        partitions.insert(
            11,
            AuditRecord {
                oldest_offset: None,
                newest_offset: None,
                lag: None,
                consumed_offset: -1,
                owning_member: String::new(),
                coordination_kind: CoordinationKind::Any,
            },
        );
        audit
    }

    #[test]
    fn document_is_keyed_by_group_topic_and_textual_partition() {
        let json = export_snapshot(&sample()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let leaf = &value["g1"]["t1"]["0"];
        assert_eq!(leaf["oldestOffset"], 0);
        assert_eq!(leaf["newestOffset"], 100);
        assert_eq!(leaf["lag"], 20);
        assert_eq!(leaf["consumedOffset"], 80);
        assert_eq!(leaf["owningMember"], "g1-1");
        assert_eq!(leaf["coordinationKind"], "zk");
        assert!(value["g1"]["t1"]["11"]["lag"].is_null());
    }

    #[test]
    fn import_of_export_preserves_every_record() {
        let audit = sample();
        let json = export_snapshot(&audit).to_json().unwrap();

        let imported = OffsetSnapshot::from_json(&json).unwrap();

        assert_eq!(imported.records(), &audit);
    }

    #[test]
    fn key_order_of_the_document_does_not_matter() {
        let json = r#"{
            "g1": { "t1": {
                "3": { "owningMember": "", "coordinationKind": "kf", "consumedOffset": 7,
                       "lag": 3, "newestOffset": 10, "oldestOffset": 0 },
                "1": { "coordinationKind": "kf", "consumedOffset": 9, "owningMember": "m",
                       "oldestOffset": 0, "newestOffset": 10, "lag": 1 }
            } }
        }"#;

        let imported = OffsetSnapshot::from_json(json).unwrap();

        let partitions = &imported.records()["g1"]["t1"];
        assert_eq!(partitions.keys().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(partitions[&3].consumed_offset, 7);
    }

    #[tokio::test]
    async fn malformed_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let error = OffsetSnapshot::read_from(&path).await.unwrap_err();

        assert!(matches!(error, AuditError::Serialization { .. }));
    }

    #[tokio::test]
    async fn missing_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();

        let error = OffsetSnapshot::read_from(&dir.path().join("absent.json"))
            .await
            .unwrap_err();

        assert!(matches!(error, AuditError::Serialization { .. }));
    }
}
