use async_trait::async_trait;

/// Path-addressed store of legacy consumer offsets (`/consumers/<group>/...`).
///
/// Reads of a missing node return `Ok(None)` or an empty list.
#[async_trait]
pub trait LegacyOffsetStore: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<String>, anyhow::Error>;

    async fn list_consumed_topics(&self, group: &str) -> Result<Vec<String>, anyhow::Error>;

    async fn list_partitions(&self, group: &str, topic: &str) -> Result<Vec<i32>, anyhow::Error>;

    async fn read_offset(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
    ) -> Result<Option<i64>, anyhow::Error>;

    async fn read_owner(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
    ) -> Result<Option<String>, anyhow::Error>;

    async fn write_offset(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<(), anyhow::Error>;
}
