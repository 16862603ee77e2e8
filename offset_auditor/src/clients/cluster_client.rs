use async_trait::async_trait;

/// Oldest and newest offsets of a partition as reported by its leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogBounds {
    pub oldest: i64,
    pub newest: i64,
}

/// Topic and partition metadata of the Kafka cluster.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    async fn list_topics(&self) -> Result<Vec<String>, anyhow::Error>;

    async fn partitions_of(&self, topic: &str) -> Result<Vec<i32>, anyhow::Error>;

    async fn fetch_log_bounds(&self, topic: &str, partition: i32)
        -> Result<LogBounds, anyhow::Error>;
}
