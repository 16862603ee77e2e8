use async_trait::async_trait;

/// Committed offset of a broker-managed group as returned by the offset-fetch API.
///
/// `offset` is the raw broker value, negative when nothing was committed. `member_id` is set
/// when a live member currently has the partition assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedOffset {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub member_id: Option<String>,
}

/// Topic with the partitions to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPartitions {
    pub topic: String,
    pub partitions: Vec<i32>,
}

#[async_trait]
pub trait BrokerGroupClient: Send + Sync {
    async fn list_groups(&self) -> Result<Vec<String>, anyhow::Error>;

    async fn fetch_committed_offsets(
        &self,
        group: &str,
        partitions: &[TopicPartitions],
    ) -> Result<Vec<CommittedOffset>, anyhow::Error>;

    async fn commit_offset(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<(), anyhow::Error>;
}
