//! In-memory implementations of the client traits.
//!
//! They keep the whole cluster state in a mutex and can be told to fail a topic, partition or
//! group, which is enough to exercise the audit and reset paths without Kafka or ZooKeeper.

use crate::clients::{
    AuditSettings, BrokerGroupClient, ClusterClient, ClusterHandle, CommittedOffset,
    LegacyOffsetStore, LogBounds, TopicPartitions,
};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type PartitionKey = (String, String, i32);

#[derive(Default)]
struct ClusterState {
    topics: BTreeMap<String, BTreeMap<i32, LogBounds>>,
    groups: BTreeSet<String>,
    committed: BTreeMap<PartitionKey, i64>,
    owners: BTreeMap<PartitionKey, String>,
    failing_topics: BTreeSet<String>,
    failing_partitions: BTreeSet<(String, i32)>,
    failing_groups: BTreeSet<String>,
    unreachable: bool,
    bounds_delay: Option<Duration>,
    committed_delay: Option<Duration>,
    active_requests: usize,
    peak_requests: usize,
}

/// Counts a `fetch_log_bounds` / `fetch_committed_offsets` call as running until dropped.
struct RunningRequest {
    state: Arc<Mutex<ClusterState>>,
}

impl RunningRequest {
    fn start(state: &Arc<Mutex<ClusterState>>) -> Self {
        if let Ok(mut state) = state.lock() {
            state.active_requests += 1;
            state.peak_requests = state.peak_requests.max(state.active_requests);
        }
        Self {
            state: state.clone(),
        }
    }
}

impl Drop for RunningRequest {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.active_requests -= 1;
        }
    }
}

/// Kafka cluster with broker-managed groups.
#[derive(Default, Clone)]
pub struct InMemoryCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl InMemoryCluster {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ClusterState> {
        self.state.lock().expect("Poisoned mutex")
    }

    pub fn with_partition(self, topic: &str, partition: i32, oldest: i64, newest: i64) -> Self {
        self.state()
            .topics
            .entry(topic.to_owned())
            .or_default()
            .insert(partition, LogBounds { oldest, newest });
        self
    }

    pub fn with_group(self, group: &str) -> Self {
        self.state().groups.insert(group.to_owned());
        self
    }

    pub fn with_commit(self, group: &str, topic: &str, partition: i32, offset: i64) -> Self {
        {
            let mut state = self.state();
            state.groups.insert(group.to_owned());
            state
                .committed
                .insert((group.to_owned(), topic.to_owned(), partition), offset);
        }
        self
    }

    pub fn with_owner(self, group: &str, topic: &str, partition: i32, member: &str) -> Self {
        self.state().owners.insert(
            (group.to_owned(), topic.to_owned(), partition),
            member.to_owned(),
        );
        self
    }

    pub fn fail_topic(&self, topic: &str) {
        self.state().failing_topics.insert(topic.to_owned());
    }

    pub fn fail_partition(&self, topic: &str, partition: i32) {
        self.state()
            .failing_partitions
            .insert((topic.to_owned(), partition));
    }

    pub fn fail_group(&self, group: &str) {
        self.state().failing_groups.insert(group.to_owned());
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Delays every log bound query, to run into request timeouts.
    pub fn delay_bounds(&self, delay: Duration) {
        self.state().bounds_delay = Some(delay);
    }

    /// Delays every committed offset fetch.
    pub fn delay_committed_offsets(&self, delay: Duration) {
        self.state().committed_delay = Some(delay);
    }

    /// Highest number of log bound and committed offset requests seen running at once.
    pub fn peak_concurrent_requests(&self) -> usize {
        self.state().peak_requests
    }

    pub fn set_bounds(&self, topic: &str, partition: i32, oldest: i64, newest: i64) {
        self.state()
            .topics
            .entry(topic.to_owned())
            .or_default()
            .insert(partition, LogBounds { oldest, newest });
    }

    pub fn committed(&self, group: &str, topic: &str, partition: i32) -> Option<i64> {
        self.state()
            .committed
            .get(&(group.to_owned(), topic.to_owned(), partition))
            .copied()
    }
}

#[async_trait]
impl ClusterClient for InMemoryCluster {
    async fn list_topics(&self) -> Result<Vec<String>, anyhow::Error> {
        let state = self.state();
        if state.unreachable {
            bail!("All brokers are down")
        }
        Ok(state.topics.keys().cloned().collect())
    }

    async fn partitions_of(&self, topic: &str) -> Result<Vec<i32>, anyhow::Error> {
        let state = self.state();
        if state.failing_topics.contains(topic) {
            bail!("Leader not available for topic {}", topic)
        }
        state
            .topics
            .get(topic)
            .map(|x| x.keys().copied().collect())
            .ok_or_else(|| anyhow!("Unknown topic {}", topic))
    }

    async fn fetch_log_bounds(
        &self,
        topic: &str,
        partition: i32,
    ) -> Result<LogBounds, anyhow::Error> {
        let _running = RunningRequest::start(&self.state);
        let delay = self.state().bounds_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if state
            .failing_partitions
            .contains(&(topic.to_owned(), partition))
        {
            bail!("Offset request failed for {}/{}", topic, partition)
        }
        state
            .topics
            .get(topic)
            .and_then(|x| x.get(&partition))
            .copied()
            .ok_or_else(|| anyhow!("Unknown topic partition {}/{}", topic, partition))
    }
}

#[async_trait]
impl BrokerGroupClient for InMemoryCluster {
    async fn list_groups(&self) -> Result<Vec<String>, anyhow::Error> {
        let state = self.state();
        if state.unreachable {
            bail!("All brokers are down")
        }
        Ok(state.groups.iter().cloned().collect())
    }

    async fn fetch_committed_offsets(
        &self,
        group: &str,
        partitions: &[TopicPartitions],
    ) -> Result<Vec<CommittedOffset>, anyhow::Error> {
        let _running = RunningRequest::start(&self.state);
        let delay = self.state().committed_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state();
        if state.failing_groups.contains(group) {
            bail!("Coordinator not available for group {}", group)
        }

        let mut offsets = vec![];
        for topic in partitions {
            for partition in &topic.partitions {
                let key = (group.to_owned(), topic.topic.clone(), *partition);
                offsets.push(CommittedOffset {
                    topic: topic.topic.clone(),
                    partition: *partition,
                    // librdkafka reports missing commits as OFFSET_INVALID
                    offset: state.committed.get(&key).copied().unwrap_or(-1001),
                    member_id: state.owners.get(&key).cloned(),
                });
            }
        }
        Ok(offsets)
    }

    async fn commit_offset(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<(), anyhow::Error> {
        let mut state = self.state();
        if state.failing_groups.contains(group) {
            bail!("Coordinator not available for group {}", group)
        }
        state.groups.insert(group.to_owned());
        state
            .committed
            .insert((group.to_owned(), topic.to_owned(), partition), offset);
        Ok(())
    }
}

#[derive(Default)]
struct LegacyState {
    offsets: BTreeMap<PartitionKey, String>,
    owners: BTreeMap<PartitionKey, String>,
    failing_groups: BTreeSet<String>,
    failing_writes: BTreeSet<String>,
}

/// ZooKeeper `/consumers` tree. Offsets are kept as node text, like the real store.
#[derive(Default, Clone)]
pub struct InMemoryLegacyStore {
    state: Arc<Mutex<LegacyState>>,
}

impl InMemoryLegacyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, LegacyState> {
        self.state.lock().expect("Poisoned mutex")
    }

    pub fn with_offset(self, group: &str, topic: &str, partition: i32, offset: i64) -> Self {
        self.state().offsets.insert(
            (group.to_owned(), topic.to_owned(), partition),
            offset.to_string(),
        );
        self
    }

    /// Stores raw node content, e.g. to simulate a corrupted offset node.
    pub fn with_raw_offset(self, group: &str, topic: &str, partition: i32, data: &str) -> Self {
        self.state().offsets.insert(
            (group.to_owned(), topic.to_owned(), partition),
            data.to_owned(),
        );
        self
    }

    pub fn with_owner(self, group: &str, topic: &str, partition: i32, owner: &str) -> Self {
        self.state().owners.insert(
            (group.to_owned(), topic.to_owned(), partition),
            owner.to_owned(),
        );
        self
    }

    pub fn fail_group(&self, group: &str) {
        self.state().failing_groups.insert(group.to_owned());
    }

    /// Rejects offset writes of `group` while reads keep working.
    pub fn fail_writes(&self, group: &str) {
        self.state().failing_writes.insert(group.to_owned());
    }

    pub fn offset(&self, group: &str, topic: &str, partition: i32) -> Option<i64> {
        self.state()
            .offsets
            .get(&(group.to_owned(), topic.to_owned(), partition))
            .and_then(|x| x.parse().ok())
    }

    fn check_group(&self, group: &str) -> Result<(), anyhow::Error> {
        if self.state().failing_groups.contains(group) {
            bail!("Session expired while reading group {}", group)
        }
        Ok(())
    }
}

#[async_trait]
impl LegacyOffsetStore for InMemoryLegacyStore {
    async fn list_groups(&self) -> Result<Vec<String>, anyhow::Error> {
        let state = self.state();
        let groups = state
            .offsets
            .keys()
            .chain(state.owners.keys())
            .map(|(group, _, _)| group.clone())
            .collect::<BTreeSet<_>>();
        Ok(groups.into_iter().collect())
    }

    async fn list_consumed_topics(&self, group: &str) -> Result<Vec<String>, anyhow::Error> {
        self.check_group(group)?;
        let state = self.state();
        let topics = state
            .offsets
            .keys()
            .chain(state.owners.keys())
            .filter(|(g, _, _)| g == group)
            .map(|(_, topic, _)| topic.clone())
            .collect::<BTreeSet<_>>();
        Ok(topics.into_iter().collect())
    }

    async fn list_partitions(&self, group: &str, topic: &str) -> Result<Vec<i32>, anyhow::Error> {
        self.check_group(group)?;
        let state = self.state();
        let partitions = state
            .offsets
            .keys()
            .chain(state.owners.keys())
            .filter(|(g, t, _)| g == group && t == topic)
            .map(|(_, _, partition)| *partition)
            .collect::<BTreeSet<_>>();
        Ok(partitions.into_iter().collect())
    }

    async fn read_offset(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
    ) -> Result<Option<i64>, anyhow::Error> {
        self.check_group(group)?;
        let state = self.state();
        let Some(data) = state
            .offsets
            .get(&(group.to_owned(), topic.to_owned(), partition))
        else {
            return Ok(None);
        };
        let offset = data
            .trim()
            .parse::<i64>()
            .map_err(|e| anyhow!("Node holds '{}' instead of an offset: {}", data, e))?;
        Ok(Some(offset))
    }

    async fn read_owner(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
    ) -> Result<Option<String>, anyhow::Error> {
        self.check_group(group)?;
        Ok(self
            .state()
            .owners
            .get(&(group.to_owned(), topic.to_owned(), partition))
            .cloned())
    }

    async fn write_offset(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<(), anyhow::Error> {
        self.check_group(group)?;
        let mut state = self.state();
        if state.failing_writes.contains(group) {
            bail!("Not authorized to write offsets of group {}", group)
        }
        state.offsets.insert(
            (group.to_owned(), topic.to_owned(), partition),
            offset.to_string(),
        );
        Ok(())
    }
}

/// Handle over in-memory backends with a short request timeout.
pub fn in_memory_handle(
    cluster: &InMemoryCluster,
    legacy: Option<&InMemoryLegacyStore>,
) -> ClusterHandle {
    let cluster = Arc::new(cluster.clone());
    let legacy = legacy.map(|x| Arc::new(x.clone()) as Arc<dyn LegacyOffsetStore>);

    ClusterHandle::new(
        cluster.clone(),
        cluster,
        legacy,
        AuditSettings {
            max_in_flight_requests: 4,
            request_timeout: Duration::from_secs(1),
        },
    )
}
