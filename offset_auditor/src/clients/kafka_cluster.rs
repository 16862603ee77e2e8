use crate::clients::{BrokerGroupClient, ClusterClient, CommittedOffset, LogBounds, TopicPartitions};
use crate::connection_settings::ConnectionSettings;
use crate::consumer::{decode_member_assignment, ConsumerWrapper};
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use rdkafka::consumer::{CommitMode, Consumer};
use rdkafka::{Offset, TopicPartitionList};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// librdkafka-backed cluster metadata and broker-managed group client.
///
/// Every call runs on the blocking pool; the metadata consumer is shared, group specific
/// consumers are created per call because `group.id` is fixed at creation.
pub struct KafkaCluster {
    connection_settings: Arc<ConnectionSettings>,
    metadata_consumer: Arc<ConsumerWrapper>,
    request_timeout: Duration,
}

impl KafkaCluster {
    pub fn connect(
        connection_settings: ConnectionSettings,
        request_timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let metadata_consumer = ConsumerWrapper::create_for_non_consuming(&connection_settings, None)
            .context("While creating metadata consumer")?;

        Ok(Self {
            connection_settings: Arc::new(connection_settings),
            metadata_consumer: Arc::new(metadata_consumer),
            request_timeout,
        })
    }

    async fn run_blocking<T, F>(&self, f: F) -> Result<T, anyhow::Error>
    where
        T: Send + 'static,
        F: FnOnce(&ConsumerWrapper, Duration) -> Result<T, anyhow::Error> + Send + 'static,
    {
        let consumer = self.metadata_consumer.clone();
        let timeout = self.request_timeout;
        let handle = tokio::task::spawn_blocking(move || f(&consumer, timeout));

        handle.await.context("While joining blocking handle")?
    }

    async fn run_blocking_for_group<T, F>(&self, group: &str, f: F) -> Result<T, anyhow::Error>
    where
        T: Send + 'static,
        F: FnOnce(&ConsumerWrapper, Duration) -> Result<T, anyhow::Error> + Send + 'static,
    {
        let connection_settings = self.connection_settings.clone();
        let group = group.to_owned();
        let timeout = self.request_timeout;
        let handle = tokio::task::spawn_blocking(move || {
            let consumer =
                ConsumerWrapper::create_for_non_consuming(&connection_settings, Some(&group))
                    .with_context(|| format!("While creating consumer for group {}", group))?;
            f(&consumer, timeout)
        });

        handle.await.context("While joining blocking handle")?
    }
}

#[async_trait]
impl ClusterClient for KafkaCluster {
    async fn list_topics(&self) -> Result<Vec<String>, anyhow::Error> {
        self.run_blocking(|consumer, timeout| {
            let metadata = consumer
                .fetch_metadata(None, timeout)
                .context("While fetching metadata")?;

            trace!("Got metadata from broker. Topics: {}", metadata.topics().len());

            Ok(metadata
                .topics()
                .iter()
                .map(|topic| topic.name().to_owned())
                .collect())
        })
        .await
    }

    async fn partitions_of(&self, topic: &str) -> Result<Vec<i32>, anyhow::Error> {
        let topic = topic.to_owned();
        self.run_blocking(move |consumer, timeout| {
            let metadata = consumer
                .fetch_metadata(Some(topic.as_str()), timeout)
                .with_context(|| format!("While fetching topic '{}' metadata", topic))?;

            let topic_metadata = metadata
                .topics()
                .iter()
                .find(|x| x.name() == topic)
                .ok_or_else(|| anyhow!("Topic {} not found in metadata", topic))?;

            if let Some(error) = topic_metadata.error() {
                bail!("Broker returned error for topic {}: {:?}", topic, error)
            }

            let mut partitions = topic_metadata
                .partitions()
                .iter()
                .map(|x| x.id())
                .collect::<Vec<_>>();
            partitions.sort_unstable();

            Ok(partitions)
        })
        .await
    }

    async fn fetch_log_bounds(
        &self,
        topic: &str,
        partition: i32,
    ) -> Result<LogBounds, anyhow::Error> {
        let topic = topic.to_owned();
        self.run_blocking(move |consumer, timeout| {
            let (low, high) = consumer
                .fetch_watermarks(&topic, partition, timeout)
                .with_context(|| {
                    format!(
                        "While fetching watermarks for topic {} and partition {}",
                        topic, partition
                    )
                })?;

            Ok(LogBounds {
                oldest: low,
                newest: high,
            })
        })
        .await
    }
}

#[async_trait]
impl BrokerGroupClient for KafkaCluster {
    async fn list_groups(&self) -> Result<Vec<String>, anyhow::Error> {
        self.run_blocking(|consumer, timeout| {
            let groups = consumer
                .fetch_group_list(None, timeout)
                .context("While fetching groups")?;

            Ok(groups
                .groups()
                .iter()
                .map(|group| group.name().to_owned())
                .collect())
        })
        .await
    }

    async fn fetch_committed_offsets(
        &self,
        group: &str,
        partitions: &[TopicPartitions],
    ) -> Result<Vec<CommittedOffset>, anyhow::Error> {
        let mut tpl = TopicPartitionList::new();
        for topic in partitions {
            for partition in &topic.partitions {
                tpl.add_partition_offset(&topic.topic, *partition, Offset::Invalid)
                    .with_context(|| {
                        format!("While adding {}/{} to partition list", topic.topic, partition)
                    })?;
            }
        }

        let group_id = group.to_owned();
        self.run_blocking_for_group(group, move |consumer, timeout| {
            let owners = fetch_partition_owners(consumer, &group_id, timeout)?;

            let committed = consumer
                .committed_offsets(tpl, timeout)
                .context("While fetching committed offsets")?;

            let offsets = committed
                .elements()
                .iter()
                .map(|element| {
                    let key = (element.topic().to_owned(), element.partition());
                    CommittedOffset {
                        member_id: owners.get(&key).cloned(),
                        topic: key.0,
                        partition: key.1,
                        offset: element.offset().to_raw().unwrap_or(-1),
                    }
                })
                .collect::<Vec<_>>();

            debug!(
                "Group {} has {} committed partitions",
                group_id,
                offsets.iter().filter(|x| x.offset >= 0).count()
            );

            Ok(offsets)
        })
        .await
    }

    async fn commit_offset(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<(), anyhow::Error> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(topic, partition, Offset::Offset(offset))
            .with_context(|| format!("While adding {}/{} to partition list", topic, partition))?;

        self.run_blocking_for_group(group, move |consumer, _| {
            consumer
                .commit(&tpl, CommitMode::Sync)
                .context("While committing offsets")
        })
        .await
    }
}

/// Maps every assigned (topic, partition) of the group's live members to the member id.
fn fetch_partition_owners(
    consumer: &ConsumerWrapper,
    group: &str,
    timeout: Duration,
) -> Result<HashMap<(String, i32), String>, anyhow::Error> {
    let groups = consumer
        .fetch_group_list(Some(group), timeout)
        .with_context(|| format!("While describing group {}", group))?;

    let mut owners = HashMap::new();
    for group_info in groups.groups().iter().filter(|x| x.name() == group) {
        for member in group_info.members() {
            let Some(assignment) = member.assignment() else {
                continue;
            };

            match decode_member_assignment(assignment) {
                Ok(assigned) => {
                    for topic in assigned {
                        for partition in topic.partitions {
                            owners.insert((topic.topic.clone(), partition), member.id().to_owned());
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "Can't decode assignment of member {} in group {}: {:?}",
                        member.id(),
                        group,
                        e
                    );
                }
            }
        }
    }

    Ok(owners)
}
