use crate::clients::LegacyOffsetStore;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::{debug, warn};
use zookeeper_client as zk;

const CONSUMERS_PATH: &str = "/consumers";

/// Legacy consumer offsets kept by the ZooKeeper based high-level consumer.
///
/// Layout: `/consumers/<group>/offsets/<topic>/<partition>` holds the decimal offset,
/// `/consumers/<group>/owners/<topic>/<partition>` holds the owning consumer thread id.
pub struct ZookeeperStore {
    client: zk::Client,
}

impl ZookeeperStore {
    pub async fn connect(servers: &str) -> Result<Self, anyhow::Error> {
        let client = zk::Client::connect(servers)
            .await
            .with_context(|| format!("While connecting to zookeeper {}", servers))?;

        Ok(Self { client })
    }

    async fn children(&self, path: &str) -> Result<Vec<String>, anyhow::Error> {
        match self.client.list_children(path).await {
            Ok(children) => Ok(children),
            Err(zk::Error::NoNode) => Ok(vec![]),
            Err(e) => Err(e).with_context(|| format!("While listing children of {}", path)),
        }
    }

    async fn data(&self, path: &str) -> Result<Option<Vec<u8>>, anyhow::Error> {
        match self.client.get_data(path).await {
            Ok((data, _)) => Ok(Some(data)),
            Err(zk::Error::NoNode) => Ok(None),
            Err(e) => Err(e).with_context(|| format!("While reading {}", path)),
        }
    }

    async fn create_with_parents(&self, path: &str, data: &[u8]) -> Result<(), anyhow::Error> {
        let options = zk::CreateMode::Persistent.with_acls(zk::Acls::anyone_all());

        let mut parent = String::new();
        let segments = path.trim_start_matches('/').split('/').collect::<Vec<_>>();
        for segment in &segments[..segments.len().saturating_sub(1)] {
            parent.push('/');
            parent.push_str(segment);
            match self.client.create(&parent, &[], &options).await {
                Ok(_) | Err(zk::Error::NodeExists) => {}
                Err(e) => return Err(e).with_context(|| format!("While creating {}", parent)),
            }
        }

        match self.client.create(path, data, &options).await {
            Ok(_) => Ok(()),
            Err(zk::Error::NodeExists) => {
                self.client
                    .set_data(path, data, None)
                    .await
                    .with_context(|| format!("While writing {}", path))?;
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("While creating {}", path)),
        }
    }
}

fn group_path(group: &str, section: &str) -> String {
    format!("{}/{}/{}", CONSUMERS_PATH, group, section)
}

fn partition_path(group: &str, section: &str, topic: &str, partition: i32) -> String {
    format!("{}/{}/{}", group_path(group, section), topic, partition)
}

#[async_trait]
impl LegacyOffsetStore for ZookeeperStore {
    async fn list_groups(&self) -> Result<Vec<String>, anyhow::Error> {
        self.children(CONSUMERS_PATH).await
    }

    async fn list_consumed_topics(&self, group: &str) -> Result<Vec<String>, anyhow::Error> {
        let mut topics = BTreeSet::new();
        topics.extend(self.children(&group_path(group, "offsets")).await?);
        topics.extend(self.children(&group_path(group, "owners")).await?);

        Ok(topics.into_iter().collect())
    }

    async fn list_partitions(&self, group: &str, topic: &str) -> Result<Vec<i32>, anyhow::Error> {
        let mut children = self
            .children(&format!("{}/{}", group_path(group, "offsets"), topic))
            .await?;
        children.extend(
            self.children(&format!("{}/{}", group_path(group, "owners"), topic))
                .await?,
        );

        let mut partitions = BTreeSet::new();
        for child in children {
            match child.parse::<i32>() {
                Ok(partition) => {
                    partitions.insert(partition);
                }
                Err(_) => warn!(
                    "Skipping non numeric partition node '{}' of group {} topic {}",
                    child, group, topic
                ),
            }
        }

        Ok(partitions.into_iter().collect())
    }

    async fn read_offset(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
    ) -> Result<Option<i64>, anyhow::Error> {
        let path = partition_path(group, "offsets", topic, partition);
        let Some(data) = self.data(&path).await? else {
            return Ok(None);
        };

        let text = String::from_utf8_lossy(&data);
        let offset = text
            .trim()
            .parse::<i64>()
            .map_err(|e| anyhow!("Node {} holds '{}' instead of an offset: {}", path, text, e))?;

        Ok(Some(offset))
    }

    async fn read_owner(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
    ) -> Result<Option<String>, anyhow::Error> {
        let path = partition_path(group, "owners", topic, partition);
        let owner = self
            .data(&path)
            .await?
            .map(|data| String::from_utf8_lossy(&data).trim().to_owned());

        Ok(owner)
    }

    async fn write_offset(
        &self,
        group: &str,
        topic: &str,
        partition: i32,
        offset: i64,
    ) -> Result<(), anyhow::Error> {
        let path = partition_path(group, "offsets", topic, partition);
        let data = offset.to_string();
        debug!("Writing offset {} to {}", offset, path);

        match self.client.set_data(&path, data.as_bytes(), None).await {
            Ok(_) => Ok(()),
            Err(zk::Error::NoNode) => self.create_with_parents(&path, data.as_bytes()).await,
            Err(e) => Err(e).with_context(|| format!("While writing {}", path)),
        }
    }
}
