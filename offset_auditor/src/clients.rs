mod broker_group_client;
mod cluster_client;
mod kafka_cluster;
mod legacy_offset_store;
mod zookeeper_store;

pub use broker_group_client::*;
pub use cluster_client::*;
pub use kafka_cluster::*;
pub use legacy_offset_store::*;
pub use zookeeper_store::*;

use crate::connection_settings::ConnectionSettings;
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AuditSettings {
    /// Upper bound of concurrently running topic or group tasks.
    pub max_in_flight_requests: usize,
    /// Deadline of every single backend call.
    pub request_timeout: Duration,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            max_in_flight_requests: 16,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Connections to the cluster and the coordination backends, created once per process and
/// handed to every query and command.
#[derive(Clone)]
pub struct ClusterHandle {
    cluster: Arc<dyn ClusterClient>,
    groups: Arc<dyn BrokerGroupClient>,
    legacy: Option<Arc<dyn LegacyOffsetStore>>,
    settings: AuditSettings,
    in_flight: Arc<Semaphore>,
}

impl ClusterHandle {
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        groups: Arc<dyn BrokerGroupClient>,
        legacy: Option<Arc<dyn LegacyOffsetStore>>,
        settings: AuditSettings,
    ) -> Self {
        let in_flight = Arc::new(Semaphore::new(settings.max_in_flight_requests.max(1)));
        Self {
            cluster,
            groups,
            legacy,
            settings,
            in_flight,
        }
    }

    pub async fn connect(
        connection_settings: ConnectionSettings,
        settings: AuditSettings,
    ) -> Result<Self, anyhow::Error> {
        let legacy: Option<Arc<dyn LegacyOffsetStore>> =
            match &connection_settings.zookeeper_servers {
                Some(servers) => {
                    let store = ZookeeperStore::connect(servers)
                        .await
                        .context("While connecting to legacy offset store")?;
                    info!("Connected to zookeeper {}", servers);
                    Some(Arc::new(store))
                }
                None => None,
            };

        let kafka = Arc::new(
            KafkaCluster::connect(connection_settings, settings.request_timeout)
                .context("While creating kafka client")?,
        );

        Ok(Self::new(kafka.clone(), kafka, legacy, settings))
    }

    pub fn cluster(&self) -> &Arc<dyn ClusterClient> {
        &self.cluster
    }

    pub fn groups(&self) -> &Arc<dyn BrokerGroupClient> {
        &self.groups
    }

    pub fn legacy(&self) -> Option<&Arc<dyn LegacyOffsetStore>> {
        self.legacy.as_ref()
    }

    pub fn settings(&self) -> &AuditSettings {
        &self.settings
    }

    pub(crate) fn in_flight(&self) -> &Arc<Semaphore> {
        &self.in_flight
    }
}
