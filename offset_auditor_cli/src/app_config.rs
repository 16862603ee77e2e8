use crate::cli::ConnectionArgs;
use anyhow::Context;
use config::Config;
use offset_auditor::clients::AuditSettings;
use offset_auditor::connection_settings::ConnectionSettings;
use offset_auditor::consumer::SecurityProtocol;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

#[derive(Deserialize, Debug, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub zookeeper: Option<ZookeeperConfig>,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Deserialize, Debug, Default)]
pub struct KafkaConfig {
    #[serde(default)]
    pub brokers: Vec<String>,
    #[serde(default)]
    pub security_protocol: SecurityProtocol,
}

#[derive(Deserialize, Debug)]
pub struct ZookeeperConfig {
    pub servers: String,
}

#[derive(Deserialize, Debug)]
pub struct AuditConfig {
    #[serde(default = "default_max_in_flight_requests")]
    pub max_in_flight_requests: usize,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_in_flight_requests: default_max_in_flight_requests(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_max_in_flight_requests() -> usize {
    AuditSettings::default().max_in_flight_requests
}

fn default_request_timeout_ms() -> u64 {
    AuditSettings::default().request_timeout.as_millis() as u64
}

impl AppConfig {
    /// Reads `config_file` when given, otherwise an optional `appsettings` file from the
    /// working directory. `APP__SECTION__KEY` environment variables override both.
    pub fn build(config_file: Option<&Path>) -> Result<Self, anyhow::Error> {
        let file = match config_file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("appsettings").required(false),
        };

        let config = Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("kafka.brokers")
                    .try_parsing(true),
            )
            .build()
            .context("While building config")?;

        let deserialized_config = config
            .try_deserialize()
            .context("While deserializing config")?;

        info!("App config: {deserialized_config:?}");

        Ok(deserialized_config)
    }

    /// Command-line values take precedence over the configured ones.
    pub fn connection_settings(&self, args: &ConnectionArgs) -> ConnectionSettings {
        let brokers = if args.brokers.is_empty() {
            self.kafka.brokers.clone()
        } else {
            args.brokers.clone()
        };

        let zookeeper_servers = args
            .zk_servers
            .clone()
            .or_else(|| self.zookeeper.as_ref().map(|x| x.servers.clone()));

        ConnectionSettings {
            brokers,
            security_protocol: self.kafka.security_protocol,
            zookeeper_servers,
        }
    }

    pub fn audit_settings(&self) -> AuditSettings {
        AuditSettings {
            max_in_flight_requests: self.audit.max_in_flight_requests,
            request_timeout: Duration::from_millis(self.audit.request_timeout_ms),
        }
    }
}
