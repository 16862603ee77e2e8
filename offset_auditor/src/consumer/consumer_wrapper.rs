use crate::connection_settings::ConnectionSettings;
use anyhow::Context;
use rdkafka::consumer::BaseConsumer;
use rdkafka::ClientConfig;
use std::ops::{Deref, DerefMut};

/// Consumer that never subscribes; used for metadata, watermark and group offset requests.
pub struct ConsumerWrapper {
    consumer: BaseConsumer,
}

impl ConsumerWrapper {
    pub fn create_for_non_consuming(
        connection_settings: &ConnectionSettings,
        group: Option<&str>,
    ) -> Result<Self, anyhow::Error> {
        // https://raw.githubusercontent.com/confluentinc/librdkafka/master/CONFIGURATION.md
        let mut config = ClientConfig::try_from(connection_settings)?;
        config
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("enable.partition.eof", "false");

        if let Some(group) = group {
            config.set("group.id", group);
        }

        let consumer: BaseConsumer = config
            .create()
            .context("While creating kafka BaseConsumer")?;

        Ok(Self { consumer })
    }
}

impl DerefMut for ConsumerWrapper {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.consumer
    }
}

impl Deref for ConsumerWrapper {
    type Target = BaseConsumer;

    fn deref(&self) -> &Self::Target {
        &self.consumer
    }
}
