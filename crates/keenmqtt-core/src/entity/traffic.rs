use std::sync::Arc;

use async_trait::async_trait;

use super::{Entity, EntityKind, TopicScheme, entity_name};
use crate::discovery::{DiscoveryPublisher, SensorClass};
use crate::error::CoreError;
use crate::model::Client;

const BYTES: SensorClass = SensorClass {
    unit: "B",
    device_class: Some("data_size"),
    state_class: Some("total_increasing"),
};

/// Received or transmitted byte counter exposed as a `sensor`.
pub struct TrafficSensor {
    kind: EntityKind,
    discovery: Arc<DiscoveryPublisher>,
    topics: TopicScheme,
}

impl TrafficSensor {
    pub fn rx(discovery: Arc<DiscoveryPublisher>, topics: TopicScheme) -> Self {
        Self {
            kind: EntityKind::RxBytes,
            discovery,
            topics,
        }
    }

    pub fn tx(discovery: Arc<DiscoveryPublisher>, topics: TopicScheme) -> Self {
        Self {
            kind: EntityKind::TxBytes,
            discovery,
            topics,
        }
    }
}

#[async_trait]
impl Entity for TrafficSensor {
    fn kind(&self) -> EntityKind {
        self.kind
    }

    async fn send_discovery(&self, client: &Client) -> Result<(), CoreError> {
        self.discovery
            .send_sensor(
                &self.state_topic(client),
                &client.name,
                &entity_name(client, self.kind),
                BYTES,
            )
            .await
    }

    async fn consume(&self, _client: &Client, _payload: &str) -> Result<(), CoreError> {
        Ok(())
    }

    fn command_topic(&self, _client: &Client) -> Option<String> {
        None
    }

    fn state_topic(&self, client: &Client) -> String {
        self.topics.state(client, self.kind)
    }

    fn state(&self, client: &Client) -> Result<String, CoreError> {
        let bytes = match self.kind {
            EntityKind::TxBytes => client.tx_bytes,
            _ => client.rx_bytes,
        };
        Ok(bytes.to_string())
    }
}
