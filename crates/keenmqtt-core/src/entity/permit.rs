use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{Entity, EntityKind, TopicScheme, entity_name};
use crate::discovery::DiscoveryPublisher;
use crate::error::CoreError;
use crate::model::Client;
use crate::router::RouterApi;

const ON: &str = "ON";
const OFF: &str = "OFF";

/// Internet permit exposed as a Home Assistant `switch`.
pub struct PermitSwitch {
    router: Arc<dyn RouterApi>,
    discovery: Arc<DiscoveryPublisher>,
    topics: TopicScheme,
}

impl PermitSwitch {
    pub fn new(
        router: Arc<dyn RouterApi>,
        discovery: Arc<DiscoveryPublisher>,
        topics: TopicScheme,
    ) -> Self {
        Self {
            router,
            discovery,
            topics,
        }
    }
}

#[async_trait]
impl Entity for PermitSwitch {
    fn kind(&self) -> EntityKind {
        EntityKind::Permit
    }

    async fn send_discovery(&self, client: &Client) -> Result<(), CoreError> {
        self.discovery
            .send_switch(
                &self.topics.command(client, EntityKind::Permit),
                &self.state_topic(client),
                &client.name,
                &entity_name(client, EntityKind::Permit),
            )
            .await
    }

    async fn consume(&self, client: &Client, payload: &str) -> Result<(), CoreError> {
        // Only an explicit OFF denies access.
        let permit = payload.trim() != OFF;

        self.router
            .set_permit(&client.mac, permit)
            .await
            .map_err(|e| CoreError::consume(EntityKind::Permit, &client.mac, e))?;

        info!(mac = %client.mac, permit, "permit updated");
        Ok(())
    }

    fn command_topic(&self, client: &Client) -> Option<String> {
        Some(self.topics.command(client, EntityKind::Permit))
    }

    fn state_topic(&self, client: &Client) -> String {
        self.topics.state(client, EntityKind::Permit)
    }

    fn state(&self, client: &Client) -> Result<String, CoreError> {
        Ok(if client.permit { ON } else { OFF }.to_owned())
    }
}
