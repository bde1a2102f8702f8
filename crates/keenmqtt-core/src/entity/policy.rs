use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::{Entity, EntityKind, TopicScheme, entity_name};
use crate::discovery::DiscoveryPublisher;
use crate::error::CoreError;
use crate::model::{Client, NONE_POLICY};
use crate::policy_cache::PolicyCache;
use crate::router::RouterApi;

/// Access policy exposed as a Home Assistant `select`.
pub struct PolicySelect {
    router: Arc<dyn RouterApi>,
    policies: Arc<PolicyCache>,
    discovery: Arc<DiscoveryPublisher>,
    topics: TopicScheme,
}

impl PolicySelect {
    pub fn new(
        router: Arc<dyn RouterApi>,
        policies: Arc<PolicyCache>,
        discovery: Arc<DiscoveryPublisher>,
        topics: TopicScheme,
    ) -> Self {
        Self {
            router,
            policies,
            discovery,
            topics,
        }
    }
}

#[async_trait]
impl Entity for PolicySelect {
    fn kind(&self) -> EntityKind {
        EntityKind::Policy
    }

    async fn send_discovery(&self, client: &Client) -> Result<(), CoreError> {
        let options = self.policies.policy_list().await;
        self.discovery
            .send_select(
                &self.topics.command(client, EntityKind::Policy),
                &self.state_topic(client),
                &client.name,
                &entity_name(client, EntityKind::Policy),
                &options,
            )
            .await
    }

    async fn consume(&self, client: &Client, payload: &str) -> Result<(), CoreError> {
        let policy = payload.trim();
        // A policy created on the router since the last refresh is picked
        // up here instead of waiting for the refresh task.
        if !self.policies.contains(policy).await
            && (self.policies.refresh().await.is_err() || !self.policies.contains(policy).await)
        {
            return Err(CoreError::InvalidCommand {
                kind: EntityKind::Policy,
                payload: payload.to_owned(),
            });
        }

        let target = (policy != NONE_POLICY).then_some(policy);
        self.router
            .set_policy(&client.mac, target)
            .await
            .map_err(|e| CoreError::consume(EntityKind::Policy, &client.mac, e))?;

        info!(mac = %client.mac, policy, "policy updated");
        Ok(())
    }

    fn command_topic(&self, client: &Client) -> Option<String> {
        Some(self.topics.command(client, EntityKind::Policy))
    }

    fn state_topic(&self, client: &Client) -> String {
        self.topics.state(client, EntityKind::Policy)
    }

    fn state(&self, client: &Client) -> Result<String, CoreError> {
        Ok(client.policy.clone())
    }
}
