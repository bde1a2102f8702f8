// ── Entities ──
//
// One entity per publishable device attribute. Each kind knows its own
// topics, how to render state, and how to apply a command.

mod permit;
mod policy;
mod traffic;

use std::sync::Arc;

use async_trait::async_trait;
use strum::{AsRefStr, Display, EnumIter};

use crate::discovery::DiscoveryPublisher;
use crate::error::CoreError;
use crate::model::Client;
use crate::policy_cache::PolicyCache;
use crate::router::RouterApi;

pub use permit::PermitSwitch;
pub use policy::PolicySelect;
pub use traffic::TrafficSensor;

/// The attribute an entity exposes. The lowercase name is used in topics
/// and entity names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum EntityKind {
    Policy,
    Permit,
    RxBytes,
    TxBytes,
}

/// A publishable, optionally controllable device attribute.
#[async_trait]
pub trait Entity: Send + Sync {
    fn kind(&self) -> EntityKind;

    /// Announce this entity for `client` to Home Assistant.
    async fn send_discovery(&self, client: &Client) -> Result<(), CoreError>;

    /// Apply a command payload received on the command topic.
    async fn consume(&self, client: &Client, payload: &str) -> Result<(), CoreError>;

    /// `None` for read-only entities.
    fn command_topic(&self, client: &Client) -> Option<String>;

    fn state_topic(&self, client: &Client) -> String;

    fn state(&self, client: &Client) -> Result<String, CoreError>;
}

/// Topic naming: `{base}/{mac}_{kind}/{state|command}` with `:` in the MAC
/// replaced by `_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    base_topic: String,
}

impl TopicScheme {
    pub fn new(base_topic: impl Into<String>) -> Self {
        let base_topic: String = base_topic.into();
        Self {
            base_topic: base_topic.trim_end_matches('/').to_owned(),
        }
    }

    pub fn state(&self, client: &Client, kind: EntityKind) -> String {
        format!("{}/{}_{}/state", self.base_topic, client.topic_id(), kind)
    }

    pub fn command(&self, client: &Client, kind: EntityKind) -> String {
        format!("{}/{}_{}/command", self.base_topic, client.topic_id(), kind)
    }
}

/// Display name used in discovery: `{client name}_{kind}`.
pub fn entity_name(client: &Client, kind: EntityKind) -> String {
    format!("{}_{}", client.name, kind)
}

/// The full entity set exposed for every client: policy select, permit
/// switch, then the rx/tx byte sensors.
pub fn default_entities(
    router: &Arc<dyn RouterApi>,
    policies: &Arc<PolicyCache>,
    discovery: &Arc<DiscoveryPublisher>,
    topics: &TopicScheme,
) -> Vec<Arc<dyn Entity>> {
    vec![
        Arc::new(PolicySelect::new(
            Arc::clone(router),
            Arc::clone(policies),
            Arc::clone(discovery),
            topics.clone(),
        )),
        Arc::new(PermitSwitch::new(
            Arc::clone(router),
            Arc::clone(discovery),
            topics.clone(),
        )),
        Arc::new(TrafficSensor::rx(Arc::clone(discovery), topics.clone())),
        Arc::new(TrafficSensor::tx(Arc::clone(discovery), topics.clone())),
    ]
}
