// keenmqtt-core: Entity manager bridging Keenetic router state to MQTT.

pub mod client_list;
pub mod config;
pub mod discovery;
pub mod entity;
pub mod error;
pub mod manager;
pub mod model;
pub mod mqtt;
pub mod policy_cache;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client_list::{ClientListResolver, ClientSource};
pub use config::{BridgeConfig, HomeAssistantConfig, MqttConfig, RouterConfig};
pub use discovery::DiscoveryPublisher;
pub use entity::{Entity, EntityKind, TopicScheme};
pub use error::CoreError;
pub use manager::{EntityManager, ManagerHandle};
pub use model::{Client, NONE_POLICY};
pub use mqtt::{Broker, MqttClient};
pub use policy_cache::PolicyCache;
pub use router::RouterApi;
