// ── Runtime bridge configuration ──
//
// These types describe *how* to reach the router and the broker and how
// Home Assistant entities are named. They carry credentials but never
// touch disk: the binary builds a `BridgeConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Router connection settings.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Router URL (e.g., `http://192.168.1.1`).
    pub url: Url,
    pub login: String,
    pub password: SecretString,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// MQTT broker settings.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    /// Username and password, when the broker requires them.
    pub credentials: Option<(String, SecretString)>,
    pub client_id: String,
    /// Prefix for state and command topics.
    pub base_topic: String,
    pub keep_alive: Duration,
}

/// Home Assistant integration settings.
#[derive(Debug, Clone)]
pub struct HomeAssistantConfig {
    /// How often the router is polled for device state.
    pub update_interval: Duration,
    /// How often the policy name list is refreshed.
    pub policy_refresh_interval: Duration,
    /// MACs allowed to be exposed. Compared case-insensitively.
    pub whitelist: Vec<String>,
    /// Prefix for discovery object ids and device identifiers.
    pub device_id: String,
    pub discovery_prefix: String,
}

impl Default for HomeAssistantConfig {
    fn default() -> Self {
        Self {
            update_interval: Duration::from_secs(30),
            policy_refresh_interval: Duration::from_secs(10),
            whitelist: Vec::new(),
            device_id: "keenmqtt_".into(),
            discovery_prefix: "homeassistant".into(),
        }
    }
}

/// Everything the bridge needs to run.
///
/// Built by the binary from the config crate; core never reads files.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub router: RouterConfig,
    pub mqtt: MqttConfig,
    pub homeassistant: HomeAssistantConfig,
}
