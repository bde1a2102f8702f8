//! Configuration for the keenmqtt bridge.
//!
//! TOML file + `KEENMQTT_` environment overrides, validation, and
//! translation to `keenmqtt_core::BridgeConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use keenmqtt_core::{BridgeConfig, HomeAssistantConfig, MqttConfig, RouterConfig};

/// Prefix for environment overrides; `__` separates nested keys
/// (e.g. `KEENMQTT_MQTT__HOST`).
pub const ENV_PREFIX: &str = "KEENMQTT_";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "warning", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];
/// rumqttc refuses keep-alive intervals shorter than this.
const MIN_KEEP_ALIVE_SECS: u64 = 5;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for the {section}")]
    NoCredentials { section: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub router: RouterSection,

    #[serde(default)]
    pub mqtt: MqttSection,

    #[serde(default)]
    pub homeassistant: HomeAssistantSection,

    /// `trace`, `debug`, `info`, `warn`/`warning`, or `error`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `text` or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            router: RouterSection::default(),
            mqtt: MqttSection::default(),
            homeassistant: HomeAssistantSection::default(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "text".into()
}

/// `[router]`: Keenetic RCI endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouterSection {
    #[serde(default = "default_router_url")]
    pub url: String,

    #[serde(default = "default_router_login")]
    pub login: String,

    /// Plaintext password; prefer `KEENMQTT_ROUTER__PASSWORD`.
    pub password: Option<String>,

    #[serde(default = "default_router_timeout")]
    pub timeout_secs: u64,
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            url: default_router_url(),
            login: default_router_login(),
            password: None,
            timeout_secs: default_router_timeout(),
        }
    }
}

fn default_router_url() -> String {
    "http://192.168.1.1".into()
}
fn default_router_login() -> String {
    "admin".into()
}
fn default_router_timeout() -> u64 {
    10
}

/// `[mqtt]`: broker connection and topic root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MqttSection {
    #[serde(default = "default_mqtt_host")]
    pub host: String,

    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    pub login: Option<String>,

    pub password: Option<String>,

    #[serde(default = "default_client_id")]
    pub client_id: String,

    #[serde(default = "default_base_topic")]
    pub base_topic: String,

    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            login: None,
            password: None,
            client_id: default_client_id(),
            base_topic: default_base_topic(),
            keep_alive_secs: default_keep_alive(),
        }
    }
}

fn default_mqtt_host() -> String {
    "localhost".into()
}
fn default_mqtt_port() -> u16 {
    1883
}
fn default_client_id() -> String {
    "keenmqtt".into()
}
fn default_base_topic() -> String {
    "keenetic".into()
}
fn default_keep_alive() -> u64 {
    30
}

/// `[homeassistant]`: polling cadence, allow-list and discovery naming.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HomeAssistantSection {
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,

    #[serde(default = "default_policy_refresh")]
    pub policy_refresh_interval_secs: u64,

    /// MAC addresses to expose. Empty exposes nothing.
    #[serde(default)]
    pub whitelist: Vec<String>,

    #[serde(default = "default_device_id")]
    pub device_id: String,

    #[serde(default = "default_discovery_prefix")]
    pub discovery_prefix: String,
}

impl Default for HomeAssistantSection {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval(),
            policy_refresh_interval_secs: default_policy_refresh(),
            whitelist: Vec::new(),
            device_id: default_device_id(),
            discovery_prefix: default_discovery_prefix(),
        }
    }
}

fn default_update_interval() -> u64 {
    30
}
fn default_policy_refresh() -> u64 {
    10
}
fn default_device_id() -> String {
    "keenmqtt_".into()
}
fn default_discovery_prefix() -> String {
    "homeassistant".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Platform config location (e.g. `~/.config/keenmqtt/config.toml`).
pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "keenmqtt").map_or_else(
        || PathBuf::from("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Pick the config file: an explicit path wins, then `./config.toml`,
/// then the platform location.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from("config.toml");
    if local.is_file() { local } else { config_path() }
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults, then the TOML file (if present), then the environment.
pub fn config_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load and validate the configuration.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    Config::from_figment(&config_figment(path))
}

impl Config {
    /// Extract and validate a config from any figment.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.router.url)
            .map_err(|e| invalid("router.url", format!("{e}: {}", self.router.url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("router.url", "expected an http:// or https:// URL"));
        }
        if self.router.login.trim().is_empty() {
            return Err(invalid("router.login", "must not be empty"));
        }
        if self.router.timeout_secs == 0 {
            return Err(invalid("router.timeout_secs", "must be greater than zero"));
        }

        if self.mqtt.host.trim().is_empty() {
            return Err(invalid("mqtt.host", "must not be empty"));
        }
        if self.mqtt.port == 0 {
            return Err(invalid("mqtt.port", "must not be zero"));
        }
        if self.mqtt.client_id.trim().is_empty() {
            return Err(invalid("mqtt.client_id", "must not be empty"));
        }
        if self.mqtt.base_topic.trim_matches('/').is_empty() {
            return Err(invalid("mqtt.base_topic", "must not be empty"));
        }
        if self.mqtt.base_topic.contains(['+', '#']) {
            return Err(invalid("mqtt.base_topic", "must not contain MQTT wildcards"));
        }
        if self.mqtt.keep_alive_secs < MIN_KEEP_ALIVE_SECS {
            return Err(invalid(
                "mqtt.keep_alive_secs",
                format!("must be at least {MIN_KEEP_ALIVE_SECS}"),
            ));
        }

        let ha = &self.homeassistant;
        if ha.update_interval_secs == 0 {
            return Err(invalid("homeassistant.update_interval_secs", "must be greater than zero"));
        }
        if ha.policy_refresh_interval_secs == 0 {
            return Err(invalid(
                "homeassistant.policy_refresh_interval_secs",
                "must be greater than zero",
            ));
        }
        if ha.discovery_prefix.trim_matches('/').is_empty() {
            return Err(invalid("homeassistant.discovery_prefix", "must not be empty"));
        }

        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(invalid(
                "log_level",
                format!("expected one of {}, got '{}'", LOG_LEVELS.join(", "), self.log_level),
            ));
        }
        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(invalid(
                "log_format",
                format!("expected 'text' or 'json', got '{}'", self.log_format),
            ));
        }

        Ok(())
    }

    /// `tracing` filter directive for the configured level.
    pub fn log_directive(&self) -> &'static str {
        match self.log_level.to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "warn" | "warning" => "warn",
            "error" => "error",
            _ => "info",
        }
    }

    /// Translate into the runtime configuration consumed by core.
    pub fn to_bridge_config(&self) -> Result<BridgeConfig, ConfigError> {
        self.validate()?;

        let url = Url::parse(&self.router.url)
            .map_err(|e| invalid("router.url", e.to_string()))?;
        let password = self
            .router
            .password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ConfigError::NoCredentials {
                section: "router".into(),
            })?;

        let router = RouterConfig {
            url,
            login: self.router.login.clone(),
            password: SecretString::from(password),
            timeout: Duration::from_secs(self.router.timeout_secs),
        };

        let mqtt = MqttConfig {
            host: self.mqtt.host.clone(),
            port: self.mqtt.port,
            credentials: self.mqtt.login.clone().map(|login| {
                let password = self.mqtt.password.clone().unwrap_or_default();
                (login, SecretString::from(password))
            }),
            client_id: self.mqtt.client_id.clone(),
            base_topic: self.mqtt.base_topic.clone(),
            keep_alive: Duration::from_secs(self.mqtt.keep_alive_secs),
        };

        let ha = &self.homeassistant;
        let homeassistant = HomeAssistantConfig {
            update_interval: Duration::from_secs(ha.update_interval_secs),
            policy_refresh_interval: Duration::from_secs(ha.policy_refresh_interval_secs),
            whitelist: ha.whitelist.clone(),
            device_id: ha.device_id.clone(),
            discovery_prefix: ha.discovery_prefix.trim_matches('/').to_owned(),
        };

        Ok(BridgeConfig {
            router,
            mqtt,
            homeassistant,
        })
    }
}
