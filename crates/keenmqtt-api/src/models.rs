// RCI response and request types
//
// Models for the Keenetic RCI JSON API. Fields use `#[serde(default)]`
// liberally because firmware releases disagree about field presence.

use serde::{Deserialize, Serialize};

// ── Hosts ────────────────────────────────────────────────────────────

/// Registered device from `show/ip/hotspot/host`.
///
/// The router reports radio and shaping details too; we model the fields the
/// bridge needs and let the rest fall into `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Host {
    pub mac: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub via: String,
    #[serde(default)]
    pub registered: bool,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub access: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub ssid: String,
    #[serde(default, rename = "rxbytes")]
    pub rx_bytes: u64,
    #[serde(default, rename = "txbytes")]
    pub tx_bytes: u64,
    #[serde(default)]
    pub uptime: u64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Per-device access configuration from `show/rc/ip/hotspot/host`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPolicy {
    pub mac: String,
    #[serde(default)]
    pub access: String,
    /// Assigned policy name; absent when the device has none.
    #[serde(default)]
    pub policy: Option<String>,
    #[serde(default)]
    pub permit: bool,
    #[serde(default)]
    pub priority: i32,
}

// ── Policies ─────────────────────────────────────────────────────────

/// Access policy from `show/rc/ip/policy`, keyed by name in the response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permit: Vec<PolicyPermit>,
}

/// Interface the policy routes through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyPermit {
    #[serde(default)]
    pub interface: String,
    #[serde(default)]
    pub enabled: bool,
}

// ── Mutation status ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusEnvelope {
    #[serde(default)]
    pub status: Vec<StatusEntry>,
}

/// A single status line reported by the RCI command processor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusEntry {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub ident: String,
    #[serde(default)]
    pub message: String,
}

impl StatusEntry {
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }
}
