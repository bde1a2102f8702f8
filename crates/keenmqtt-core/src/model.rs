// ── Bridge data model ──

/// Reserved policy name meaning "no policy assigned".
///
/// Always the first entry of the policy option list.
pub const NONE_POLICY: &str = "none";

/// A router device as exposed to MQTT.
///
/// Rebuilt every poll cycle from the router's host and host-policy lists.
/// The MAC address is the identity; everything else is a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Client {
    pub mac: String,
    pub name: String,
    pub policy: String,
    pub permit: bool,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

impl Client {
    /// MAC rendered for use inside a topic level (`aa:bb` → `aa_bb`).
    pub fn topic_id(&self) -> String {
        self.mac.replace(':', "_")
    }
}
