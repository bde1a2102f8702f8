// Hotspot host endpoints
//
// Device listing via show/ip/hotspot/host, per-device access settings via
// show/rc/ip/hotspot/host, and mutation of policy/permit via ip/hotspot/host.

use serde_json::json;
use tracing::debug;

use crate::client::RouterClient;
use crate::error::Error;
use crate::models::{Host, HostPolicy};

impl RouterClient {
    /// List every device the router has seen.
    ///
    /// `GET /rci/show/ip/hotspot/host`
    pub async fn list_hosts(&self) -> Result<Vec<Host>, Error> {
        let url = self.rci_url("show/ip/hotspot/host")?;
        debug!("listing hotspot hosts");
        self.get(url).await
    }

    /// List the configured policy and permit of each registered device.
    ///
    /// `GET /rci/show/rc/ip/hotspot/host`
    pub async fn list_host_policies(&self) -> Result<Vec<HostPolicy>, Error> {
        let url = self.rci_url("show/rc/ip/hotspot/host")?;
        debug!("listing hotspot host policies");
        self.get(url).await
    }

    /// Assign a policy to a device, or clear it with `None`.
    ///
    /// `POST /rci/ip/hotspot/host` with `{"mac": "...", "policy": "name"}`
    /// or `{"mac": "...", "policy": false}`
    pub async fn set_policy(&self, mac: &str, policy: Option<&str>) -> Result<(), Error> {
        let url = self.rci_url("ip/hotspot/host")?;
        debug!(mac, policy = policy.unwrap_or("<none>"), "setting host policy");

        let body = match policy {
            Some(name) => json!({ "mac": mac, "policy": name }),
            None => json!({ "mac": mac, "policy": false }),
        };
        self.post_command(url, &body).await
    }

    /// Allow or deny internet access for a device.
    ///
    /// `POST /rci/ip/hotspot/host` with `{"mac": "...", "permit": true}`
    /// or `{"mac": "...", "deny": true}`
    pub async fn set_permit(&self, mac: &str, permit: bool) -> Result<(), Error> {
        let url = self.rci_url("ip/hotspot/host")?;
        debug!(mac, permit, "setting host permit");

        let body = if permit {
            json!({ "mac": mac, "permit": true })
        } else {
            json!({ "mac": mac, "deny": true })
        };
        self.post_command(url, &body).await
    }
}
