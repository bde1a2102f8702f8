// ── Client list resolution ──
//
// Joins the router's host list with its per-host access settings and
// keeps only allow-listed MACs.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use keenmqtt_api::HostPolicy;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Client, NONE_POLICY};
use crate::router::RouterApi;

/// Source of the current client set for one poll cycle.
#[async_trait]
pub trait ClientSource: Send + Sync {
    async fn client_list(&self) -> Result<Vec<Client>, CoreError>;
}

/// Builds [`Client`] records from router data.
pub struct ClientListResolver {
    router: Arc<dyn RouterApi>,
    allowed: HashSet<String>,
}

impl ClientListResolver {
    pub fn new(router: Arc<dyn RouterApi>, whitelist: &[String]) -> Self {
        Self {
            router,
            allowed: whitelist.iter().map(|mac| mac.to_ascii_lowercase()).collect(),
        }
    }

    pub fn is_allowed(&self, mac: &str) -> bool {
        self.allowed.contains(&mac.to_ascii_lowercase())
    }
}

#[async_trait]
impl ClientSource for ClientListResolver {
    async fn client_list(&self) -> Result<Vec<Client>, CoreError> {
        let (hosts, host_policies) = tokio::try_join!(
            async {
                self.router
                    .hosts()
                    .await
                    .map_err(|e| CoreError::fetch("hosts", e))
            },
            async {
                self.router
                    .host_policies()
                    .await
                    .map_err(|e| CoreError::fetch("host policies", e))
            },
        )?;

        let mut by_mac: HashMap<String, HostPolicy> = host_policies
            .into_iter()
            .map(|p| (p.mac.to_ascii_lowercase(), p))
            .collect();

        let clients: Vec<Client> = hosts
            .into_iter()
            .filter(|host| self.is_allowed(&host.mac))
            .map(|host| {
                let access = by_mac.remove(&host.mac.to_ascii_lowercase());
                let (policy, permit) = match access {
                    Some(HostPolicy { policy, permit, .. }) => (
                        policy.filter(|p| !p.is_empty()),
                        permit,
                    ),
                    None => (None, false),
                };

                Client {
                    mac: host.mac,
                    name: host.name,
                    policy: policy.unwrap_or_else(|| NONE_POLICY.to_owned()),
                    permit,
                    rx_bytes: host.rx_bytes,
                    tx_bytes: host.tx_bytes,
                }
            })
            .collect();

        debug!(count = clients.len(), "resolved client list");
        Ok(clients)
    }
}
