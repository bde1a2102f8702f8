// ── Router access seam ──
//
// The bridge talks to the router only through `RouterApi`, so the poll
// cycle and entities can run against in-memory fakes.

use async_trait::async_trait;
use keenmqtt_api::transport::TransportConfig;
use keenmqtt_api::{Credentials, Host, HostPolicy, RouterClient};
use tracing::debug;

use crate::config::RouterConfig;
use crate::error::CoreError;

/// Router operations the bridge depends on.
#[async_trait]
pub trait RouterApi: Send + Sync {
    async fn hosts(&self) -> Result<Vec<Host>, CoreError>;

    async fn host_policies(&self) -> Result<Vec<HostPolicy>, CoreError>;

    /// Names of the configured access policies, in router order.
    async fn policy_names(&self) -> Result<Vec<String>, CoreError>;

    /// Assign `policy`, or clear the assignment when `None`.
    async fn set_policy(&self, mac: &str, policy: Option<&str>) -> Result<(), CoreError>;

    async fn set_permit(&self, mac: &str, permit: bool) -> Result<(), CoreError>;
}

#[async_trait]
impl RouterApi for RouterClient {
    async fn hosts(&self) -> Result<Vec<Host>, CoreError> {
        Ok(self.list_hosts().await?)
    }

    async fn host_policies(&self) -> Result<Vec<HostPolicy>, CoreError> {
        Ok(self.list_host_policies().await?)
    }

    async fn policy_names(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.list_policies().await?.into_keys().collect())
    }

    async fn set_policy(&self, mac: &str, policy: Option<&str>) -> Result<(), CoreError> {
        Ok(RouterClient::set_policy(self, mac, policy).await?)
    }

    async fn set_permit(&self, mac: &str, permit: bool) -> Result<(), CoreError> {
        Ok(RouterClient::set_permit(self, mac, permit).await?)
    }
}

/// Build a [`RouterClient`] from the runtime router configuration.
pub fn connect_router(config: &RouterConfig) -> Result<RouterClient, CoreError> {
    let transport = TransportConfig::default()
        .with_timeout(config.timeout)
        .with_cookie_jar();
    let credentials = Credentials::new(config.login.clone(), config.password.clone());

    debug!(url = %config.url, "building router client");
    Ok(RouterClient::new(config.url.clone(), credentials, &transport)?)
}
