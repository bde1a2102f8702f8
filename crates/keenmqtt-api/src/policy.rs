// Access policy endpoints

use std::collections::BTreeMap;

use tracing::debug;

use crate::client::RouterClient;
use crate::error::Error;
use crate::models::Policy;

impl RouterClient {
    /// List configured access policies keyed by name.
    ///
    /// `GET /rci/show/rc/ip/policy`
    pub async fn list_policies(&self) -> Result<BTreeMap<String, Policy>, Error> {
        let url = self.rci_url("show/rc/ip/policy")?;
        debug!("listing access policies");
        self.get(url).await
    }
}
