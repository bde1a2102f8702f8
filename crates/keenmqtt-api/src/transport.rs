// Shared transport configuration for building reqwest::Client instances.
//
// The router keeps its session in a cookie, so every client gets a jar.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;

use crate::error::Error;

/// Content type the RCI endpoints expect on every request.
pub const RCI_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// A fresh cookie jar is attached when the config carries none.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let jar = self
            .cookie_jar
            .clone()
            .unwrap_or_else(|| Arc::new(Jar::default()));

        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("keenmqtt/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(jar)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }

    /// Create a config with a fresh cookie jar.
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
