// RCI HTTP client
//
// Wraps `reqwest::Client` with router URL construction, transparent
// re-authentication on 401, and response decoding. Endpoint groups
// (hotspot hosts, policies) are implemented as inherent methods in
// separate files to keep this module focused on transport mechanics.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::models::{StatusEntry, StatusEnvelope};
use crate::transport::{RCI_CONTENT_TYPE, TransportConfig};

/// HTTP client for the Keenetic RCI API.
///
/// Requests are sent with the session cookie held in the client's jar. A
/// `401` triggers one challenge/response login followed by a single retry;
/// a second `401` surfaces as [`Error::Unauthorized`].
pub struct RouterClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    auth_lock: Mutex<()>,
}

impl RouterClient {
    /// Create a new router client from a `TransportConfig`.
    ///
    /// The `base_url` is the router root (e.g. `http://192.168.1.1`).
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a router client with a pre-built `reqwest::Client`.
    ///
    /// The client must carry a cookie store, otherwise every request
    /// re-authenticates.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            auth_lock: Mutex::new(()),
        }
    }

    /// The router base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub(crate) fn auth_lock(&self) -> &Mutex<()> {
        &self.auth_lock
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for an RCI path: `{base}/rci/{path}`.
    pub(crate) fn rci_url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("/rci/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let resp = self.send(Method::GET, url, None).await?;
        Self::parse_json(resp).await
    }

    /// Send a POST request to a mutation endpoint and check its status body.
    ///
    /// The router answers mutations with `{ "<node>": { "status": [...] } }`;
    /// an empty object means the command was not applied.
    pub(crate) async fn post_command(
        &self,
        url: Url,
        body: &serde_json::Value,
    ) -> Result<(), Error> {
        let endpoint = url.path().to_owned();
        let resp = self.send(Method::POST, url, Some(body)).await?;
        let status: serde_json::Map<String, serde_json::Value> = Self::parse_json(resp).await?;

        if status.is_empty() {
            return Err(Error::EmptyStatus { endpoint });
        }

        let rejection = status
            .values()
            .filter_map(|v| serde_json::from_value::<StatusEnvelope>(v.clone()).ok())
            .flat_map(|envelope| envelope.status)
            .find(StatusEntry::is_error);

        match rejection {
            Some(entry) => Err(Error::Rejected {
                endpoint,
                message: entry.message,
            }),
            None => Ok(()),
        }
    }

    /// Send a request, re-authenticating and retrying once on `401`.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, Error> {
        let resp = self.send_once(method.clone(), url.clone(), body).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return Self::check_status(resp);
        }

        debug!("session rejected, re-authenticating");
        self.authenticate().await?;

        let resp = self.send_once(method, url, body).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            warn!("router rejected request after re-authentication");
            return Err(Error::Unauthorized);
        }
        Self::check_status(resp)
    }

    async fn send_once(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, Error> {
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, RCI_CONTENT_TYPE);
        if let Some(body) = body {
            request = request.json(body);
        }

        request.send().await.map_err(Error::Transport)
    }

    fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(resp)
        } else {
            Err(Error::Http {
                status: status.as_u16(),
                endpoint: resp.url().path().to_owned(),
            })
        }
    }

    async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await.map_err(Error::Transport)?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
