// ── Core error types ──
//
// Errors surfaced by the bridge. Router transport failures arrive as
// `keenmqtt_api::Error` and are translated by the `From` impl; the
// poll cycle and command consumers then wrap them with context.

use thiserror::Error;

use crate::entity::EntityKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Router errors ────────────────────────────────────────────────
    #[error("Cannot connect to router at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Router authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Router request timed out")]
    Timeout,

    #[error("Router API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    /// A read needed by the poll cycle failed; nothing was published.
    #[error("Failed to fetch {resource}: {source}")]
    Fetch {
        resource: &'static str,
        #[source]
        source: Box<CoreError>,
    },

    // ── Command errors ───────────────────────────────────────────────
    #[error("Failed to apply {kind} command for {mac}: {source}")]
    Consume {
        kind: EntityKind,
        mac: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error("Invalid {kind} command payload: {payload:?}")]
    InvalidCommand { kind: EntityKind, payload: String },

    // ── MQTT errors ──────────────────────────────────────────────────
    #[error("Failed to send discovery for {entity}: {message}")]
    Discovery { entity: String, message: String },

    #[error("Failed to publish to {topic}: {message}")]
    Publish { topic: String, message: String },

    #[error("Failed to subscribe to {topic}: {message}")]
    Subscribe { topic: String, message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn fetch(resource: &'static str, source: CoreError) -> Self {
        Self::Fetch {
            resource,
            source: Box::new(source),
        }
    }

    pub(crate) fn consume(kind: EntityKind, mac: &str, source: CoreError) -> Self {
        Self::Consume {
            kind,
            mac: mac.to_owned(),
            source: Box::new(source),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<keenmqtt_api::Error> for CoreError {
    fn from(err: keenmqtt_api::Error) -> Self {
        match err {
            keenmqtt_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            keenmqtt_api::Error::Unauthorized => CoreError::AuthenticationFailed {
                message: "router rejected the session after re-authentication".into(),
            },
            keenmqtt_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            keenmqtt_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            keenmqtt_api::Error::ClientBuild(message) => CoreError::Config { message },
            keenmqtt_api::Error::Http { status, endpoint } => CoreError::Api {
                message: format!("HTTP {status} from {endpoint}"),
                status: Some(status),
            },
            keenmqtt_api::Error::EmptyStatus { endpoint } => CoreError::Api {
                message: format!("empty status response from {endpoint}"),
                status: None,
            },
            keenmqtt_api::Error::Rejected { message, .. } => CoreError::Api {
                message,
                status: None,
            },
            keenmqtt_api::Error::Deserialization { message, body: _ } => CoreError::Api {
                message: format!("Deserialization error: {message}"),
                status: None,
            },
        }
    }
}
