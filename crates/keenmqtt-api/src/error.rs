use thiserror::Error;

/// Top-level error type for the `keenmqtt-api` crate.
///
/// Covers every failure mode of the RCI client: challenge authentication,
/// transport, HTTP status handling, and response decoding.
/// `keenmqtt-core` maps these into its own error kinds.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The challenge handshake failed (bad credentials, missing headers, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The router still answered 401 after a fresh authentication.
    #[error("Unauthorized -- router rejected the session after re-authentication")]
    Unauthorized,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    // ── RCI ─────────────────────────────────────────────────────────
    /// Unexpected HTTP status from an RCI endpoint.
    #[error("HTTP {status} from {endpoint}")]
    Http { status: u16, endpoint: String },

    /// A mutation endpoint answered with an empty status object.
    #[error("Empty status response from {endpoint}")]
    EmptyStatus { endpoint: String },

    /// The command processor reported an `error` status line.
    #[error("Router rejected command on {endpoint}: {message}")]
    Rejected { endpoint: String, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}
