//! Startup errors with miette diagnostics.
//!
//! Only startup can fail the process; once the bridge runs, errors are
//! logged and retried on the next cycle.

use miette::Diagnostic;
use thiserror::Error;

use keenmqtt_config::ConfigError;
use keenmqtt_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(
        code(keenmqtt::validation),
        help("Fix the value in {path} or the matching KEENMQTT_ environment variable.")
    )]
    Validation {
        field: String,
        reason: String,
        path: String,
    },

    #[error("No password configured for the {section}")]
    #[diagnostic(
        code(keenmqtt::no_credentials),
        help(
            "Set `password` under [{section}] in {path}\n\
             or export KEENMQTT_ROUTER__PASSWORD."
        )
    )]
    NoCredentials { section: String, path: String },

    #[error("Could not load configuration from {path}")]
    #[diagnostic(code(keenmqtt::config), help("{reason}"))]
    Config { path: String, reason: String },

    // ── Router ───────────────────────────────────────────────────────
    #[error("Could not set up the router client for {url}")]
    #[diagnostic(
        code(keenmqtt::connection_failed),
        help("Check [router].url; RCI is usually served at http://192.168.1.1.\n{reason}")
    )]
    ConnectionFailed { url: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(keenmqtt::core))]
    Core(CoreError),
}

impl CliError {
    /// Attach the config file path to a configuration error.
    pub fn from_config(err: ConfigError, path: &std::path::Path) -> Self {
        let path = path.display().to_string();
        match err {
            ConfigError::Validation { field, reason } => Self::Validation {
                field,
                reason,
                path,
            },
            ConfigError::NoCredentials { section } => Self::NoCredentials { section, path },
            ConfigError::Figment(e) => Self::Config {
                path,
                reason: e.to_string(),
            },
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::Config { .. } => exit_code::USAGE,
            Self::NoCredentials { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Core(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Config { message } => Self::ConnectionFailed {
                url: "[router].url".into(),
                reason: message,
            },
            other => Self::Core(other),
        }
    }
}
