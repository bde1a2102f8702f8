//! Clap derive structures for the `keenmqtt` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// keenmqtt -- expose Keenetic router clients to Home Assistant over MQTT
#[derive(Debug, Parser)]
#[command(
    name = "keenmqtt",
    version,
    about = "Bridge Keenetic router clients to MQTT",
    long_about = "Polls a Keenetic router for connected clients and publishes their\n\
        access policy, internet permit and traffic counters as Home Assistant\n\
        entities. Policy and permit changes made in Home Assistant are pushed\n\
        back to the router."
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, short = 'c', env = "KEENMQTT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv); overrides `log_level`
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format; overrides `log_format`
    #[arg(long, env = "KEENMQTT_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// Parse the `log_format` config value; anything but `json` is text.
    pub fn from_config(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}
