mod cli;
mod error;

use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use keenmqtt_config::{Config, load_config, resolve_config_path};
use keenmqtt_core::entity::default_entities;
use keenmqtt_core::router::connect_router;
use keenmqtt_core::{
    BridgeConfig, Broker, ClientListResolver, DiscoveryPublisher, EntityManager, MqttClient,
    PolicyCache, RouterApi, TopicScheme,
};

use crate::cli::{Cli, LogFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, config: &Config, format: Option<LogFormat>) {
    // RUST_LOG wins, then -v, then the configured level.
    let fallback = match verbosity {
        0 => config.log_directive(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match format.unwrap_or_else(|| LogFormat::from_config(&config.log_format)) {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let path = resolve_config_path(cli.config.as_deref());
    let config = load_config(&path).map_err(|e| CliError::from_config(e, &path))?;

    init_tracing(cli.verbose, &config, cli.log_format);
    info!(path = %path.display(), version = env!("CARGO_PKG_VERSION"), "starting keenmqtt");

    let bridge = config
        .to_bridge_config()
        .map_err(|e| CliError::from_config(e, &path))?;
    serve(&bridge, &path).await
}

/// Wire the bridge together and run it until a shutdown signal arrives.
async fn serve(config: &BridgeConfig, path: &Path) -> Result<(), CliError> {
    let ha = &config.homeassistant;
    if ha.whitelist.is_empty() {
        warn!(
            path = %path.display(),
            "homeassistant.whitelist is empty, no devices will be exposed"
        );
    }

    let cancel = CancellationToken::new();

    let router: Arc<dyn RouterApi> = Arc::new(connect_router(&config.router)?);
    info!(url = %config.router.url, "router client ready");

    let (mqtt, mqtt_task) = MqttClient::connect(&config.mqtt, cancel.child_token());
    let mqtt = Arc::new(mqtt);
    let broker: Arc<dyn Broker> = Arc::<MqttClient>::clone(&mqtt);

    let policies = Arc::new(PolicyCache::new(Arc::clone(&router)));
    // Prime the cache so the first discovery carries the real options.
    // A failure is logged and the refresh task retries.
    let _ = policies.refresh().await;
    let policy_task = policies.spawn_refresh(ha.policy_refresh_interval, cancel.child_token());

    let discovery = Arc::new(DiscoveryPublisher::new(
        Arc::clone(&broker),
        ha.discovery_prefix.clone(),
        ha.device_id.clone(),
    ));
    let topics = TopicScheme::new(config.mqtt.base_topic.clone());
    let entities = default_entities(&router, &policies, &discovery, &topics);
    let source = Arc::new(ClientListResolver::new(Arc::clone(&router), &ha.whitelist));

    let manager = EntityManager::new(source, broker, entities);
    let handle = manager.start(ha.update_interval);

    shutdown_signal().await;
    info!("shutting down");

    handle.shutdown().await;
    mqtt.disconnect().await;
    cancel.cancel();

    let (policy_result, mqtt_result) = tokio::join!(policy_task, mqtt_task);
    for result in [policy_result, mqtt_result] {
        if let Err(e) = result {
            error!(error = %e, "background task panicked");
        }
    }

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => debug!("received Ctrl-C"),
        () = terminate => debug!("received SIGTERM"),
    }
}
