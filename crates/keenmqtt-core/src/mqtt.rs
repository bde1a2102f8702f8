// ── MQTT transport ──
//
// Publish/subscribe primitives over rumqttc. A single task drives the
// rumqttc event loop and routes incoming publishes to per-topic channels.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use secrecy::ExposeSecret;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::MqttConfig;
use crate::error::CoreError;

const REQUEST_CHANNEL_CAPACITY: usize = 64;
const COMMAND_CHANNEL_CAPACITY: usize = 16;
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Message broker operations the bridge depends on.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), CoreError>;

    /// Subscribe to an exact topic. Payloads arrive on the returned channel
    /// until the broker side shuts down.
    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<String>, CoreError>;
}

type Routes = Arc<DashMap<String, mpsc::Sender<String>>>;

/// [`Broker`] backed by a rumqttc `AsyncClient`.
pub struct MqttClient {
    client: AsyncClient,
    routes: Routes,
}

impl MqttClient {
    /// Create the client and spawn its event-loop task.
    ///
    /// The connection is established lazily by the event loop and
    /// re-established after errors until `cancel` fires.
    pub fn connect(config: &MqttConfig, cancel: CancellationToken) -> (Self, JoinHandle<()>) {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(config.keep_alive);
        if let Some((username, password)) = &config.credentials {
            options.set_credentials(username, password.expose_secret());
        }

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        let routes: Routes = Arc::new(DashMap::new());

        info!(host = %config.host, port = config.port, client_id = %config.client_id, "starting MQTT client");
        let handle = tokio::spawn(run_event_loop(
            event_loop,
            client.clone(),
            Arc::clone(&routes),
            cancel,
        ));

        (Self { client, routes }, handle)
    }

    /// Send a DISCONNECT to the broker. Best effort.
    pub async fn disconnect(&self) {
        if let Err(e) = self.client.disconnect().await {
            debug!(error = %e, "MQTT disconnect failed");
        }
    }
}

#[async_trait]
impl Broker for MqttClient {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), CoreError> {
        trace!(topic, retain, "publishing");
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await
            .map_err(|e| CoreError::Publish {
                topic: topic.to_owned(),
                message: e.to_string(),
            })
    }

    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<String>, CoreError> {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        self.routes.insert(topic.to_owned(), tx);

        if let Err(e) = self.client.subscribe(topic, QoS::AtLeastOnce).await {
            self.routes.remove(topic);
            return Err(CoreError::Subscribe {
                topic: topic.to_owned(),
                message: e.to_string(),
            });
        }

        debug!(topic, "subscribed");
        Ok(rx)
    }
}

// ── Event loop ───────────────────────────────────────────────────────

async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    routes: Routes,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            event = event_loop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    info!(code = ?ack.code, "connected to MQTT broker");
                    resubscribe(&client, &routes);
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                    dispatch(&routes, &publish.topic, payload);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "MQTT connection error, reconnecting");
                    tokio::select! {
                        () = cancel.cancelled() => break,
                        () = tokio::time::sleep(RECONNECT_DELAY) => {}
                    }
                }
            }
        }
    }
    debug!("MQTT event loop stopped");
}

/// Restore routed subscriptions after a (re)connect.
fn resubscribe(client: &AsyncClient, routes: &Routes) {
    routes.retain(|_, tx| !tx.is_closed());
    for route in routes.iter() {
        if let Err(e) = client.try_subscribe(route.key().as_str(), QoS::AtLeastOnce) {
            warn!(topic = %route.key(), error = %e, "resubscribe failed");
        }
    }
}

/// Hand a payload to the channel registered for `topic`.
///
/// Never blocks: a full channel drops the payload so one slow consumer
/// cannot stall the event loop.
fn dispatch(routes: &Routes, topic: &str, payload: String) {
    let closed = match routes.get(topic) {
        Some(tx) => match tx.try_send(payload) {
            Ok(()) => false,
            Err(TrySendError::Full(_)) => {
                warn!(topic, "command channel full, dropping message");
                false
            }
            Err(TrySendError::Closed(_)) => true,
        },
        None => {
            trace!(topic, "no route for incoming publish");
            false
        }
    };

    if closed {
        routes.remove(topic);
    }
}
