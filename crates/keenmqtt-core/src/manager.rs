// ── Entity manager ──
//
// Drives the bridge: polls the client list, activates newly seen devices
// (discovery + command consumers), and publishes entity state only when it
// changed since the last successful publish.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, Notify};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::client_list::ClientSource;
use crate::entity::Entity;
use crate::error::CoreError;
use crate::model::Client;
use crate::mqtt::Broker;

/// Polling and reconciliation engine.
///
/// Cheaply cloneable via `Arc<ManagerInner>`. The known-clients set and the
/// state cache are only mutated inside [`update()`](Self::update), which is
/// serialized by the cycle lock.
#[derive(Clone)]
pub struct EntityManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    source: Arc<dyn ClientSource>,
    broker: Arc<dyn Broker>,
    entities: Vec<Arc<dyn Entity>>,
    /// MAC → last seen client. Never evicted.
    known_clients: DashMap<String, Client>,
    /// (state topic, MAC) → last successfully published state.
    states: DashMap<(String, String), String>,
    cycle: Mutex<()>,
    refresh: Notify,
    cancel: CancellationToken,
    tasks: TaskTracker,
}

impl EntityManager {
    pub fn new(
        source: Arc<dyn ClientSource>,
        broker: Arc<dyn Broker>,
        entities: Vec<Arc<dyn Entity>>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                source,
                broker,
                entities,
                known_clients: DashMap::new(),
                states: DashMap::new(),
                cycle: Mutex::new(()),
                refresh: Notify::new(),
                cancel: CancellationToken::new(),
                tasks: TaskTracker::new(),
            }),
        }
    }

    /// Snapshot of every client seen so far.
    pub fn known_clients(&self) -> Vec<Client> {
        self.inner
            .known_clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn is_known(&self, mac: &str) -> bool {
        self.inner.known_clients.contains_key(mac)
    }

    /// Ask the poll loop for an extra cycle. Requests made while a cycle is
    /// pending are coalesced.
    pub fn request_refresh(&self) {
        self.inner.refresh.notify_one();
    }

    // ── Poll cycle ───────────────────────────────────────────────────

    /// Run one poll cycle.
    ///
    /// A failed client-list fetch aborts the cycle before anything is
    /// published or recorded. Per-entity failures are logged and skipped.
    pub async fn update(&self) -> Result<(), CoreError> {
        let _cycle = self.inner.cycle.lock().await;

        let clients = self
            .inner
            .source
            .client_list()
            .await
            .inspect_err(|e| error!(error = %e, "failed to resolve client list"))?;

        for client in &clients {
            if !self.inner.known_clients.contains_key(&client.mac) {
                self.activate(client);
            }
            self.inner
                .known_clients
                .insert(client.mac.clone(), client.clone());
        }

        for client in &clients {
            self.publish_states(client).await;
        }

        debug!(clients = clients.len(), "poll cycle complete");
        Ok(())
    }

    /// Start command consumers and send discovery for a newly seen client.
    fn activate(&self, client: &Client) {
        info!(mac = %client.mac, name = %client.name, "new client");

        for entity in &self.inner.entities {
            if let Some(topic) = entity.command_topic(client) {
                self.spawn_consumer(Arc::clone(entity), client.clone(), topic);
            }
            self.spawn_discovery(Arc::clone(entity), client.clone());
        }
    }

    async fn publish_states(&self, client: &Client) {
        for entity in &self.inner.entities {
            let state = match entity.state(client) {
                Ok(state) => state,
                Err(e) => {
                    warn!(mac = %client.mac, kind = %entity.kind(), error = %e, "failed to compute state");
                    continue;
                }
            };

            let key = (entity.state_topic(client), client.mac.clone());
            if self
                .inner
                .states
                .get(&key)
                .is_some_and(|previous| *previous == state)
            {
                continue;
            }

            match self.inner.broker.publish(&key.0, state.clone(), false).await {
                Ok(()) => {
                    debug!(topic = %key.0, state = %state, "state published");
                    self.inner.states.insert(key, state);
                }
                Err(e) => {
                    warn!(topic = %key.0, error = %e, "state publish failed, will retry next cycle");
                }
            }
        }
    }

    // ── Background tasks ─────────────────────────────────────────────

    fn spawn_discovery(&self, entity: Arc<dyn Entity>, client: Client) {
        let cancel = self.inner.cancel.child_token();

        self.inner.tasks.spawn(async move {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {}
                result = entity.send_discovery(&client) => {
                    if let Err(e) = result {
                        warn!(mac = %client.mac, kind = %entity.kind(), error = %e, "discovery failed");
                    }
                }
            }
        });
    }

    fn spawn_consumer(&self, entity: Arc<dyn Entity>, client: Client, topic: String) {
        let manager = self.clone();
        let cancel = self.inner.cancel.child_token();

        self.inner.tasks.spawn(async move {
            let mut commands = match manager.inner.broker.subscribe(&topic).await {
                Ok(rx) => rx,
                Err(e) => {
                    error!(topic = %topic, error = %e, "failed to subscribe to command topic");
                    return;
                }
            };
            debug!(topic = %topic, "command consumer started");

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    payload = commands.recv() => {
                        let Some(payload) = payload else { break };
                        debug!(topic = %topic, payload = %payload, "command received");

                        let current = manager
                            .inner
                            .known_clients
                            .get(&client.mac)
                            .map_or_else(|| client.clone(), |c| c.value().clone());

                        if let Err(e) = entity.consume(&current, &payload).await {
                            error!(mac = %client.mac, kind = %entity.kind(), error = %e, "failed to apply command");
                        }
                        manager.request_refresh();
                    }
                }
            }
            debug!(topic = %topic, "command consumer stopped");
        });
    }

    /// Spawn the poll loop (one cycle immediately, then every `interval`)
    /// and the refresh listener that runs a cycle whenever a consumer asks
    /// for one.
    ///
    /// The listener is tied to the manager's root token, so it keeps
    /// serving command consumers after [`ManagerHandle::stop_polling`].
    pub fn start(&self, interval: Duration) -> ManagerHandle {
        let poll_cancel = self.inner.cancel.child_token();

        info!(interval_secs = interval.as_secs(), "starting entity manager");
        let manager = self.clone();
        let cancel = poll_cancel.clone();
        self.inner
            .tasks
            .spawn(async move { manager.poll_loop(interval, cancel).await });

        let manager = self.clone();
        let cancel = self.inner.cancel.child_token();
        self.inner
            .tasks
            .spawn(async move { manager.refresh_loop(cancel).await });

        ManagerHandle {
            manager: self.clone(),
            poll_cancel,
        }
    }

    async fn poll_loop(&self, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                // Failures are logged inside update; the next tick retries.
                _ = self.update() => {}
            }
        }
        debug!("poll loop stopped");
    }

    async fn refresh_loop(&self, cancel: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = self.inner.refresh.notified() => {}
            }
            debug!("out-of-band refresh requested");

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = self.update() => {}
            }
        }
        debug!("refresh listener stopped");
    }
}

/// Control handle returned by [`EntityManager::start`].
pub struct ManagerHandle {
    manager: EntityManager,
    poll_cancel: CancellationToken,
}

impl ManagerHandle {
    /// Stop the periodic poll loop. Command consumers keep running and
    /// still trigger a cycle after each command.
    pub fn stop_polling(&self) {
        self.poll_cancel.cancel();
    }

    /// Cancel the poll loop and every consumer and discovery task, then
    /// wait for them to finish.
    pub async fn shutdown(self) {
        let inner = &self.manager.inner;
        inner.cancel.cancel();
        inner.tasks.close();
        inner.tasks.wait().await;
        info!("entity manager stopped");
    }
}
