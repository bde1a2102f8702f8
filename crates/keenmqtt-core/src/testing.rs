#![allow(clippy::unwrap_used)]
// In-memory fakes of the router, client source, and broker seams.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use keenmqtt_api::{Host, HostPolicy};
use tokio::sync::mpsc;

use crate::client_list::ClientSource;
use crate::error::CoreError;
use crate::model::Client;
use crate::mqtt::Broker;
use crate::router::RouterApi;

fn unavailable() -> CoreError {
    CoreError::ConnectionFailed {
        url: "http://router.test".into(),
        reason: "unreachable".into(),
    }
}

// ── Router ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterCall {
    SetPolicy { mac: String, policy: Option<String> },
    SetPermit { mac: String, permit: bool },
}

#[derive(Default)]
struct RouterState {
    hosts: Vec<Host>,
    host_policies: Vec<HostPolicy>,
    policy_names: Vec<String>,
    fail_reads: bool,
    fail_writes: bool,
    policy_fetches: usize,
    calls: Vec<RouterCall>,
}

#[derive(Default)]
pub struct FakeRouter {
    state: Mutex<RouterState>,
}

impl FakeRouter {
    pub fn set_hosts(&self, hosts: Vec<Host>) {
        self.state.lock().unwrap().hosts = hosts;
    }

    pub fn set_host_policies(&self, policies: Vec<HostPolicy>) {
        self.state.lock().unwrap().host_policies = policies;
    }

    pub fn set_policy_names(&self, names: &[&str]) {
        self.state.lock().unwrap().policy_names = names.iter().map(|n| (*n).to_owned()).collect();
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    pub fn policy_fetches(&self) -> usize {
        self.state.lock().unwrap().policy_fetches
    }

    pub fn calls(&self) -> Vec<RouterCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn write(&self, call: RouterCall) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(unavailable());
        }
        state.calls.push(call);
        Ok(())
    }
}

#[async_trait]
impl RouterApi for FakeRouter {
    async fn hosts(&self) -> Result<Vec<Host>, CoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(unavailable());
        }
        Ok(state.hosts.clone())
    }

    async fn host_policies(&self) -> Result<Vec<HostPolicy>, CoreError> {
        let state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(unavailable());
        }
        Ok(state.host_policies.clone())
    }

    async fn policy_names(&self) -> Result<Vec<String>, CoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_reads {
            return Err(unavailable());
        }
        state.policy_fetches += 1;
        Ok(state.policy_names.clone())
    }

    async fn set_policy(&self, mac: &str, policy: Option<&str>) -> Result<(), CoreError> {
        self.write(RouterCall::SetPolicy {
            mac: mac.to_owned(),
            policy: policy.map(str::to_owned),
        })
    }

    async fn set_permit(&self, mac: &str, permit: bool) -> Result<(), CoreError> {
        self.write(RouterCall::SetPermit {
            mac: mac.to_owned(),
            permit,
        })
    }
}

// ── Client source ───────────────────────────────────────────────────

#[derive(Default)]
struct SourceState {
    clients: Vec<Client>,
    fail: bool,
    calls: usize,
}

#[derive(Default)]
pub struct FakeSource {
    state: Mutex<SourceState>,
}

impl FakeSource {
    pub fn set_clients(&self, clients: Vec<Client>) {
        self.state.lock().unwrap().clients = clients;
    }

    pub fn fail(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }
}

#[async_trait]
impl ClientSource for FakeSource {
    async fn client_list(&self) -> Result<Vec<Client>, CoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.fail {
            return Err(CoreError::fetch("hosts", unavailable()));
        }
        Ok(state.clients.clone())
    }
}

// ── Broker ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

#[derive(Default)]
struct BrokerState {
    published: Vec<Published>,
    subscriptions: Vec<String>,
    routes: HashMap<String, mpsc::Sender<String>>,
    fail_publishes: bool,
    fail_retained: bool,
}

#[derive(Default)]
pub struct FakeBroker {
    state: Mutex<BrokerState>,
}

impl FakeBroker {
    pub fn published(&self) -> Vec<Published> {
        self.state.lock().unwrap().published.clone()
    }

    /// Non-retained publishes to `topic`.
    pub fn states_on(&self, topic: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .filter(|p| !p.retain && p.topic == topic)
            .map(|p| p.payload.clone())
            .collect()
    }

    pub fn discoveries(&self) -> Vec<Published> {
        self.state
            .lock()
            .unwrap()
            .published
            .iter()
            .filter(|p| p.retain)
            .cloned()
            .collect()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.state.lock().unwrap().subscriptions.clone()
    }

    pub fn fail_publishes(&self, fail: bool) {
        self.state.lock().unwrap().fail_publishes = fail;
    }

    /// Fail retained (discovery) publishes only.
    pub fn fail_retained(&self, fail: bool) {
        self.state.lock().unwrap().fail_retained = fail;
    }

    /// Deliver a command payload. Returns `false` when nobody listens.
    pub async fn inject(&self, topic: &str, payload: &str) -> bool {
        let sender = self.state.lock().unwrap().routes.get(topic).cloned();
        match sender {
            Some(tx) => tx.send(payload.to_owned()).await.is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl Broker for FakeBroker {
    async fn publish(&self, topic: &str, payload: String, retain: bool) -> Result<(), CoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_publishes || (retain && state.fail_retained) {
            return Err(CoreError::Publish {
                topic: topic.to_owned(),
                message: "broker offline".into(),
            });
        }
        state.published.push(Published {
            topic: topic.to_owned(),
            payload,
            retain,
        });
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<mpsc::Receiver<String>, CoreError> {
        let (tx, rx) = mpsc::channel(16);
        let mut state = self.state.lock().unwrap();
        state.subscriptions.push(topic.to_owned());
        state.routes.insert(topic.to_owned(), tx);
        Ok(rx)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Wait for work done on spawned tasks to become visible.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not met in time");
}
