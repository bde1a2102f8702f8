// ── Policy name cache ──
//
// Holds the list of selectable policy names. The whole list is swapped
// atomically on refresh so readers never observe a partial update.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::NONE_POLICY;
use crate::router::RouterApi;

/// Lazily populated, periodically refreshed list of policy names.
///
/// The list always starts with [`NONE_POLICY`].
pub struct PolicyCache {
    router: Arc<dyn RouterApi>,
    policies: ArcSwapOption<Vec<String>>,
    /// Serializes the first fetch so concurrent readers share it.
    first_fetch: Mutex<()>,
}

impl PolicyCache {
    pub fn new(router: Arc<dyn RouterApi>) -> Self {
        Self {
            router,
            policies: ArcSwapOption::empty(),
            first_fetch: Mutex::new(()),
        }
    }

    /// Current policy names.
    ///
    /// Fetches synchronously when the cache has never been populated; if that
    /// fetch fails the result is just `["none"]`.
    pub async fn policy_list(&self) -> Arc<Vec<String>> {
        if let Some(list) = self.policies.load_full() {
            return list;
        }

        let _guard = self.first_fetch.lock().await;
        if let Some(list) = self.policies.load_full() {
            return list;
        }

        match self.fetch().await {
            Ok(list) => list,
            Err(_) => Arc::new(vec![NONE_POLICY.to_owned()]),
        }
    }

    /// Whether `name` is a currently selectable policy.
    pub async fn contains(&self, name: &str) -> bool {
        self.policy_list().await.iter().any(|p| p == name)
    }

    /// Re-fetch the policy names, keeping the previous list on failure.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.fetch().await.map(|_| ())
    }

    async fn fetch(&self) -> Result<Arc<Vec<String>>, CoreError> {
        let names = self.router.policy_names().await.map_err(|e| {
            warn!(error = %e, "policy refresh failed, keeping previous list");
            CoreError::fetch("policies", e)
        })?;

        let mut list = Vec::with_capacity(names.len() + 1);
        list.push(NONE_POLICY.to_owned());
        list.extend(names.into_iter().filter(|n| n != NONE_POLICY));

        debug!(count = list.len(), "policy list refreshed");
        let list = Arc::new(list);
        self.policies.store(Some(Arc::clone(&list)));
        Ok(list)
    }

    /// Refresh on a fixed interval until `cancel` fires.
    pub fn spawn_refresh(
        self: &Arc<Self>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        // Failures are already logged and the old list kept.
                        let _ = cache.refresh().await;
                    }
                }
            }
            debug!("policy refresh task stopped");
        })
    }
}
