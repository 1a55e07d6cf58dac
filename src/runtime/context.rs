use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::syncer::{SyncEngine, SyncError};
use crate::store::ObjectStore;
use k8s_openapi::api::core::v1::Secret;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("sync failed: {0}")]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Shared by every controller. Backoff state is keyed per resource so one
/// failing object never slows down the others.
pub struct Context {
    pub engine: SyncEngine,
    pub virtual_secrets: Arc<dyn ObjectStore<Secret>>,
    pub config: ControllerConfig,
    pub backoff_states: Mutex<HashMap<String, FibonacciBackoff>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("engine", &self.engine)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Context {
    #[must_use]
    pub fn new(
        engine: SyncEngine,
        virtual_secrets: Arc<dyn ObjectStore<Secret>>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            engine,
            virtual_secrets,
            config,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Next retry delay for `key`, advancing its sequence.
    pub fn next_backoff(&self, key: &str) -> (u64, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let backoff = states.entry(key.to_string()).or_insert_with(|| {
                    FibonacciBackoff::new(self.config.backoff_min_secs, self.config.backoff_max_secs)
                });
                let seconds = backoff.next_backoff_seconds();
                (seconds, backoff.attempts())
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to lock backoff states, using minimum backoff");
                (self.config.backoff_min_secs, 0)
            }
        }
    }

    /// Forget the failure history of `key`. Returns whether it had any.
    pub fn reset_backoff(&self, key: &str) -> bool {
        self.backoff_states
            .lock()
            .ok()
            .and_then(|mut states| states.remove(key))
            .is_some()
    }
}
