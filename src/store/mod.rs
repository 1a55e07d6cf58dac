//! # Object Stores
//!
//! Generic object store seam used for both the virtual and the physical
//! cluster. The core only ever talks to these traits; which cluster (or
//! in-memory map) sits behind them is decided at wiring time.
//!
//! - `kube`: live store backed by a Kubernetes API client
//! - `cached`: read-only lister backed by a reflector cache
//! - `memory`: in-memory store used by tests and dry runs

pub mod cached;
pub mod kube;
pub mod memory;

pub use self::cached::{spawn_reflector, CachedLister};
pub use self::kube::KubeStore;
pub use self::memory::{MemoryStore, Mutation, MutationKind};

use async_trait::async_trait;
use ::kube::Resource;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Kubernetes API request failed: {0}")]
    Kube(#[from] ::kube::Error),

    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("{kind} {namespace}/{name} already exists")]
    AlreadyExists {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("conflict writing {kind} {namespace}/{name}: object has been modified")]
    Conflict {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("{kind} object is missing a name or namespace")]
    MissingIdentity { kind: String },

    #[error("failed to encode {kind}: {source}")]
    Encode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} cache is not available")]
    CacheUnavailable(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Read/write access to one kind of namespaced object in one cluster.
#[async_trait]
pub trait ObjectStore<K: Send + Sync>: Send + Sync {
    /// Fetch an object; `Ok(None)` when it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError>;

    async fn create(&self, obj: &K) -> Result<K, StoreError>;

    /// Replace the whole object (optimistic on `resourceVersion` when set)
    async fn update(&self, obj: &K) -> Result<K, StoreError>;

    /// Write only the status of the object
    async fn update_status(&self, obj: &K) -> Result<K, StoreError>;
}

/// Lists every object of one kind in a namespace, as currently stored.
#[async_trait]
pub trait ObjectLister<K: Send + Sync>: Send + Sync {
    async fn list(&self, namespace: &str) -> Result<Vec<K>, StoreError>;
}

/// `(namespace, name)` of an object about to be written
pub(crate) fn identity_of<K>(obj: &K) -> Result<(String, String), StoreError>
where
    K: Resource<DynamicType = ()>,
{
    let meta = obj.meta();
    match (meta.namespace.as_deref(), meta.name.as_deref()) {
        (Some(namespace), Some(name)) if !namespace.is_empty() && !name.is_empty() => {
            Ok((namespace.to_string(), name.to_string()))
        }
        _ => Err(StoreError::MissingIdentity {
            kind: K::kind(&()).to_string(),
        }),
    }
}
