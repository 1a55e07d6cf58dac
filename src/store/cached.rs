//! Reflector-backed [`ObjectLister`]. Lists are answered from the watch
//! cache instead of hitting the API server on every lookup.

use super::{ObjectLister, StoreError};
use async_trait::async_trait;
use futures::StreamExt;
use kube::api::Api;
use kube::Resource;
use kube_runtime::reflector::{self, Store};
use kube_runtime::{watcher, WatchStreamExt};
use serde::de::DeserializeOwned;
use std::fmt::Debug;

pub struct CachedLister<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    store: Store<K>,
}

impl<K> Debug for CachedLister<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedLister")
            .field("kind", &K::kind(&()))
            .field("cached", &self.store.state().len())
            .finish()
    }
}

impl<K> CachedLister<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    #[must_use]
    pub fn new(store: Store<K>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> Store<K> {
        self.store.clone()
    }
}

#[async_trait]
impl<K> ObjectLister<K> for CachedLister<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    async fn list(&self, namespace: &str) -> Result<Vec<K>, StoreError> {
        self.store
            .wait_until_ready()
            .await
            .map_err(|err| StoreError::CacheUnavailable(format!("{}: {err}", K::kind(&()))))?;
        Ok(self
            .store
            .state()
            .iter()
            .filter(|obj| obj.meta().namespace.as_deref() == Some(namespace))
            .map(|obj| obj.as_ref().clone())
            .collect())
    }
}

/// Start a reflector for `api` on the current runtime and return a lister
/// over its cache. Watch errors are logged and retried with backoff.
pub fn spawn_reflector<K>(api: Api<K>, config: watcher::Config) -> CachedLister<K>
where
    K: Resource<DynamicType = ()> + Clone + Debug + DeserializeOwned + Send + Sync + 'static,
{
    let (reader, writer) = reflector::store();
    let stream = kube_runtime::reflector(writer, watcher(api, config))
        .default_backoff()
        .touched_objects();
    tokio::spawn(async move {
        stream
            .for_each(|event| async move {
                if let Err(e) = event {
                    tracing::warn!(
                        resource.kind = %K::kind(&()),
                        error = %e,
                        "reflector watch error, retrying"
                    );
                }
            })
            .await;
    });
    CachedLister::new(reader)
}
