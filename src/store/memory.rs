//! # In-Memory Store
//!
//! A map-backed [`ObjectStore`] / [`ObjectLister`] with Kubernetes-like
//! write semantics: `create` rejects duplicates, `update` rejects missing
//! objects and stale `resourceVersion`s, and every successful write bumps
//! the version. Each write is recorded so callers can assert on exactly
//! which mutations happened.

use super::{identity_of, ObjectLister, ObjectStore, StoreError};
use async_trait::async_trait;
use kube::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    UpdateStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mutation {
    pub kind: MutationKind,
    pub namespace: String,
    pub name: String,
}

type Key = (String, String);

#[derive(Debug)]
pub struct MemoryStore<K> {
    objects: Mutex<BTreeMap<Key, K>>,
    mutations: Mutex<Vec<Mutation>>,
    fail_writes: AtomicBool,
    version: AtomicU64,
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            mutations: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            version: AtomicU64::new(0),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K> MemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without recording a mutation. Returns the stored copy.
    ///
    /// # Panics
    ///
    /// Panics if the object has no name or namespace.
    pub fn insert(&self, mut obj: K) -> K {
        let key = match identity_of(&obj) {
            Ok(key) => key,
            Err(err) => panic!("cannot seed store: {err}"),
        };
        obj.meta_mut().resource_version = Some(self.next_version());
        lock(&self.objects).insert(key, obj.clone());
        obj
    }

    pub fn remove(&self, namespace: &str, name: &str) -> Option<K> {
        lock(&self.objects).remove(&(namespace.to_string(), name.to_string()))
    }

    /// Current copy of an object, read synchronously
    #[must_use]
    pub fn snapshot(&self, namespace: &str, name: &str) -> Option<K> {
        lock(&self.objects)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.objects).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.objects).is_empty()
    }

    #[must_use]
    pub fn mutations(&self) -> Vec<Mutation> {
        lock(&self.mutations).clone()
    }

    #[must_use]
    pub fn mutation_count(&self) -> usize {
        lock(&self.mutations).len()
    }

    pub fn clear_mutations(&self) {
        lock(&self.mutations).clear();
    }

    /// Make every subsequent write fail with [`StoreError::Backend`]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn next_version(&self) -> String {
        (self.version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!(
                "writes to {} are disabled",
                K::kind(&())
            )));
        }
        Ok(())
    }

    fn record(&self, kind: MutationKind, (namespace, name): &Key) {
        lock(&self.mutations).push(Mutation {
            kind,
            namespace: namespace.clone(),
            name: name.clone(),
        });
    }

    fn not_found((namespace, name): &Key) -> StoreError {
        StoreError::NotFound {
            kind: K::kind(&()).to_string(),
            namespace: namespace.clone(),
            name: name.clone(),
        }
    }

    /// Fails with `Conflict` when the caller's version is set and stale.
    fn check_version(stored: &K, incoming: &K, (namespace, name): &Key) -> Result<(), StoreError> {
        match incoming.meta().resource_version.as_deref() {
            Some(version) if Some(version) != stored.meta().resource_version.as_deref() => {
                Err(StoreError::Conflict {
                    kind: K::kind(&()).to_string(),
                    namespace: namespace.clone(),
                    name: name.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl<K> ObjectStore<K> for MemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, StoreError> {
        Ok(self.snapshot(namespace, name))
    }

    async fn create(&self, obj: &K) -> Result<K, StoreError> {
        self.check_writable()?;
        let key = identity_of(obj)?;
        let mut objects = lock(&self.objects);
        if objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: K::kind(&()).to_string(),
                namespace: key.0,
                name: key.1,
            });
        }
        let mut stored = obj.clone();
        stored.meta_mut().resource_version = Some(self.next_version());
        objects.insert(key.clone(), stored.clone());
        drop(objects);
        self.record(MutationKind::Create, &key);
        Ok(stored)
    }

    async fn update(&self, obj: &K) -> Result<K, StoreError> {
        self.check_writable()?;
        let key = identity_of(obj)?;
        let mut objects = lock(&self.objects);
        let current = objects.get(&key).ok_or_else(|| Self::not_found(&key))?;
        Self::check_version(current, obj, &key)?;
        let mut stored = obj.clone();
        stored.meta_mut().resource_version = Some(self.next_version());
        objects.insert(key.clone(), stored.clone());
        drop(objects);
        self.record(MutationKind::Update, &key);
        Ok(stored)
    }

    async fn update_status(&self, obj: &K) -> Result<K, StoreError> {
        self.check_writable()?;
        let key = identity_of(obj)?;
        let encode = |source| StoreError::Encode {
            kind: K::kind(&()).to_string(),
            source,
        };
        let mut objects = lock(&self.objects);
        let current = objects.get(&key).ok_or_else(|| Self::not_found(&key))?;
        Self::check_version(current, obj, &key)?;

        // Only the status subresource moves; spec and metadata stay as stored.
        let mut merged = serde_json::to_value(current).map_err(encode)?;
        let incoming = serde_json::to_value(obj).map_err(encode)?;
        let status = incoming
            .get("status")
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        if let Some(map) = merged.as_object_mut() {
            map.insert("status".to_string(), status);
        }
        let mut stored: K = serde_json::from_value(merged).map_err(encode)?;
        stored.meta_mut().resource_version = Some(self.next_version());
        objects.insert(key.clone(), stored.clone());
        drop(objects);
        self.record(MutationKind::UpdateStatus, &key);
        Ok(stored)
    }
}

#[async_trait]
impl<K> ObjectLister<K> for MemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    async fn list(&self, namespace: &str) -> Result<Vec<K>, StoreError> {
        Ok(lock(&self.objects)
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, obj)| obj.clone())
            .collect())
    }
}
