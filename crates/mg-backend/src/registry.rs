//! Process-wide cache of live backend clients.
//!
//! [`ClientRegistry`] keeps at most one live client per [`InstanceKey`].
//! Construction is single-flight per key: the first caller for a key installs
//! an empty [`OnceCell`] slot under the write lock, releases the lock, and
//! runs the factory; concurrent callers for the same key await that slot
//! instead of building their own client. Callers for other keys are never
//! blocked by a slow factory.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use mg_core::config::InstanceConfig;
use mg_core::{BackendKind, Error, InstanceId, InstanceKey, Result};

use crate::capability::BackendClient;
use crate::factory::ClientFactory;

type Slot = Arc<OnceCell<Arc<dyn BackendClient>>>;

/// Owns the factories and the live-client cache.
///
/// Create one at start-up and share it behind an `Arc`.
pub struct ClientRegistry {
    factories: RwLock<HashMap<BackendKind, Arc<dyn ClientFactory>>>,
    clients: RwLock<HashMap<InstanceKey, Slot>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(HashMap::new()),
            clients: RwLock::new(HashMap::new()),
        }
    }

    /// Install the constructor for every future instance of `kind`.
    ///
    /// Registering a kind twice replaces the earlier factory. Clients that are
    /// already cached are kept.
    pub fn register_factory<F>(&self, kind: BackendKind, factory: F)
    where
        F: ClientFactory + 'static,
    {
        if self.factories.write().insert(kind, Arc::new(factory)).is_some() {
            tracing::debug!(kind = %kind, "Replaced client factory");
        }
    }

    /// Whether a factory is registered for `kind`.
    pub fn has_factory(&self, kind: BackendKind) -> bool {
        self.factories.read().contains_key(&kind)
    }

    /// Kinds with a registered factory, sorted.
    pub fn registered_kinds(&self) -> Vec<BackendKind> {
        let mut kinds: Vec<_> = self.factories.read().keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Return the cached client for `(config.kind, instance_id)`, building it
    /// with the registered factory if needed.
    ///
    /// [`InstanceId::EPHEMERAL`] always builds a fresh client and never caches
    /// it. A failed construction caches nothing, so the next call retries.
    /// Cancelling `ctx` while waiting returns [`Error::Cancelled`].
    pub async fn get_or_create(
        &self,
        ctx: &CancellationToken,
        instance_id: InstanceId,
        config: &InstanceConfig,
    ) -> Result<Arc<dyn BackendClient>> {
        let key = InstanceKey::new(config.kind, instance_id);

        if instance_id.is_ephemeral() {
            if self.clients.write().remove(&key).is_some() {
                tracing::info!(instance = %key, "Evicted cached client for ephemeral instance");
            }
            return tokio::select! {
                biased;
                _ = ctx.cancelled() => Err(Error::Cancelled),
                r = self.construct(ctx, key, config) => r,
            };
        }

        if let Some(client) = self.get(key) {
            tracing::debug!(instance = %key, "Client cache hit");
            return Ok(client);
        }

        let slot = self.clients.write().entry(key).or_default().clone();

        let result = tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(Error::Cancelled),
            r = slot.get_or_try_init(|| self.construct(ctx, key, config)) => r.cloned(),
        };

        if result.is_err() {
            self.discard_empty(key, slot);
        }
        result
    }

    /// Drop the cached client for `(config.kind, instance_id)`, if any.
    pub fn unregister(&self, instance_id: InstanceId, config: &InstanceConfig) {
        let key = InstanceKey::new(config.kind, instance_id);
        if self.clients.write().remove(&key).is_some() {
            tracing::info!(instance = %key, "Unregistered backend client");
        }
    }

    /// Cached client for `key`, without constructing one.
    pub fn get(&self, key: InstanceKey) -> Option<Arc<dyn BackendClient>> {
        self.clients.read().get(&key).and_then(|slot| slot.get().cloned())
    }

    pub fn contains(&self, key: InstanceKey) -> bool {
        self.get(key).is_some()
    }

    /// Number of live cached clients.
    pub fn len(&self) -> usize {
        self.clients.read().values().filter(|s| s.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys of all live cached clients, sorted.
    pub fn cached_keys(&self) -> Vec<InstanceKey> {
        let mut keys: Vec<_> = self
            .clients
            .read()
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(key, _)| *key)
            .collect();
        keys.sort();
        keys
    }

    /// Drop every cached client. Factories stay registered.
    pub fn clear(&self) {
        let mut clients = self.clients.write();
        let dropped = clients.len();
        clients.clear();
        tracing::info!(dropped, "Cleared backend client cache");
    }

    async fn construct(
        &self,
        ctx: &CancellationToken,
        key: InstanceKey,
        config: &InstanceConfig,
    ) -> Result<Arc<dyn BackendClient>> {
        let factory = self
            .factories
            .read()
            .get(&key.kind)
            .cloned()
            .ok_or(Error::FactoryNotRegistered(key.kind))?;

        tracing::info!(instance = %key, name = %config.name, "Constructing backend client");

        match factory.create(ctx, key.instance_id, config).await {
            Ok(client) => {
                tracing::debug!(
                    instance = %key,
                    capabilities = ?client.capabilities(),
                    "Backend client ready"
                );
                Ok(client)
            }
            Err(e) => {
                tracing::warn!(instance = %key, error = %e, "Backend client construction failed");
                Err(e.with_context(key, "connect"))
            }
        }
    }

    /// Remove a slot left empty by a failed or cancelled construction, unless
    /// another caller is still waiting on it or it was already replaced.
    fn discard_empty(&self, key: InstanceKey, slot: Slot) {
        let mut clients = self.clients.write();
        let current = clients
            .get(&key)
            .is_some_and(|existing| Arc::ptr_eq(existing, &slot));
        // One reference in the map plus ours.
        if current && !slot.initialized() && Arc::strong_count(&slot) == 2 {
            clients.remove(&key);
        }
        drop(slot);
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("factories", &self.registered_kinds())
            .field("clients", &self.cached_keys())
            .finish()
    }
}
