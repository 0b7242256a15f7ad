//! Where a user's backend instances come from.
//!
//! The aggregation layer only needs "which instances does this user own"; the
//! [`InstanceStore`] trait is that seam. [`ConfigInstanceStore`] answers it
//! from the loaded configuration file and supports hot reload.

use async_trait::async_trait;
use parking_lot::RwLock;

use mg_core::config::{Config, InstanceConfig};
use mg_core::{InstanceId, Result, UserId};

/// Resolves the backend instances a user has configured.
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Enabled instances owned by `user`, in a stable order.
    async fn instances_for_user(&self, user: UserId) -> Result<Vec<InstanceConfig>>;

    /// One of `user`'s enabled instances by id. When several kinds share the
    /// id, the first in store order wins.
    async fn instance_for_user(
        &self,
        user: UserId,
        instance_id: InstanceId,
    ) -> Result<Option<InstanceConfig>> {
        Ok(self
            .instances_for_user(user)
            .await?
            .into_iter()
            .find(|i| i.id == instance_id))
    }
}

/// [`InstanceStore`] backed by an in-memory [`Config`] snapshot.
#[derive(Debug, Default)]
pub struct ConfigInstanceStore {
    config: RwLock<Config>,
}

impl ConfigInstanceStore {
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }

    /// Swap in a freshly loaded configuration, returning the previous one.
    pub fn replace(&self, config: Config) -> Config {
        std::mem::replace(&mut *self.config.write(), config)
    }

    /// Clone of the current configuration.
    pub fn snapshot(&self) -> Config {
        self.config.read().clone()
    }

    /// Every configured instance, enabled or not.
    pub fn all_instances(&self) -> Vec<InstanceConfig> {
        self.config.read().instances.clone()
    }

    /// Distinct owners, in first-seen order.
    pub fn users(&self) -> Vec<UserId> {
        let mut users = Vec::new();
        for instance in &self.config.read().instances {
            if !users.contains(&instance.user_id) {
                users.push(instance.user_id);
            }
        }
        users
    }
}

#[async_trait]
impl InstanceStore for ConfigInstanceStore {
    async fn instances_for_user(&self, user: UserId) -> Result<Vec<InstanceConfig>> {
        Ok(self.config.read().instances_for_user(user).cloned().collect())
    }
}
