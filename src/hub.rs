//! Bundles the registry and instance store behind one handle.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use mg_backend::{Capability, ClientRegistry};
use mg_core::config::{AggregationConfig, InstanceConfig};
use mg_core::{Error, InstanceKey, Result, UserId};

use crate::aggregate::{
    AggregationService, AlbumService, ArtistService, Catalog, CollectionService, EpisodeService,
    MovieService, PlaylistService, SeriesService, TrackService,
};
use crate::instances::InstanceStore;

/// What one of a user's instances can do right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceCapabilities {
    pub key: InstanceKey,
    pub name: String,
    pub capabilities: Vec<Capability>,
    /// Set when no client could be built; `capabilities` is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Entry point for callers: hands out one aggregation service per media type.
///
/// Cheap to clone; every clone shares the same registry and store.
#[derive(Clone)]
pub struct MediaHub {
    registry: Arc<ClientRegistry>,
    store: Arc<dyn InstanceStore>,
    settings: AggregationConfig,
}

impl MediaHub {
    pub fn new(
        registry: Arc<ClientRegistry>,
        store: Arc<dyn InstanceStore>,
        settings: AggregationConfig,
    ) -> Self {
        Self {
            registry,
            store,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.registry
    }

    pub fn service<C: Catalog>(&self) -> AggregationService<C> {
        AggregationService::new(self.registry.clone(), self.store.clone(), self.settings.clone())
    }

    pub fn movies(&self) -> MovieService {
        self.service()
    }

    pub fn series(&self) -> SeriesService {
        self.service()
    }

    pub fn episodes(&self) -> EpisodeService {
        self.service()
    }

    pub fn tracks(&self) -> TrackService {
        self.service()
    }

    pub fn albums(&self) -> AlbumService {
        self.service()
    }

    pub fn artists(&self) -> ArtistService {
        self.service()
    }

    pub fn playlists(&self) -> PlaylistService {
        self.service()
    }

    pub fn collections(&self) -> CollectionService {
        self.service()
    }

    /// Build (or reuse) a client for each of `user`'s instances and report
    /// its capabilities. Instances that cannot be reached are listed with
    /// their error instead of failing the whole call.
    pub async fn capabilities_for_user(
        &self,
        ctx: &CancellationToken,
        user: UserId,
    ) -> Result<Vec<InstanceCapabilities>> {
        let instances = self.store.instances_for_user(user).await?;
        let concurrency = self.settings.max_concurrency.max(1);

        tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(Error::Cancelled),
            report = stream::iter(&instances)
                .map(|instance| self.probe(ctx, instance))
                .buffered(concurrency)
                .collect::<Vec<_>>() => Ok(report),
        }
    }

    /// Drop the cached client for `config`, e.g. after its credentials changed.
    pub fn forget_instance(&self, config: &InstanceConfig) {
        self.registry.unregister(config.id, config);
    }

    async fn probe(&self, ctx: &CancellationToken, instance: &InstanceConfig) -> InstanceCapabilities {
        let (capabilities, error) = match self.registry.get_or_create(ctx, instance.id, instance).await {
            Ok(client) => (client.capabilities(), None),
            Err(e) => (Vec::new(), Some(e.to_string())),
        };
        InstanceCapabilities {
            key: instance.key(),
            name: instance.name.clone(),
            capabilities,
            error,
        }
    }
}

impl std::fmt::Debug for MediaHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaHub")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
