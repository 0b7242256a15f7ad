//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which owns a [`ClientRegistry`] whose factories
//! build in-process [`StubClient`]s, a [`ConfigInstanceStore`], and a
//! [`MediaHub`] over both. Each stub is described by a [`StubSpec`]: which
//! capabilities it has, what it returns, how slow it is, and how it fails.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use mediagate::{ConfigInstanceStore, MediaHub};
use mg_backend::{
    BackendClient, CancellationToken, Capability, ClientRegistry, Criteria, MovieLibrary,
    SeriesLibrary, TrackLibrary,
};
use mg_core::config::{AggregationConfig, Config, InstanceConfig};
use mg_core::{
    BackendKind, Error, InstanceId, InstanceKey, MediaDetails, MediaItem, Movie, Result, Series,
    Track, UserId,
};

// ---------------------------------------------------------------------------
// StubSpec
// ---------------------------------------------------------------------------

/// Behaviour of one stub backend.
#[derive(Debug, Clone, Default)]
pub struct StubSpec {
    pub capabilities: Vec<Capability>,
    /// Returned (after filtering) by every list call the stub supports.
    pub items: Vec<MediaItem>,
    /// Every list/get call fails with this transport message.
    pub fail: Option<String>,
    /// Every list/get call answers with an unparseable body.
    pub malformed: bool,
    /// Client construction fails with this message.
    pub connect_error: Option<String>,
    /// Delay before each list/get call answers.
    pub latency: Duration,
}

impl StubSpec {
    pub fn with(capabilities: &[Capability]) -> Self {
        Self {
            capabilities: capabilities.to_vec(),
            ..Self::default()
        }
    }

    pub fn items(mut self, items: Vec<MediaItem>) -> Self {
        self.items = items;
        self
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail = Some(message.to_string());
        self
    }

    pub fn malformed(mut self) -> Self {
        self.malformed = true;
        self
    }

    pub fn unreachable(mut self, message: &str) -> Self {
        self.connect_error = Some(message.to_string());
        self
    }

    pub fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

// ---------------------------------------------------------------------------
// StubClient
// ---------------------------------------------------------------------------

pub struct StubClient {
    key: InstanceKey,
    name: String,
    spec: StubSpec,
}

impl StubClient {
    async fn list(&self, operation: &str, criteria: &Criteria) -> Result<Vec<MediaItem>> {
        tokio::time::sleep(self.spec.latency).await;
        if let Some(ref message) = self.spec.fail {
            return Err(Error::backend(self.key, operation, message));
        }
        if self.spec.malformed {
            return Ok(serde_json::from_str("{\"items\": [")?);
        }
        Ok(self
            .spec
            .items
            .iter()
            .filter(|item| criteria.matches(item))
            .cloned()
            .collect())
    }

    async fn get(&self, operation: &str, foreign_id: &str) -> Result<MediaItem> {
        tokio::time::sleep(self.spec.latency).await;
        if let Some(ref message) = self.spec.fail {
            return Err(Error::backend(self.key, operation, message));
        }
        if self.spec.malformed {
            return Err(Error::Internal("unexpected EOF".into()));
        }
        self.spec
            .items
            .iter()
            .find(|item| item.foreign_id_for(self.key) == foreign_id)
            .cloned()
            .ok_or_else(|| Error::not_found("item", foreign_id))
    }

    fn supports(&self, capability: Capability) -> bool {
        self.spec.capabilities.contains(&capability)
    }
}

#[async_trait]
impl MovieLibrary for StubClient {
    async fn list_movies(&self, _ctx: &CancellationToken, criteria: &Criteria) -> Result<Vec<MediaItem>> {
        self.list("list movies", criteria).await
    }

    async fn get_movie(&self, _ctx: &CancellationToken, foreign_id: &str) -> Result<MediaItem> {
        self.get("get movie", foreign_id).await
    }
}

#[async_trait]
impl SeriesLibrary for StubClient {
    async fn list_series(&self, _ctx: &CancellationToken, criteria: &Criteria) -> Result<Vec<MediaItem>> {
        self.list("list series", criteria).await
    }

    async fn get_series(&self, _ctx: &CancellationToken, foreign_id: &str) -> Result<MediaItem> {
        self.get("get series", foreign_id).await
    }
}

#[async_trait]
impl TrackLibrary for StubClient {
    async fn list_tracks(&self, _ctx: &CancellationToken, criteria: &Criteria) -> Result<Vec<MediaItem>> {
        self.list("list tracks", criteria).await
    }

    async fn get_track(&self, _ctx: &CancellationToken, foreign_id: &str) -> Result<MediaItem> {
        self.get("get track", foreign_id).await
    }
}

impl BackendClient for StubClient {
    fn key(&self) -> InstanceKey {
        self.key
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_movies(&self) -> Option<&dyn MovieLibrary> {
        self.supports(Capability::Movies).then_some(self as &dyn MovieLibrary)
    }

    fn as_series(&self) -> Option<&dyn SeriesLibrary> {
        self.supports(Capability::Series).then_some(self as &dyn SeriesLibrary)
    }

    fn as_tracks(&self) -> Option<&dyn TrackLibrary> {
        self.supports(Capability::Tracks).then_some(self as &dyn TrackLibrary)
    }
}

// ---------------------------------------------------------------------------
// TestHarness
// ---------------------------------------------------------------------------

pub struct TestHarness {
    pub user: UserId,
    pub registry: Arc<ClientRegistry>,
    pub store: Arc<ConfigInstanceStore>,
    pub hub: MediaHub,
    /// Total number of factory invocations across all kinds.
    pub constructions: Arc<AtomicUsize>,
    specs: Arc<Mutex<HashMap<InstanceKey, StubSpec>>>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_settings(AggregationConfig::default())
    }

    pub fn with_settings(settings: AggregationConfig) -> Self {
        let registry = Arc::new(ClientRegistry::new());
        let store = Arc::new(ConfigInstanceStore::new(Config::default()));
        let specs: Arc<Mutex<HashMap<InstanceKey, StubSpec>>> = Arc::default();
        let constructions = Arc::new(AtomicUsize::new(0));

        for kind in BackendKind::ALL {
            let specs = specs.clone();
            let constructions = constructions.clone();
            registry.register_factory(
                kind,
                move |_ctx: CancellationToken, id: InstanceId, config: InstanceConfig| {
                    let key = InstanceKey::new(config.kind, id);
                    let spec = specs.lock().get(&key).cloned();
                    constructions.fetch_add(1, Ordering::SeqCst);
                    async move {
                        let Some(spec) = spec else {
                            return Err(Error::not_found("stub", key));
                        };
                        if let Some(ref message) = spec.connect_error {
                            return Err(Error::backend(key, "connect", message));
                        }
                        let client: Arc<dyn BackendClient> = Arc::new(StubClient {
                            key,
                            name: config.name,
                            spec,
                        });
                        Ok(client)
                    }
                },
            );
        }

        let hub = MediaHub::new(registry.clone(), store.clone(), settings);

        Self {
            user: UserId::new(),
            registry,
            store,
            hub,
            constructions,
            specs,
        }
    }

    /// Configure an enabled instance owned by the harness user.
    pub fn add(&self, id: u64, kind: BackendKind, spec: StubSpec) -> InstanceConfig {
        self.add_for(self.user, id, kind, spec)
    }

    pub fn add_for(&self, user: UserId, id: u64, kind: BackendKind, spec: StubSpec) -> InstanceConfig {
        let mut instance = InstanceConfig::new(id, kind, format!("{kind}-{id}"), user);
        instance.url = format!("http://{kind}-{id}.local");
        instance.api_key = Some("key".into());

        self.specs.lock().insert(instance.key(), spec);
        let mut config = self.store.snapshot();
        config.instances.push(instance.clone());
        self.store.replace(config);
        instance
    }

    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Item builders
// ---------------------------------------------------------------------------

pub fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, n, 12, 0, 0).unwrap()
}

/// A movie as `key` would report it, added on day `added` of January 2024.
pub fn movie(key: InstanceKey, foreign_id: &str, title: &str, added: Option<u32>) -> MediaItem {
    let mut details = MediaDetails::titled(title);
    details.added_at = added.map(day);
    MediaItem::from_backend(
        Movie {
            details,
            runtime_minutes: Some(120),
        },
        key,
        foreign_id,
    )
}

pub fn series(key: InstanceKey, foreign_id: &str, title: &str) -> MediaItem {
    MediaItem::from_backend(
        Series {
            details: MediaDetails::titled(title),
            ..Series::default()
        },
        key,
        foreign_id,
    )
}

pub fn track(key: InstanceKey, foreign_id: &str, title: &str, artist: &str) -> MediaItem {
    MediaItem::from_backend(
        Track {
            details: MediaDetails::titled(title),
            artist: Some(artist.to_string()),
            ..Track::default()
        },
        key,
        foreign_id,
    )
}

pub fn titles(items: &[MediaItem]) -> Vec<&str> {
    items.iter().map(MediaItem::title).collect()
}
