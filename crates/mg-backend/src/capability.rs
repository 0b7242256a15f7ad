//! The [`BackendClient`] trait and the per-media-type capability traits.
//!
//! A vendor client implements `BackendClient` plus whichever capability traits
//! its backend can serve, and advertises each one by overriding the matching
//! `as_*` accessor. Capability discovery is always through those accessors;
//! there is no separate flag that could drift out of sync with them.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use mg_core::{BackendKind, Capability, InstanceId, InstanceKey, MediaItem, Result};

use crate::criteria::Criteria;

macro_rules! library_trait {
    ($($(#[doc = $doc:expr])* $name:ident { $list:ident, $get:ident })+) => {
        $(
            $(#[doc = $doc])*
            #[async_trait]
            pub trait $name: Send + Sync {
                /// List items matching `criteria`, translated into the
                /// backend's own query shape.
                async fn $list(
                    &self,
                    ctx: &CancellationToken,
                    criteria: &Criteria,
                ) -> Result<Vec<MediaItem>>;

                /// Fetch one item by the backend's own identifier.
                async fn $get(&self, ctx: &CancellationToken, foreign_id: &str) -> Result<MediaItem>;
            }
        )+
    };
}

library_trait! {
    /// Backends that can list movies.
    MovieLibrary { list_movies, get_movie }
    /// Backends that can list TV series.
    SeriesLibrary { list_series, get_series }
    /// Backends that can list TV episodes.
    EpisodeLibrary { list_episodes, get_episode }
    /// Backends that can list music tracks.
    TrackLibrary { list_tracks, get_track }
    /// Backends that can list music albums.
    AlbumLibrary { list_albums, get_album }
    /// Backends that can list music artists.
    ArtistLibrary { list_artists, get_artist }
    /// Backends that can list playlists.
    PlaylistLibrary { list_playlists, get_playlist }
    /// Backends that can list collections.
    CollectionLibrary { list_collections, get_collection }
}

/// A live connection to one backend instance.
///
/// Implementors are shared across tasks behind an `Arc`, so they must be
/// `Send + Sync`. Every `as_*` accessor defaults to `None`; override the ones
/// the backend supports:
///
/// ```rust,ignore
/// impl BackendClient for RadarrClient {
///     fn key(&self) -> InstanceKey { self.key }
///     fn name(&self) -> &str { &self.name }
///     fn as_movies(&self) -> Option<&dyn MovieLibrary> { Some(self) }
/// }
/// ```
pub trait BackendClient: Send + Sync {
    /// The `(kind, instance_id)` this client was built for.
    fn key(&self) -> InstanceKey;

    /// Human-readable instance name, for logs.
    fn name(&self) -> &str;

    fn kind(&self) -> BackendKind {
        self.key().kind
    }

    fn instance_id(&self) -> InstanceId {
        self.key().instance_id
    }

    fn as_movies(&self) -> Option<&dyn MovieLibrary> {
        None
    }

    fn as_series(&self) -> Option<&dyn SeriesLibrary> {
        None
    }

    fn as_episodes(&self) -> Option<&dyn EpisodeLibrary> {
        None
    }

    fn as_tracks(&self) -> Option<&dyn TrackLibrary> {
        None
    }

    fn as_albums(&self) -> Option<&dyn AlbumLibrary> {
        None
    }

    fn as_artists(&self) -> Option<&dyn ArtistLibrary> {
        None
    }

    fn as_playlists(&self) -> Option<&dyn PlaylistLibrary> {
        None
    }

    fn as_collections(&self) -> Option<&dyn CollectionLibrary> {
        None
    }

    /// Whether this client implements the interface for `capability`.
    fn has_capability(&self, capability: Capability) -> bool {
        match capability {
            Capability::Movies => self.as_movies().is_some(),
            Capability::Series => self.as_series().is_some(),
            Capability::Episodes => self.as_episodes().is_some(),
            Capability::Tracks => self.as_tracks().is_some(),
            Capability::Albums => self.as_albums().is_some(),
            Capability::Artists => self.as_artists().is_some(),
            Capability::Playlists => self.as_playlists().is_some(),
            Capability::Collections => self.as_collections().is_some(),
        }
    }

    /// Every capability this client implements.
    fn capabilities(&self) -> Vec<Capability> {
        Capability::ALL
            .into_iter()
            .filter(|c| self.has_capability(*c))
            .collect()
    }
}
