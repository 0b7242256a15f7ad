//! Per-media-type dispatch onto the capability traits.

use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use mg_backend::{BackendClient, Capability, Criteria};
use mg_core::{MediaItem, Result};

/// A media type the aggregator can list.
///
/// Implemented by zero-sized markers ([`Movies`], [`Tracks`], ...). Both calls
/// return `None` when `client` does not implement the matching capability
/// trait.
pub trait Catalog: Send + Sync + 'static {
    const CAPABILITY: Capability;

    fn list<'a>(
        client: &'a dyn BackendClient,
        ctx: &'a CancellationToken,
        criteria: &'a Criteria,
    ) -> Option<BoxFuture<'a, Result<Vec<MediaItem>>>>;

    fn get<'a>(
        client: &'a dyn BackendClient,
        ctx: &'a CancellationToken,
        foreign_id: &'a str,
    ) -> Option<BoxFuture<'a, Result<MediaItem>>>;
}

macro_rules! catalog {
    ($($marker:ident => $cap:ident, $accessor:ident, $list:ident, $get:ident;)+) => {
        $(
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $marker;

            impl Catalog for $marker {
                const CAPABILITY: Capability = Capability::$cap;

                fn list<'a>(
                    client: &'a dyn BackendClient,
                    ctx: &'a CancellationToken,
                    criteria: &'a Criteria,
                ) -> Option<BoxFuture<'a, Result<Vec<MediaItem>>>> {
                    client.$accessor().map(|lib| lib.$list(ctx, criteria))
                }

                fn get<'a>(
                    client: &'a dyn BackendClient,
                    ctx: &'a CancellationToken,
                    foreign_id: &'a str,
                ) -> Option<BoxFuture<'a, Result<MediaItem>>> {
                    client.$accessor().map(|lib| lib.$get(ctx, foreign_id))
                }
            }
        )+
    };
}

catalog! {
    Movies => Movies, as_movies, list_movies, get_movie;
    Series => Series, as_series, list_series, get_series;
    Episodes => Episodes, as_episodes, list_episodes, get_episode;
    Tracks => Tracks, as_tracks, list_tracks, get_track;
    Albums => Albums, as_albums, list_albums, get_album;
    Artists => Artists, as_artists, list_artists, get_artist;
    Playlists => Playlists, as_playlists, list_playlists, get_playlist;
    Collections => Collections, as_collections, list_collections, get_collection;
}
