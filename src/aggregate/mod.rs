//! Multi-backend aggregation, one service per media type.
//!
//! [`AggregationService`] is generic over a [`Catalog`] marker that selects
//! the capability to query. The aliases below are what callers normally use.

pub mod catalog;
pub mod service;

pub use catalog::{Albums, Artists, Catalog, Collections, Episodes, Movies, Playlists, Series, Tracks};
pub use service::{AggregationService, Aggregated, InstanceFailure};

pub type MovieService = AggregationService<Movies>;
pub type SeriesService = AggregationService<Series>;
pub type EpisodeService = AggregationService<Episodes>;
pub type TrackService = AggregationService<Tracks>;
pub type AlbumService = AggregationService<Albums>;
pub type ArtistService = AggregationService<Artists>;
pub type PlaylistService = AggregationService<Playlists>;
pub type CollectionService = AggregationService<Collections>;
