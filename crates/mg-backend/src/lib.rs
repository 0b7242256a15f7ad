//! # mg-backend
//!
//! The contract between mediagate and the vendor-specific backend clients.
//!
//! This crate provides:
//!
//! - **[`BackendClient`]** -- the handle every vendor client exposes, with an
//!   explicit capability query and typed accessors for each capability.
//! - **Capability traits** ([`MovieLibrary`], [`TrackLibrary`], ...) -- one
//!   narrow async interface per media type. A client supports a media type if
//!   and only if it returns the matching accessor.
//! - **[`Criteria`]** -- the backend-neutral query passed to every list call.
//! - **[`ClientFactory`]** -- how a live client gets built for an instance.
//! - **[`ClientRegistry`]** -- the process-wide cache of live clients, one per
//!   `(kind, instance_id)`.

pub mod capability;
pub mod criteria;
pub mod factory;
pub mod registry;

// Re-export key types at the crate root.
pub use capability::{
    AlbumLibrary, ArtistLibrary, BackendClient, CollectionLibrary, EpisodeLibrary, MovieLibrary,
    PlaylistLibrary, SeriesLibrary, TrackLibrary,
};
pub use criteria::{Criteria, SortKey, SortOrder};
pub use factory::ClientFactory;
pub use mg_core::Capability;
pub use registry::ClientRegistry;
pub use tokio_util::sync::CancellationToken;
