//! mg-core: shared types, IDs, errors, configuration, and identity records.
//!
//! This crate is the foundational dependency for the other mg-* crates,
//! providing type-safe identifiers, a unified error type, the backend-neutral
//! media model, per-backend identity bookkeeping, and application
//! configuration. It has no async runtime dependency.

pub mod backend;
pub mod config;
pub mod error;
pub mod identity;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use backend::{BackendFamily, BackendKind, Capability, InstanceKey};
pub use error::{Error, Result};
pub use identity::{ExternalIdentities, ExternalIdentity, SyncStatus};
pub use ids::*;
pub use media::*;
