//! Mediagate - one view over many media backends
//!
//! This library crate wires the backend registry to per-media-type
//! aggregation services and exposes them for the binary and for integration
//! testing.

pub mod aggregate;
pub mod config;
pub mod hub;
pub mod instances;

pub use aggregate::{AggregationService, Aggregated, InstanceFailure};
pub use hub::{InstanceCapabilities, MediaHub};
pub use instances::{ConfigInstanceStore, InstanceStore};
