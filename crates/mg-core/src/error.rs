//! Unified error type for mediagate.
//!
//! All crates funnel their failures into [`Error`]. The variants keep
//! "backend is configured but cannot do this" ([`Error::UnsupportedCapability`])
//! apart from "backend is broken or unreachable" ([`Error::Backend`],
//! [`Error::Timeout`]), so callers can hide a feature instead of reporting
//! an outage.

use std::fmt;

use crate::backend::{BackendKind, Capability, InstanceKey};
use crate::ids::UserId;
use crate::media::MediaType;

/// Unified error type covering all failure modes in mediagate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No client factory was registered for this backend kind.
    #[error("no client factory registered for backend kind '{0}'")]
    FactoryNotRegistered(BackendKind),

    /// The selected backend instance does not implement the needed capability.
    #[error("backend {key} does not support {capability}")]
    UnsupportedCapability {
        /// The instance that was asked.
        key: InstanceKey,
        /// The capability it lacks.
        capability: Capability,
    },

    /// A transport or authentication failure talking to a backend.
    #[error("backend {key} failed during {operation}: {message}")]
    Backend {
        /// The instance that failed.
        key: InstanceKey,
        /// What we were doing (e.g. "connect", "list movies").
        operation: String,
        /// Human-readable error description.
        message: String,
    },

    /// A backend call did not finish within its deadline.
    #[error("backend {key} timed out during {operation}")]
    Timeout {
        /// The instance that timed out.
        key: InstanceKey,
        /// What we were doing.
        operation: String,
    },

    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "instance", "movie").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// The user has no enabled backend instances at all.
    #[error("user {0} has no configured backend instances")]
    NoInstances(UserId),

    /// Every backend that was tried for an aggregate query failed.
    #[error("all {attempted} backend(s) failed while listing {media_type}: {last_error}")]
    AllBackendsFailed {
        /// The media type being aggregated.
        media_type: MediaType,
        /// How many instances were attempted.
        attempted: usize,
        /// Description of the last failure observed.
        last_error: String,
    },

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration is missing or malformed.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON (de)serialization failed.
    #[error("Serialization error: {source}")]
    Serialization {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::Backend`].
    pub fn backend(
        key: InstanceKey,
        operation: impl Into<String>,
        message: impl fmt::Display,
    ) -> Self {
        Error::Backend {
            key,
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Convenience constructor for [`Error::UnsupportedCapability`].
    pub fn unsupported(key: InstanceKey, capability: Capability) -> Self {
        Error::UnsupportedCapability { key, capability }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Timeout`].
    pub fn timeout(key: InstanceKey, operation: impl Into<String>) -> Self {
        Error::Timeout {
            key,
            operation: operation.into(),
        }
    }

    /// Attach the instance and operation to an error raised while talking
    /// to a backend. Errors that already name their instance, a backend's
    /// own "not found" answer, and cancellation pass through unchanged.
    pub fn with_context(self, key: InstanceKey, operation: &str) -> Self {
        match self {
            Error::Backend { .. }
            | Error::Timeout { .. }
            | Error::UnsupportedCapability { .. }
            | Error::FactoryNotRegistered(_)
            | Error::NotFound { .. }
            | Error::Cancelled => self,
            other => Error::backend(key, operation, other),
        }
    }

    /// Whether the failure is transient and worth retrying later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Backend { .. } | Error::Timeout { .. })
    }

    /// Whether this is the "configured but lacks the feature" case.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Error::UnsupportedCapability { .. })
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> InstanceKey {
        InstanceKey::new(BackendKind::Plex, 1)
    }

    #[test]
    fn factory_not_registered_display() {
        let err = Error::FactoryNotRegistered(BackendKind::Emby);
        assert_eq!(
            err.to_string(),
            "no client factory registered for backend kind 'emby'"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn unsupported_display() {
        let err = Error::unsupported(key(), Capability::Tracks);
        assert_eq!(err.to_string(), "backend plex:1 does not support tracks");
        assert!(err.is_unsupported());
        assert!(!err.is_retryable());
    }

    #[test]
    fn backend_display() {
        let err = Error::backend(key(), "list movies", "connection refused");
        assert_eq!(
            err.to_string(),
            "backend plex:1 failed during list movies: connection refused"
        );
        assert!(err.is_retryable());
        assert!(!err.is_unsupported());
    }

    #[test]
    fn timeout_is_retryable() {
        let err = Error::timeout(key(), "get movie");
        assert_eq!(err.to_string(), "backend plex:1 timed out during get movie");
        assert!(err.is_retryable());
    }

    #[test]
    fn not_found_display() {
        let err = Error::not_found("instance", "plex:9");
        assert_eq!(err.to_string(), "instance not found: plex:9");
    }

    #[test]
    fn all_failed_display() {
        let err = Error::AllBackendsFailed {
            media_type: MediaType::Movie,
            attempted: 2,
            last_error: "boom".into(),
        };
        assert_eq!(
            err.to_string(),
            "all 2 backend(s) failed while listing movie: boom"
        );
    }

    #[test]
    fn serialization_from_serde() {
        let serde_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = Error::from(serde_err);
        assert!(matches!(err, Error::Serialization { .. }));
    }

    #[test]
    fn with_context_wraps_foreign_errors() {
        let serde_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = Error::from(serde_err).with_context(key(), "get movie");
        match &err {
            Error::Backend { key: k, operation, message } => {
                assert_eq!(*k, key());
                assert_eq!(operation, "get movie");
                assert!(message.starts_with("Serialization error:"));
            }
            other => panic!("expected backend error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("backend plex:1 failed during get movie:"));

        let err = Error::Internal("unexpected EOF".into()).with_context(key(), "list movies");
        assert_eq!(
            err.to_string(),
            "backend plex:1 failed during list movies: Internal error: unexpected EOF"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn with_context_keeps_instance_errors() {
        let other = InstanceKey::new(BackendKind::Jellyfin, 4);
        let err = Error::backend(other, "connect", "refused").with_context(key(), "list movies");
        assert_eq!(err.to_string(), "backend jellyfin:4 failed during connect: refused");

        let err = Error::timeout(other, "get movie").with_context(key(), "list movies");
        assert!(matches!(err, Error::Timeout { key: k, .. } if k == other));

        let err = Error::unsupported(other, Capability::Tracks).with_context(key(), "list tracks");
        assert!(err.is_unsupported());

        let err = Error::not_found("movie", "abc").with_context(key(), "get movie");
        assert_eq!(err.to_string(), "movie not found: abc");

        assert!(matches!(
            Error::Cancelled.with_context(key(), "get movie"),
            Error::Cancelled
        ));
        assert!(matches!(
            Error::FactoryNotRegistered(BackendKind::Emby).with_context(key(), "connect"),
            Error::FactoryNotRegistered(BackendKind::Emby)
        ));
    }
}
