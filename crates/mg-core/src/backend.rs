//! Backend families, instance keys, and capability tags.
//!
//! All enums serialize in lowercase (via `serde(rename_all = "lowercase")`) and
//! implement `Display` manually for consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::InstanceId;
use crate::media::MediaType;

// ---------------------------------------------------------------------------
// BackendKind
// ---------------------------------------------------------------------------

/// Supported backend products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Plex,
    Jellyfin,
    Emby,
    Subsonic,
    Radarr,
    Sonarr,
    Lidarr,
}

impl BackendKind {
    /// Every supported kind, in declaration order.
    pub const ALL: [BackendKind; 7] = [
        Self::Plex,
        Self::Jellyfin,
        Self::Emby,
        Self::Subsonic,
        Self::Radarr,
        Self::Sonarr,
        Self::Lidarr,
    ];

    /// The broad family this product belongs to.
    pub fn family(self) -> BackendFamily {
        match self {
            Self::Plex | Self::Jellyfin | Self::Emby => BackendFamily::MediaServer,
            Self::Subsonic => BackendFamily::MusicServer,
            Self::Radarr | Self::Sonarr | Self::Lidarr => BackendFamily::Automation,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Plex => "plex",
            Self::Jellyfin => "jellyfin",
            Self::Emby => "emby",
            Self::Subsonic => "subsonic",
            Self::Radarr => "radarr",
            Self::Sonarr => "sonarr",
            Self::Lidarr => "lidarr",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown backend kind: {s}"))
    }
}

// ---------------------------------------------------------------------------
// BackendFamily
// ---------------------------------------------------------------------------

/// Coarse grouping of backend products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendFamily {
    /// Plex-like and Jellyfin-like servers.
    MediaServer,
    /// Subsonic-like music servers.
    MusicServer,
    /// Radarr/Sonarr-like automation tools.
    Automation,
}

impl fmt::Display for BackendFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MediaServer => write!(f, "media_server"),
            Self::MusicServer => write!(f, "music_server"),
            Self::Automation => write!(f, "automation"),
        }
    }
}

// ---------------------------------------------------------------------------
// InstanceKey
// ---------------------------------------------------------------------------

/// Identifies one configured backend connection: `(kind, instance_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceKey {
    pub kind: BackendKind,
    pub instance_id: InstanceId,
}

impl InstanceKey {
    pub fn new(kind: BackendKind, instance_id: impl Into<InstanceId>) -> Self {
        Self {
            kind,
            instance_id: instance_id.into(),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.instance_id)
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// A narrow feature a backend client may or may not offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Movies,
    Series,
    Episodes,
    Tracks,
    Albums,
    Artists,
    Playlists,
    Collections,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Self::Movies,
        Self::Series,
        Self::Episodes,
        Self::Tracks,
        Self::Albums,
        Self::Artists,
        Self::Playlists,
        Self::Collections,
    ];

    /// The media type a client with this capability lists.
    pub fn media_type(self) -> MediaType {
        match self {
            Self::Movies => MediaType::Movie,
            Self::Series => MediaType::Series,
            Self::Episodes => MediaType::Episode,
            Self::Tracks => MediaType::Track,
            Self::Albums => MediaType::Album,
            Self::Artists => MediaType::Artist,
            Self::Playlists => MediaType::Playlist,
            Self::Collections => MediaType::Collection,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movies => write!(f, "movies"),
            Self::Series => write!(f, "series"),
            Self::Episodes => write!(f, "episodes"),
            Self::Tracks => write!(f, "tracks"),
            Self::Albums => write!(f, "albums"),
            Self::Artists => write!(f, "artists"),
            Self::Playlists => write!(f, "playlists"),
            Self::Collections => write!(f, "collections"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_and_serde() {
        assert_eq!(BackendKind::Plex.to_string(), "plex");
        let json = serde_json::to_string(&BackendKind::Subsonic).unwrap();
        assert_eq!(json, r#""subsonic""#);
        let back: BackendKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BackendKind::Subsonic);
    }

    #[test]
    fn kind_from_str_is_case_insensitive() {
        assert_eq!("Jellyfin".parse::<BackendKind>().unwrap(), BackendKind::Jellyfin);
        assert!("kodi".parse::<BackendKind>().is_err());
    }

    #[test]
    fn families() {
        assert_eq!(BackendKind::Emby.family(), BackendFamily::MediaServer);
        assert_eq!(BackendKind::Subsonic.family(), BackendFamily::MusicServer);
        assert_eq!(BackendKind::Lidarr.family(), BackendFamily::Automation);
    }

    #[test]
    fn instance_key_display() {
        let key = InstanceKey::new(BackendKind::Radarr, 3);
        assert_eq!(key.to_string(), "radarr:3");
    }

    #[test]
    fn instance_keys_differ_by_kind() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(InstanceKey::new(BackendKind::Plex, 1));
        set.insert(InstanceKey::new(BackendKind::Jellyfin, 1));
        set.insert(InstanceKey::new(BackendKind::Plex, 1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn capability_media_types() {
        assert_eq!(Capability::Movies.media_type(), MediaType::Movie);
        assert_eq!(Capability::Collections.media_type(), MediaType::Collection);
        assert_eq!(Capability::ALL.len(), 8);
    }
}
