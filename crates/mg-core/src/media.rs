//! Backend-neutral media model.
//!
//! A [`MediaItem`] wraps exactly one [`MediaData`] variant. The item's
//! [`MediaType`] is derived from that variant rather than stored next to it,
//! so the two can never disagree.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::backend::InstanceKey;
use crate::identity::{ExternalIdentities, ExternalIdentity, SyncStatus};
use crate::ids::ItemId;

// ---------------------------------------------------------------------------
// MediaType
// ---------------------------------------------------------------------------

/// Kind of media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
    Episode,
    Track,
    Album,
    Artist,
    Collection,
    Playlist,
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Movie => write!(f, "movie"),
            Self::Series => write!(f, "series"),
            Self::Episode => write!(f, "episode"),
            Self::Track => write!(f, "track"),
            Self::Album => write!(f, "album"),
            Self::Artist => write!(f, "artist"),
            Self::Collection => write!(f, "collection"),
            Self::Playlist => write!(f, "playlist"),
        }
    }
}

// ---------------------------------------------------------------------------
// MediaDetails
// ---------------------------------------------------------------------------

/// Fields every media kind carries; these drive filtering and ranking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaDetails {
    pub title: String,
    pub year: Option<u16>,
    pub overview: Option<String>,
    pub genres: Vec<String>,
    /// Cast, crew, or performing artists.
    pub people: Vec<String>,
    /// Community rating on a 0.0 - 10.0 scale.
    pub rating: Option<f32>,
    /// Backend-reported play or view count.
    pub popularity: Option<u64>,
    /// When the backend first saw the item.
    pub added_at: Option<DateTime<Utc>>,
    pub release_date: Option<NaiveDate>,
}

impl MediaDetails {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Concrete kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub details: MediaDetails,
    #[serde(default)]
    pub runtime_minutes: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub details: MediaDetails,
    #[serde(default)]
    pub season_count: Option<u32>,
    /// Airing status as reported by the backend ("continuing", "ended", ...).
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub details: MediaDetails,
    #[serde(default)]
    pub series_title: Option<String>,
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub episode_number: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub details: MediaDetails,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub track_number: Option<u32>,
    #[serde(default)]
    pub duration_secs: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub details: MediaDetails,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub track_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub details: MediaDetails,
    #[serde(default)]
    pub album_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub details: MediaDetails,
    #[serde(default)]
    pub item_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub details: MediaDetails,
    #[serde(default)]
    pub item_count: Option<u32>,
    #[serde(default)]
    pub owner: Option<String>,
}

// ---------------------------------------------------------------------------
// MediaData
// ---------------------------------------------------------------------------

/// The concrete payload of a [`MediaItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaData {
    Movie(Movie),
    Series(Series),
    Episode(Episode),
    Track(Track),
    Album(Album),
    Artist(Artist),
    Collection(Collection),
    Playlist(Playlist),
}

impl MediaData {
    pub fn media_type(&self) -> MediaType {
        match self {
            Self::Movie(_) => MediaType::Movie,
            Self::Series(_) => MediaType::Series,
            Self::Episode(_) => MediaType::Episode,
            Self::Track(_) => MediaType::Track,
            Self::Album(_) => MediaType::Album,
            Self::Artist(_) => MediaType::Artist,
            Self::Collection(_) => MediaType::Collection,
            Self::Playlist(_) => MediaType::Playlist,
        }
    }

    pub fn details(&self) -> &MediaDetails {
        match self {
            Self::Movie(m) => &m.details,
            Self::Series(s) => &s.details,
            Self::Episode(e) => &e.details,
            Self::Track(t) => &t.details,
            Self::Album(a) => &a.details,
            Self::Artist(a) => &a.details,
            Self::Collection(c) => &c.details,
            Self::Playlist(p) => &p.details,
        }
    }
}

macro_rules! media_data_from {
    ($($kind:ident),+ $(,)?) => {
        $(
            impl From<$kind> for MediaData {
                fn from(value: $kind) -> Self {
                    MediaData::$kind(value)
                }
            }
        )+
    };
}

media_data_from!(Movie, Series, Episode, Track, Album, Artist, Collection, Playlist);

// ---------------------------------------------------------------------------
// MediaItem
// ---------------------------------------------------------------------------

/// A media item in the internal model, plus its identities on each backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: ItemId,
    pub data: MediaData,
    /// Backend instance this copy was read from, when it came from one.
    #[serde(default)]
    pub origin: Option<InstanceKey>,
    #[serde(default)]
    pub identities: ExternalIdentities,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaItem {
    /// Wrap `data` in a fresh item with a new ID and no identities.
    pub fn new(data: impl Into<MediaData>) -> Self {
        let now = Utc::now();
        Self {
            id: ItemId::new(),
            data: data.into(),
            origin: None,
            identities: ExternalIdentities::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder: record which backend instance produced this item and attach
    /// its foreign ID there.
    pub fn from_backend(
        data: impl Into<MediaData>,
        key: InstanceKey,
        foreign_id: impl Into<String>,
    ) -> Self {
        let mut item = Self::new(data);
        item.origin = Some(key);
        item.identities.attach(key, foreign_id);
        item
    }

    pub fn media_type(&self) -> MediaType {
        self.data.media_type()
    }

    pub fn details(&self) -> &MediaDetails {
        self.data.details()
    }

    pub fn title(&self) -> &str {
        &self.details().title
    }

    // -- Identity reconciliation ---------------------------------------------

    /// See [`ExternalIdentities::attach`].
    pub fn attach_identity(&mut self, key: InstanceKey, foreign_id: impl Into<String>) {
        self.identities.attach(key, foreign_id);
        self.touch();
    }

    /// See [`ExternalIdentities::merge`].
    pub fn merge_identities<I>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = ExternalIdentity>,
    {
        if self.identities.merge(incoming) {
            self.touch();
        }
    }

    /// See [`ExternalIdentities::update_sync_status`].
    pub fn update_sync_status(&mut self, key: InstanceKey, status: SyncStatus) -> bool {
        let updated = self.identities.update_sync_status(key, status);
        if updated {
            self.touch();
        }
        updated
    }

    pub fn lookup_identity(&self, key: InstanceKey) -> Option<&ExternalIdentity> {
        self.identities.lookup(key)
    }

    pub fn foreign_id_for(&self, key: InstanceKey) -> &str {
        self.identities.foreign_id_for(key)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;

    fn plex() -> InstanceKey {
        InstanceKey::new(BackendKind::Plex, 1)
    }

    #[test]
    fn media_type_follows_data() {
        let item = MediaItem::new(Movie {
            details: MediaDetails::titled("Heat"),
            runtime_minutes: Some(170),
        });
        assert_eq!(item.media_type(), MediaType::Movie);
        assert_eq!(item.title(), "Heat");

        let item = MediaItem::new(Track::default());
        assert_eq!(item.media_type(), MediaType::Track);
    }

    #[test]
    fn media_type_display() {
        assert_eq!(MediaType::Series.to_string(), "series");
        assert_eq!(MediaType::Playlist.to_string(), "playlist");
    }

    #[test]
    fn data_serializes_with_type_tag() {
        let data = MediaData::from(Album {
            details: MediaDetails::titled("Kid A"),
            artist: Some("Radiohead".into()),
            track_count: Some(10),
        });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "album");
        assert_eq!(json["details"]["title"], "Kid A");
        assert_eq!(json["artist"], "Radiohead");
        assert!(json.get("content").is_none());

        let back: MediaData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn type_tag_selects_kind() {
        let json = r#"{"type":"track","details":{"title":"x"}}"#;
        let data: MediaData = serde_json::from_str(json).unwrap();
        assert_eq!(data.media_type(), MediaType::Track);

        let json = r#"{"type":"podcast","details":{"title":"x"}}"#;
        assert!(serde_json::from_str::<MediaData>(json).is_err());
    }

    #[test]
    fn from_backend_attaches_identity() {
        let item = MediaItem::from_backend(Movie::default(), plex(), "rk-55");
        assert_eq!(item.origin, Some(plex()));
        assert_eq!(item.foreign_id_for(plex()), "rk-55");
        assert_eq!(
            item.lookup_identity(plex()).unwrap().sync_status,
            SyncStatus::Pending
        );
    }

    #[test]
    fn status_update_touches_item() {
        let mut item = MediaItem::from_backend(Movie::default(), plex(), "rk-55");
        let before = item.updated_at;
        assert!(item.update_sync_status(plex(), SyncStatus::Success));
        assert!(item.updated_at >= before);

        let other = InstanceKey::new(BackendKind::Emby, 1);
        assert!(!item.update_sync_status(other, SyncStatus::Failed));
    }
}
