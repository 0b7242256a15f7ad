//! Per-backend identity records for media items.
//!
//! Every [`MediaItem`](crate::MediaItem) carries an [`ExternalIdentities`] set:
//! one [`ExternalIdentity`] per backend instance that knows the item, holding
//! the backend's own ID for it and the outcome of the last sync.
//!
//! The set is keyed by [`InstanceKey`]; it never holds two records for the same
//! `(kind, instance_id)`. Records are only removed by an explicit
//! [`ExternalIdentities::remove`].
//!
//! # Storage format
//!
//! The set is stored as a JSON array. An empty set encodes as `[]`, never
//! `null`, and `null` or an empty string decode back to the empty set:
//!
//! ```json
//! [{"kind":"plex","instance_id":3,"item_id":"1234",
//!   "last_synced_at":"2024-05-01T10:00:00Z","sync_status":"success"}]
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::backend::{BackendKind, InstanceKey};
use crate::error::Result;
use crate::ids::InstanceId;

// ---------------------------------------------------------------------------
// SyncStatus
// ---------------------------------------------------------------------------

/// Outcome of the last sync of one item against one backend instance.
///
/// Expected progression is `Unknown -> Pending -> Success | Failed`, with
/// `Success` and `Failed` going back to `Pending` on the next attempt. No
/// status is terminal and nothing here enforces the order; the sync job owns
/// the transitions and this type only records them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Unknown,
    Pending,
    Success,
    Failed,
}

impl SyncStatus {
    /// `true` once a sync attempt has produced an outcome.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Pending => write!(f, "pending"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// ExternalIdentity
// ---------------------------------------------------------------------------

/// The identity of one media item on one backend instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub kind: BackendKind,
    pub instance_id: InstanceId,
    /// The backend's own identifier for the item.
    pub item_id: String,
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sync_status: SyncStatus,
}

impl ExternalIdentity {
    /// A record with [`SyncStatus::Unknown`] that has never been synced.
    pub fn new(key: InstanceKey, item_id: impl Into<String>) -> Self {
        Self {
            kind: key.kind,
            instance_id: key.instance_id,
            item_id: item_id.into(),
            last_synced_at: None,
            sync_status: SyncStatus::Unknown,
        }
    }

    /// Builder: set the sync outcome and when it was observed.
    pub fn with_status(mut self, status: SyncStatus, at: DateTime<Utc>) -> Self {
        self.sync_status = status;
        self.last_synced_at = Some(at);
        self
    }

    pub fn key(&self) -> InstanceKey {
        InstanceKey {
            kind: self.kind,
            instance_id: self.instance_id,
        }
    }
}

// ---------------------------------------------------------------------------
// ExternalIdentities
// ---------------------------------------------------------------------------

/// The set of identities of one media item, unique per [`InstanceKey`].
///
/// Records keep their insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExternalIdentities(Vec<ExternalIdentity>);

impl ExternalIdentities {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExternalIdentity> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = InstanceKey> + '_ {
        self.0.iter().map(ExternalIdentity::key)
    }

    fn position(&self, key: InstanceKey) -> Option<usize> {
        self.0.iter().position(|r| r.key() == key)
    }

    /// Record that `key` knows this item as `foreign_id`.
    ///
    /// A new record starts as [`SyncStatus::Pending`] stamped with the current
    /// time. If a record for `key` already exists only its foreign ID changes.
    pub fn attach(&mut self, key: InstanceKey, foreign_id: impl Into<String>) {
        let foreign_id = foreign_id.into();
        match self.position(key) {
            Some(idx) => self.0[idx].item_id = foreign_id,
            None => self.0.push(
                ExternalIdentity::new(key, foreign_id).with_status(SyncStatus::Pending, Utc::now()),
            ),
        }
    }

    /// Upsert `incoming` records by `(kind, instance_id)`.
    ///
    /// Existing records only get their foreign ID overwritten; sync status and
    /// timestamp change only through [`update_sync_status`](Self::update_sync_status).
    /// Unknown keys are appended as given. Merging the same input twice leaves
    /// the set as merging it once. Returns whether anything changed.
    pub fn merge<I>(&mut self, incoming: I) -> bool
    where
        I: IntoIterator<Item = ExternalIdentity>,
    {
        let mut changed = false;
        for record in incoming {
            match self.position(record.key()) {
                Some(idx) => {
                    let existing = &mut self.0[idx];
                    if existing.item_id != record.item_id {
                        existing.item_id = record.item_id;
                        changed = true;
                    }
                }
                None => {
                    self.0.push(record);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Set the sync status for `key` and stamp it with the current time.
    ///
    /// Does nothing when no record exists for `key`; call
    /// [`attach`](Self::attach) first to create one. Returns whether a record
    /// was updated.
    pub fn update_sync_status(&mut self, key: InstanceKey, status: SyncStatus) -> bool {
        match self.position(key) {
            Some(idx) => {
                let record = &mut self.0[idx];
                record.sync_status = status;
                record.last_synced_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    pub fn lookup(&self, key: InstanceKey) -> Option<&ExternalIdentity> {
        self.0.iter().find(|r| r.key() == key)
    }

    /// The foreign ID on `key`, or `""` when the item is unknown there.
    pub fn foreign_id_for(&self, key: InstanceKey) -> &str {
        self.lookup(key).map(|r| r.item_id.as_str()).unwrap_or("")
    }

    /// Explicitly drop the record for `key`.
    pub fn remove(&mut self, key: InstanceKey) -> Option<ExternalIdentity> {
        self.position(key).map(|idx| self.0.remove(idx))
    }

    /// Records that still need a sync attempt to settle.
    pub fn pending(&self) -> impl Iterator<Item = &ExternalIdentity> {
        self.0.iter().filter(|r| !r.sync_status.is_settled())
    }

    /// Encode for storage. An empty set yields `"[]"`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Decode from storage. `null`, `""` and `[]` all yield the empty set.
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::new());
        }
        Ok(serde_json::from_str(json)?)
    }
}

impl FromIterator<ExternalIdentity> for ExternalIdentities {
    /// Collects records, keeping the last one seen for each key.
    fn from_iter<T: IntoIterator<Item = ExternalIdentity>>(iter: T) -> Self {
        let mut set = Self::new();
        for record in iter {
            match set.position(record.key()) {
                Some(idx) => set.0[idx] = record,
                None => set.0.push(record),
            }
        }
        set
    }
}

impl<'a> IntoIterator for &'a ExternalIdentities {
    type Item = &'a ExternalIdentity;
    type IntoIter = std::slice::Iter<'a, ExternalIdentity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for ExternalIdentities {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let records = Option::<Vec<ExternalIdentity>>::deserialize(deserializer)?;
        Ok(records.unwrap_or_default().into_iter().collect())
    }
}
