//! Backend-neutral query criteria and cross-backend ranking.
//!
//! Each client translates a [`Criteria`] into its own query language. Ranking
//! is different: per-backend orderings cannot be compared, so the aggregator
//! re-sorts the merged list itself with [`Criteria::sort_items`] and only then
//! applies the limit.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use mg_core::{MediaDetails, MediaItem};

/// Key used to rank a merged result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Newest `added_at` first by default.
    RecentlyAdded,
    /// Highest `rating` first by default.
    Rating,
    /// Highest `popularity` first by default.
    Popularity,
    /// Case-insensitive title, A to Z by default.
    Title,
    /// `release_date`, falling back to `year`; newest first by default.
    ReleaseYear,
}

impl SortKey {
    pub fn default_order(self) -> SortOrder {
        match self {
            Self::Title => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// What to list. Every field is optional; the default lists everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Criteria {
    /// Free-text title search.
    pub query: Option<String>,
    pub genre: Option<String>,
    pub year: Option<u16>,
    /// Cast, crew, or artist name.
    pub person: Option<String>,
    pub min_rating: Option<f32>,
    pub max_rating: Option<f32>,
    pub sort: Option<SortKey>,
    /// Overrides [`SortKey::default_order`].
    pub order: Option<SortOrder>,
    /// Maximum number of items in the final merged list.
    pub limit: Option<usize>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn person(mut self, person: impl Into<String>) -> Self {
        self.person = Some(person.into());
        self
    }

    pub fn rating_between(mut self, min: f32, max: f32) -> Self {
        self.min_rating = Some(min);
        self.max_rating = Some(max);
        self
    }

    pub fn sort_by(mut self, key: SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Client-side filter for backends that cannot evaluate a field
    /// server-side. Text comparisons are case-insensitive; a rating bound
    /// excludes items without a rating.
    pub fn matches(&self, item: &MediaItem) -> bool {
        let details = item.details();

        if let Some(ref query) = self.query {
            if !contains_ignore_case(&details.title, query) {
                return false;
            }
        }
        if let Some(ref genre) = self.genre {
            if !details.genres.iter().any(|g| g.eq_ignore_ascii_case(genre)) {
                return false;
            }
        }
        if let Some(year) = self.year {
            if details.year != Some(year) {
                return false;
            }
        }
        if let Some(ref person) = self.person {
            if !details.people.iter().any(|p| contains_ignore_case(p, person)) {
                return false;
            }
        }
        if self.min_rating.is_some() || self.max_rating.is_some() {
            let Some(rating) = known_rating(details) else {
                return false;
            };
            if self.min_rating.is_some_and(|min| rating < min)
                || self.max_rating.is_some_and(|max| rating > max)
            {
                return false;
            }
        }
        true
    }

    /// Stable sort by the requested key; a no-op without one. Items missing
    /// the key sort last in either direction.
    pub fn sort_items(&self, items: &mut [MediaItem]) {
        let Some(key) = self.sort else {
            return;
        };
        let order = self.order.unwrap_or_else(|| key.default_order());
        items.sort_by(|a, b| compare(key, order, a.details(), b.details()));
    }

    /// Sort, then truncate to the limit.
    pub fn apply(&self, items: &mut Vec<MediaItem>) {
        self.sort_items(items);
        if let Some(limit) = self.limit {
            items.truncate(limit);
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn compare(key: SortKey, order: SortOrder, a: &MediaDetails, b: &MediaDetails) -> Ordering {
    match key {
        SortKey::RecentlyAdded => compare_present(a.added_at, b.added_at, order),
        SortKey::Rating => compare_present(known_rating(a), known_rating(b), order),
        SortKey::Popularity => compare_present(a.popularity, b.popularity, order),
        SortKey::ReleaseYear => compare_present(release_key(a), release_key(b), order),
        SortKey::Title => {
            let ord = a.title.to_lowercase().cmp(&b.title.to_lowercase());
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
    }
}

/// A NaN rating counts as no rating at all.
fn known_rating(details: &MediaDetails) -> Option<f32> {
    details.rating.filter(|r| !r.is_nan())
}

fn release_key(details: &MediaDetails) -> Option<(i32, u32)> {
    use chrono::Datelike;

    details
        .release_date
        .map(|d| (d.year(), d.ordinal()))
        .or_else(|| details.year.map(|y| (i32::from(y), 0)))
}

fn compare_present<T: PartialOrd>(a: Option<T>, b: Option<T>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            // Callers filter out unordered values, so this is total.
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
