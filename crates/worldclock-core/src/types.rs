//! Core types for the world clock

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Reserved id of the viewer's own (home) timezone entry
pub const HOME_ENTRY_ID: &str = "local";

/// Stable identifier for a timezone entry
///
/// Ids are opaque strings assigned at creation time and never derived from
/// list position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub String);

impl EntryId {
    /// The reserved home id
    pub fn home() -> Self {
        Self(HOME_ENTRY_ID.to_string())
    }

    /// Build a fresh id from a city name and a creation timestamp
    ///
    /// `"New York"` at `1700000000000` becomes `new-york-1700000000000`.
    pub fn generate(city: &str, created_at_ms: i64) -> Self {
        Self(format!("{}-{}", slugify(city), created_at_ms))
    }

    pub fn is_home(&self) -> bool {
        self.0 == HOME_ENTRY_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase the input and collapse every run of non-alphanumerics into `-`
fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("city");
    }
    slug
}

/// One card on the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimezoneEntry {
    pub id: EntryId,
    pub city: String,
    #[serde(default)]
    pub country: String,
    /// IANA identifier, e.g. `Asia/Dhaka`
    pub timezone: String,
}

impl TimezoneEntry {
    pub fn new(
        id: EntryId,
        city: impl Into<String>,
        country: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            id,
            city: city.into(),
            country: country.into(),
            timezone: timezone.into(),
        }
    }

    pub fn is_home(&self) -> bool {
        self.id.is_home()
    }
}

/// Partial update of an entry's mutable fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub city: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
}

impl EntryPatch {
    /// Patch that replaces the whole city (the "replace city" edit)
    pub fn from_city(city: &CityData) -> Self {
        Self {
            city: Some(city.city.clone()),
            country: Some(city.country.clone()),
            timezone: Some(city.timezone.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.country.is_none() && self.timezone.is_none()
    }
}

/// Row of the static city table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityData {
    pub city: String,
    pub country: String,
    pub timezone: String,
}

impl CityData {
    pub fn new(
        city: impl Into<String>,
        country: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            city: city.into(),
            country: country.into(),
            timezone: timezone.into(),
        }
    }
}

/// Timezone record as stored and returned by the remote sync endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTimezone {
    /// Server-assigned id
    pub id: Ulid,
    /// Client entry id, when the client sent one
    #[serde(default)]
    pub entry_id: Option<EntryId>,
    pub city: String,
    #[serde(default)]
    pub country: String,
    pub timezone: String,
    /// Unix timestamp (ms) of insertion
    pub created_at: i64,
}
