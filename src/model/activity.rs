use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::io::codec::lenient;
use crate::model::lodging::LodgingEntryId;

/// Stable identifier of a planned activity (`A-001`, `A-002`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(String);

impl ActivityId {
    pub fn new(raw: impl Into<String>) -> Self {
        ActivityId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySource {
    Search,
    #[default]
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActivityPricing {
    #[serde(default)]
    pub base: f64,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub discounted: bool,
    /// Pre-discount price, shown struck through.
    #[serde(default)]
    pub original: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ActivityRating {
    #[serde(default)]
    pub average: f32,
    #[serde(default)]
    pub count: u32,
}

/// Optional scheduled date plus time of day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScheduledSlot {
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<NaiveTime>,
}

/// A planned or booked activity. `destination` is a foreign key into the
/// lodging store; city/country are denormalized so the card keeps rendering
/// even if the lodging entry is edited later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: ActivityId,
    pub destination: LodgingEntryId,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub pricing: ActivityPricing,
    #[serde(default)]
    pub rating: ActivityRating,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub slot: Option<ScheduledSlot>,
    #[serde(default)]
    pub source: ActivitySource,
    #[serde(default)]
    pub booked: bool,
    #[serde(default)]
    pub user_modified: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Fields for a manually entered activity.
#[derive(Debug, Clone, Default)]
pub struct ActivityDraft {
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub pricing: Option<ActivityPricing>,
    pub duration_minutes: Option<u32>,
    pub slot: Option<ScheduledSlot>,
}

/// Partial update for a planned activity; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ActivityPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    pub pricing: Option<ActivityPricing>,
    pub duration_minutes: Option<u32>,
    pub slot: Option<ScheduledSlot>,
    pub booked: Option<bool>,
}

impl ActivityPatch {
    pub fn apply(&self, entry: &mut ActivityEntry) {
        if let Some(title) = &self.title {
            entry.title = title.clone();
        }
        if let Some(description) = &self.description {
            entry.description = description.clone();
        }
        if let Some(categories) = &self.categories {
            entry.categories = categories.clone();
        }
        if let Some(pricing) = &self.pricing {
            entry.pricing = pricing.clone();
        }
        if let Some(duration) = self.duration_minutes {
            entry.duration_minutes = Some(duration);
        }
        if let Some(slot) = self.slot {
            entry.slot = Some(slot);
        }
        if let Some(booked) = self.booked {
            entry.booked = booked;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DurationBucket {
    UpToTwoHours,
    HalfDay,
    FullDay,
    MultiDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

/// The active search-filter bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityFilters {
    #[serde(default)]
    pub categories: IndexSet<String>,
    #[serde(default)]
    pub price_min: u32,
    #[serde(default = "default_price_max")]
    pub price_max: u32,
    #[serde(default)]
    pub min_rating: f32,
    #[serde(default)]
    pub duration: Option<DurationBucket>,
    #[serde(default)]
    pub time_of_day: Option<TimeOfDay>,
}

fn default_price_max() -> u32 {
    180
}

impl Default for ActivityFilters {
    fn default() -> Self {
        ActivityFilters {
            categories: IndexSet::new(),
            price_min: 0,
            price_max: default_price_max(),
            min_rating: 0.0,
            duration: None,
            time_of_day: None,
        }
    }
}

/// Plain merge into the filter bundle; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilterPatch {
    pub categories: Option<IndexSet<String>>,
    pub price_range: Option<(u32, u32)>,
    pub min_rating: Option<f32>,
    pub duration: Option<DurationBucket>,
    pub time_of_day: Option<TimeOfDay>,
}

/// Price-range default derived from the traveler comfort scalar, applied
/// until the user overrides the price filter in the session.
pub fn price_range_for_comfort(level: f64) -> (u32, u32) {
    if level < 0.25 {
        (0, 80)
    } else if level < 0.5 {
        (0, 180)
    } else if level < 0.75 {
        (80, 350)
    } else {
        (180, 500)
    }
}

/// A transient search/recommendation candidate. Never persisted; it becomes
/// an [`ActivityEntry`] only through an explicit add.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityResult {
    /// The external service's own reference for this candidate.
    pub result_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub media: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub pricing: ActivityPricing,
    #[serde(default)]
    pub rating: ActivityRating,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

/// One page of results plus the cursor for the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ResultPage {
    pub items: Vec<ActivityResult>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}
