use chrono::NaiveDate;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::io::codec::lenient;

/// Stable identifier of a lodging entry (`L-001`, `L-002`, ...).
///
/// This is the canonical "destination identifier": activity entries hold it
/// as a foreign key, and the reconciliation pass prunes them when it
/// disappears.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LodgingEntryId(String);

impl LodgingEntryId {
    pub fn new(raw: impl Into<String>) -> Self {
        LodgingEntryId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LodgingEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named nightly-budget range, or `Custom` for user-supplied bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BudgetPreset {
    Eco,
    #[default]
    Comfort,
    Premium,
    Luxury,
    Custom,
}

impl BudgetPreset {
    /// Fixed per-night bounds for the named presets; `Custom` has none.
    pub fn range(self) -> Option<(u32, u32)> {
        match self {
            BudgetPreset::Eco => Some((0, 80)),
            BudgetPreset::Comfort => Some((80, 180)),
            BudgetPreset::Premium => Some((180, 350)),
            BudgetPreset::Luxury => Some((350, 800)),
            BudgetPreset::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyType {
    Hotel,
    Apartment,
    Villa,
    GuestHouse,
    Hostel,
    Resort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MealPlan {
    RoomOnly,
    Breakfast,
    HalfBoard,
    FullBoard,
    AllInclusive,
}

/// The advanced-filter bundle. Deep-merged on update (old persisted data
/// must survive new optional fields), so every field defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AdvancedFilters {
    #[serde(default)]
    pub meal_plan: Option<MealPlan>,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub services: IndexSet<String>,
    #[serde(default)]
    pub accessibility: IndexSet<String>,
}

/// Field-wise merge into an [`AdvancedFilters`] bundle; untouched fields
/// keep their current value.
#[derive(Debug, Clone, Default)]
pub struct AdvancedFiltersPatch {
    pub meal_plan: Option<MealPlan>,
    pub view: Option<String>,
    pub services: Option<IndexSet<String>>,
    pub accessibility: Option<IndexSet<String>>,
}

impl AdvancedFiltersPatch {
    pub fn apply(&self, filters: &mut AdvancedFilters) {
        if let Some(meal_plan) = self.meal_plan {
            filters.meal_plan = Some(meal_plan);
        }
        if let Some(view) = &self.view {
            filters.view = Some(view.clone());
        }
        if let Some(services) = &self.services {
            filters.services = services.clone();
        }
        if let Some(accessibility) = &self.accessibility {
            filters.accessibility = accessibility.clone();
        }
    }
}

/// One room in an explicit or suggested layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
}

/// Per-destination lodging configuration. One entry per destination; the
/// collection is never empty and exactly one entry is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodgingEntry {
    pub id: LodgingEntryId,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub check_in: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient")]
    pub check_out: Option<NaiveDate>,
    /// When set, check-in/out follow the flight plan's dates.
    #[serde(default)]
    pub dates_from_flight: bool,
    #[serde(default)]
    pub budget_preset: BudgetPreset,
    #[serde(default)]
    pub price_min: u32,
    #[serde(default)]
    pub price_max: u32,
    /// At most two; toggling a third evicts the oldest.
    #[serde(default)]
    pub property_types: Vec<PropertyType>,
    #[serde(default)]
    pub min_rating: f32,
    #[serde(default)]
    pub amenities: IndexSet<String>,
    #[serde(default)]
    pub filters: AdvancedFilters,
    /// Explicit room layout; when set it overrides the suggestion until
    /// auto mode is re-enabled.
    #[serde(default)]
    pub custom_rooms: Option<Vec<Room>>,
}

impl LodgingEntry {
    pub fn new(id: LodgingEntryId) -> Self {
        let preset = BudgetPreset::default();
        let (price_min, price_max) = preset.range().unwrap_or((0, 0));
        LodgingEntry {
            id,
            city: String::new(),
            country: String::new(),
            country_code: None,
            check_in: None,
            check_out: None,
            dates_from_flight: false,
            budget_preset: preset,
            price_min,
            price_max,
            property_types: Vec::new(),
            min_rating: 0.0,
            amenities: IndexSet::new(),
            filters: AdvancedFilters::default(),
            custom_rooms: None,
        }
    }

    /// Nights between check-in and check-out, never negative; `None` when
    /// either date is missing.
    pub fn nights(&self) -> Option<u32> {
        let (check_in, check_out) = (self.check_in?, self.check_out?);
        Some((check_out - check_in).num_days().max(0) as u32)
    }
}

/// Partial update for a lodging entry; the advanced-filter bundle is
/// deep-merged rather than replaced. A named `budget_preset` applies its
/// fixed bounds; an explicit `price_range` wins and flips the preset to
/// `Custom`.
#[derive(Debug, Clone, Default)]
pub struct LodgingEntryPatch {
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub dates_from_flight: Option<bool>,
    pub budget_preset: Option<BudgetPreset>,
    pub price_range: Option<(u32, u32)>,
    pub property_types: Option<Vec<PropertyType>>,
    pub min_rating: Option<f32>,
    pub amenities: Option<IndexSet<String>>,
    pub custom_rooms: Option<Vec<Room>>,
    pub filters: Option<AdvancedFiltersPatch>,
}

impl LodgingEntryPatch {
    pub fn apply(&self, entry: &mut LodgingEntry) {
        if let Some(city) = &self.city {
            entry.city = city.clone();
        }
        if let Some(country) = &self.country {
            entry.country = country.clone();
        }
        if let Some(code) = &self.country_code {
            entry.country_code = Some(code.clone());
        }
        if let Some(check_in) = self.check_in {
            entry.check_in = Some(check_in);
        }
        if let Some(check_out) = self.check_out {
            entry.check_out = Some(check_out);
        }
        if let Some(flag) = self.dates_from_flight {
            entry.dates_from_flight = flag;
        }
        if let Some(preset) = self.budget_preset {
            entry.budget_preset = preset;
            if let Some((min, max)) = preset.range() {
                entry.price_min = min;
                entry.price_max = max;
            }
        }
        if let Some((min, max)) = self.price_range {
            entry.budget_preset = BudgetPreset::Custom;
            entry.price_min = min;
            entry.price_max = max.max(min);
        }
        if let Some(types) = &self.property_types {
            entry.property_types = types.clone();
            // Same cap as the toggle path.
            entry.property_types.truncate(2);
        }
        if let Some(min_rating) = self.min_rating {
            entry.min_rating = min_rating;
        }
        if let Some(amenities) = &self.amenities {
            entry.amenities = amenities.clone();
        }
        if let Some(rooms) = &self.custom_rooms {
            entry.custom_rooms = Some(rooms.clone());
        }
        if let Some(filters) = &self.filters {
            filters.apply(&mut entry.filters);
        }
    }
}
