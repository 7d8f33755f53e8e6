use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::io::codec::lenient;
use crate::model::geo::Coordinates;

/// The party travelling: adults, children (with ages), infants, and the
/// comfort-level scalar that drives budget defaults elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelerProfile {
    /// Always at least 1; mutations that would drop below are rejected.
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default)]
    pub children: Vec<ChildTraveler>,
    #[serde(default)]
    pub infants: u32,
    /// 0.0 (budget) .. 1.0 (luxury)
    #[serde(default = "default_comfort")]
    pub comfort_level: f64,
}

fn default_adults() -> u32 {
    1
}

fn default_comfort() -> f64 {
    0.5
}

impl Default for TravelerProfile {
    fn default() -> Self {
        TravelerProfile {
            adults: default_adults(),
            children: Vec::new(),
            infants: 0,
            comfort_level: default_comfort(),
        }
    }
}

impl TravelerProfile {
    /// Adults + children + infants.
    pub fn total(&self) -> u32 {
        self.adults + self.children.len() as u32 + self.infants
    }
}

/// A child in the party, with the age that pricing and room layout key off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildTraveler {
    pub age: u8,
}

/// Stable identifier of an itinerary destination (`D-001`, `D-002`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DestinationId(String);

impl DestinationId {
    pub fn new(raw: impl Into<String>) -> Self {
        DestinationId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DestinationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An itinerary waypoint owned by the traveler store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub id: DestinationId,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default, deserialize_with = "lenient")]
    pub arrival: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient")]
    pub departure: Option<NaiveDate>,
    /// When set, arrival/departure follow the flight plan's dates.
    #[serde(default)]
    pub dates_from_flight: bool,
}

impl Destination {
    pub fn new(id: DestinationId, city: impl Into<String>, country: impl Into<String>) -> Self {
        Destination {
            id,
            city: city.into(),
            country: country.into(),
            country_code: None,
            coordinates: None,
            arrival: None,
            departure: None,
            dates_from_flight: false,
        }
    }
}

/// Partial update for a destination; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct DestinationPatch {
    pub city: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
    pub coordinates: Option<Coordinates>,
    pub arrival: Option<NaiveDate>,
    pub departure: Option<NaiveDate>,
    pub dates_from_flight: Option<bool>,
}

impl DestinationPatch {
    pub fn apply(&self, destination: &mut Destination) {
        if let Some(city) = &self.city {
            destination.city = city.clone();
        }
        if let Some(country) = &self.country {
            destination.country = country.clone();
        }
        if let Some(code) = &self.country_code {
            destination.country_code = Some(code.clone());
        }
        if let Some(coords) = self.coordinates {
            destination.coordinates = Some(coords);
        }
        if let Some(arrival) = self.arrival {
            destination.arrival = Some(arrival);
        }
        if let Some(departure) = self.departure {
            destination.departure = Some(departure);
        }
        if let Some(flag) = self.dates_from_flight {
            destination.dates_from_flight = flag;
        }
    }
}
