use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::io::codec::lenient;
use crate::model::geo::Coordinates;

/// Trip shape: one implicit leg (plus an optional return date for round
/// trips), or an ordered sequence of legs in multi-leg mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TripType {
    #[default]
    RoundTrip,
    OneWay,
    MultiLeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CabinClass {
    #[default]
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl std::fmt::Display for CabinClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CabinClass::Economy => write!(f, "economy"),
            CabinClass::PremiumEconomy => write!(f, "premium economy"),
            CabinClass::Business => write!(f, "business"),
            CabinClass::First => write!(f, "first"),
        }
    }
}

/// Stable identifier of a flight leg (`F-001`, `F-002`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegId(String);

impl LegId {
    pub fn new(raw: impl Into<String>) -> Self {
        LegId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LegId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a leg a location belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegSide {
    Departure,
    Arrival,
}

/// A location with layered precision: airport name, IATA-style code, city,
/// country, coordinates. More specific fields win for display and map
/// placement; a location is *resolved* once it carries a code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LocationPoint {
    #[serde(default)]
    pub airport: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

impl LocationPoint {
    /// A free-text city with nothing else, the usual entry point before
    /// disambiguation.
    pub fn city(name: impl Into<String>) -> Self {
        LocationPoint {
            city: Some(name.into()),
            ..Default::default()
        }
    }

    /// No usable field at all.
    pub fn is_empty(&self) -> bool {
        self.airport.is_none() && self.code.is_none() && self.city.is_none() && self.country.is_none()
    }

    /// Resolved means an unambiguous code is present.
    pub fn is_resolved(&self) -> bool {
        self.code.is_some()
    }

    /// Has a free-text city but no code yet, so search must wait on the
    /// disambiguation step.
    pub fn needs_disambiguation(&self) -> bool {
        self.city.is_some() && self.code.is_none()
    }

    /// Most specific available field, for display.
    pub fn display_label(&self) -> Option<&str> {
        self.airport
            .as_deref()
            .or(self.code.as_deref())
            .or(self.city.as_deref())
            .or(self.country.as_deref())
    }
}

/// One departure → arrival segment of the flight plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightLeg {
    pub id: LegId,
    #[serde(default)]
    pub departure: LocationPoint,
    #[serde(default)]
    pub arrival: LocationPoint,
    #[serde(default, deserialize_with = "lenient")]
    pub date: Option<NaiveDate>,
}

impl FlightLeg {
    pub fn new(id: LegId) -> Self {
        FlightLeg {
            id,
            departure: LocationPoint::default(),
            arrival: LocationPoint::default(),
            date: None,
        }
    }

    pub fn side(&self, side: LegSide) -> &LocationPoint {
        match side {
            LegSide::Departure => &self.departure,
            LegSide::Arrival => &self.arrival,
        }
    }

    pub fn side_mut(&mut self, side: LegSide) -> &mut LocationPoint {
        match side {
            LegSide::Departure => &mut self.departure,
            LegSide::Arrival => &mut self.arrival,
        }
    }
}

/// Seats requested on the plan, kept separate from the traveler profile so
/// the two can diverge (e.g. one traveler not flying).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerCounts {
    #[serde(default = "default_one")]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants: u32,
}

fn default_one() -> u32 {
    1
}

impl Default for PassengerCounts {
    fn default() -> Self {
        PassengerCounts {
            adults: 1,
            children: 0,
            infants: 0,
        }
    }
}

impl PassengerCounts {
    pub fn total(&self) -> u32 {
        self.adults + self.children + self.infants
    }
}

/// One airport the disambiguation service offered for a free-text city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportCandidate {
    pub code: String,
    pub name: String,
    pub city: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// A field still unsatisfied before the plan is complete, in the fixed
/// order readiness reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    Departure,
    Arrival,
    DepartureDate,
    ReturnDate,
    Passengers,
    Legs,
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingField::Departure => write!(f, "departure"),
            MissingField::Arrival => write!(f, "arrival"),
            MissingField::DepartureDate => write!(f, "departure date"),
            MissingField::ReturnDate => write!(f, "return date"),
            MissingField::Passengers => write!(f, "passengers"),
            MissingField::Legs => write!(f, "legs"),
        }
    }
}

/// Partial update for one side of a leg; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct LocationPatch {
    pub airport: Option<String>,
    pub code: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl LocationPatch {
    pub fn apply(&self, point: &mut LocationPoint) {
        if let Some(airport) = &self.airport {
            point.airport = Some(airport.clone());
        }
        if let Some(code) = &self.code {
            point.code = Some(code.clone());
        }
        if let Some(city) = &self.city {
            point.city = Some(city.clone());
        }
        if let Some(country) = &self.country {
            point.country = Some(country.clone());
        }
        if let Some(coords) = self.coordinates {
            point.coordinates = Some(coords);
        }
    }
}

/// Partial update for a leg.
#[derive(Debug, Clone, Default)]
pub struct LegPatch {
    pub departure: Option<LocationPatch>,
    pub arrival: Option<LocationPatch>,
    pub date: Option<NaiveDate>,
}

/// Bulk update applied atomically by the assistant/autofill flow.
#[derive(Debug, Clone, Default)]
pub struct FlightPlanPatch {
    pub trip_type: Option<TripType>,
    pub departure: Option<LocationPatch>,
    pub arrival: Option<LocationPatch>,
    pub departure_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
    pub passengers: Option<PassengerCounts>,
    pub cabin: Option<CabinClass>,
    pub direct_only: Option<bool>,
}
