//! Flight plan store: trip type, legs, readiness, airport disambiguation,
//! and the map/assistant projections.

use std::rc::Rc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::events::{Event, EventBus};
use crate::io::codec;
use crate::io::storage::Storage;
use crate::model::flight::{
    AirportCandidate, CabinClass, FlightLeg, FlightPlanPatch, LegId, LegPatch, LegSide,
    MissingField, PassengerCounts, TripType,
};
use crate::model::geo::Coordinates;
use crate::services::{AirportLookupService, ServiceError};
use crate::stores::next_id;

/// Durable key; holds only this store's state.
pub const FLIGHT_KEY: &str = "wayplan.flights";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FlightPlanState {
    #[serde(default)]
    trip_type: TripType,
    #[serde(default)]
    legs: Vec<FlightLeg>,
    #[serde(default, deserialize_with = "codec::lenient")]
    return_date: Option<NaiveDate>,
    #[serde(default)]
    passengers: PassengerCounts,
    #[serde(default)]
    cabin: CabinClass,
    #[serde(default)]
    direct_only: bool,
}

impl Default for FlightPlanState {
    fn default() -> Self {
        FlightPlanState {
            trip_type: TripType::default(),
            legs: vec![FlightLeg::new(LegId::new("F-001"))],
            return_date: None,
            passengers: PassengerCounts::default(),
            cabin: CabinClass::default(),
            direct_only: false,
        }
    }
}

/// A suspended airport choice: the lookup returned several candidates and
/// search is blocked until the user picks one.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAirportChoice {
    pub leg: LegId,
    pub side: LegSide,
    pub candidates: Vec<AirportCandidate>,
}

pub struct FlightPlanStore {
    state: FlightPlanState,
    storage: Rc<dyn Storage>,
    bus: Rc<EventBus>,
    // Session-only; candidate lists and in-flight lookups are not persisted.
    pending: Vec<PendingAirportChoice>,
    resolving: bool,
    error: Option<String>,
}

impl FlightPlanStore {
    pub fn load(storage: Rc<dyn Storage>, bus: Rc<EventBus>) -> Self {
        let mut state: FlightPlanState = storage
            .read(FLIGHT_KEY)
            .and_then(|text| codec::decode(&text))
            .unwrap_or_default();
        if state.legs.is_empty() {
            state.legs.push(FlightLeg::new(LegId::new("F-001")));
        }
        FlightPlanStore {
            state,
            storage,
            bus,
            pending: Vec::new(),
            resolving: false,
            error: None,
        }
    }

    fn commit(&mut self) {
        if let Some(text) = codec::encode(&self.state) {
            if let Err(e) = self.storage.write(FLIGHT_KEY, &text) {
                tracing::warn!(error = %e, "flight plan write failed; session continues");
            }
        }
        self.bus.emit(Event::FlightPlanChanged);
    }

    // --- accessors --------------------------------------------------------

    pub fn trip_type(&self) -> TripType {
        self.state.trip_type
    }

    pub fn legs(&self) -> &[FlightLeg] {
        &self.state.legs
    }

    pub fn return_date(&self) -> Option<NaiveDate> {
        self.state.return_date
    }

    pub fn passengers(&self) -> PassengerCounts {
        self.state.passengers
    }

    pub fn cabin(&self) -> CabinClass {
        self.state.cabin
    }

    pub fn is_resolving(&self) -> bool {
        self.resolving
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// The legs readiness cares about: all of them in multi-leg mode, only
    /// the implicit first leg otherwise.
    fn relevant_legs(&self) -> &[FlightLeg] {
        match self.state.trip_type {
            TripType::MultiLeg => &self.state.legs,
            _ => &self.state.legs[..1],
        }
    }

    // --- mutations --------------------------------------------------------

    /// Switch trip shape. Leaving multi-leg mode keeps only the first leg,
    /// since the other shapes have a single implicit leg.
    pub fn set_trip_type(&mut self, trip_type: TripType) {
        self.state.trip_type = trip_type;
        if trip_type != TripType::MultiLeg {
            self.state.legs.truncate(1);
            self.pending
                .retain(|p| self.state.legs.iter().any(|l| l.id == p.leg));
        }
        self.commit();
    }

    /// Append a leg (multi-leg mode only; otherwise a no-op returning
    /// `None`). The new leg's departure is seeded from the previous leg's
    /// arrival.
    pub fn add_leg(&mut self) -> Option<LegId> {
        if self.state.trip_type != TripType::MultiLeg {
            tracing::debug!("rejected add_leg: trip type permits a single leg");
            return None;
        }
        let id = LegId::new(next_id("F", self.state.legs.iter().map(|l| l.id.as_str())));
        let mut leg = FlightLeg::new(id.clone());
        if let Some(previous) = self.state.legs.last() {
            leg.departure = previous.arrival.clone();
        }
        self.state.legs.push(leg);
        self.commit();
        Some(id)
    }

    /// Remove a leg. Rejected when the mode permits only one leg, and when
    /// only one leg remains.
    pub fn remove_leg(&mut self, id: &LegId) -> bool {
        if self.state.trip_type != TripType::MultiLeg || self.state.legs.len() == 1 {
            tracing::debug!("rejected remove_leg: last leg for this mode");
            return false;
        }
        let before = self.state.legs.len();
        self.state.legs.retain(|l| &l.id != id);
        if self.state.legs.len() == before {
            return false;
        }
        self.pending.retain(|p| &p.leg != id);
        self.commit();
        true
    }

    pub fn update_leg(&mut self, id: &LegId, patch: LegPatch) -> bool {
        let Some(leg) = self.state.legs.iter_mut().find(|l| &l.id == id) else {
            return false;
        };
        if let Some(departure) = &patch.departure {
            departure.apply(&mut leg.departure);
        }
        if let Some(arrival) = &patch.arrival {
            arrival.apply(&mut leg.arrival);
        }
        if let Some(date) = patch.date {
            leg.date = Some(date);
        }
        // A side that just got its code no longer has a choice pending.
        let (dep_resolved, arr_resolved) = (leg.departure.is_resolved(), leg.arrival.is_resolved());
        self.pending.retain(|p| {
            &p.leg != id
                || match p.side {
                    LegSide::Departure => !dep_resolved,
                    LegSide::Arrival => !arr_resolved,
                }
        });
        self.commit();
        true
    }

    /// Rejected if it would leave fewer than one adult passenger.
    pub fn set_passengers(&mut self, passengers: PassengerCounts) -> bool {
        if passengers.adults < 1 {
            tracing::debug!("rejected passenger update: adults must stay >= 1");
            return false;
        }
        self.state.passengers = passengers;
        self.commit();
        true
    }

    pub fn set_cabin(&mut self, cabin: CabinClass) {
        self.state.cabin = cabin;
        self.commit();
    }

    pub fn set_direct_only(&mut self, direct_only: bool) {
        self.state.direct_only = direct_only;
        self.commit();
    }

    pub fn set_return_date(&mut self, date: Option<NaiveDate>) {
        self.state.return_date = date;
        self.commit();
    }

    /// Atomic multi-field update used by the assistant/autofill flow: one
    /// persist, one change event, regardless of how many fields land.
    pub fn apply_bulk_update(&mut self, patch: FlightPlanPatch) {
        if let Some(trip_type) = patch.trip_type {
            self.state.trip_type = trip_type;
            if trip_type != TripType::MultiLeg {
                self.state.legs.truncate(1);
            }
        }
        if let Some(departure) = &patch.departure {
            departure.apply(&mut self.state.legs[0].departure);
        }
        if let Some(arrival) = &patch.arrival {
            arrival.apply(&mut self.state.legs[0].arrival);
        }
        if let Some(date) = patch.departure_date {
            self.state.legs[0].date = Some(date);
        }
        if let Some(date) = patch.return_date {
            self.state.return_date = Some(date);
        }
        if let Some(passengers) = patch.passengers {
            if passengers.adults >= 1 {
                self.state.passengers = passengers;
            }
        }
        if let Some(cabin) = patch.cabin {
            self.state.cabin = cabin;
        }
        if let Some(direct_only) = patch.direct_only {
            self.state.direct_only = direct_only;
        }
        self.commit();
    }

    // --- readiness --------------------------------------------------------

    /// Unsatisfied fields, in the fixed order the UI walks them.
    pub fn missing_fields(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        let legs = self.relevant_legs();
        if legs.iter().any(|l| l.departure.is_empty()) {
            missing.push(MissingField::Departure);
        }
        if legs.iter().any(|l| l.arrival.is_empty()) {
            missing.push(MissingField::Arrival);
        }
        if legs.iter().any(|l| l.date.is_none()) {
            missing.push(MissingField::DepartureDate);
        }
        if self.state.trip_type == TripType::RoundTrip && self.state.return_date.is_none() {
            missing.push(MissingField::ReturnDate);
        }
        if self.state.passengers.adults == 0 {
            missing.push(MissingField::Passengers);
        }
        if self.state.trip_type == TripType::MultiLeg && self.state.legs.len() < 2 {
            missing.push(MissingField::Legs);
        }
        missing
    }

    pub fn has_complete_info(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Complete *and* every relevant side resolved to a code. A leg with a
    /// free-text city is complete but not search-ready until disambiguation
    /// resolves it.
    pub fn is_ready_to_search(&self) -> bool {
        self.has_complete_info()
            && self
                .relevant_legs()
                .iter()
                .all(|l| l.departure.is_resolved() && l.arrival.is_resolved())
    }

    /// Sides that still need the airport-selection step.
    pub fn sides_needing_selection(&self) -> Vec<(LegId, LegSide)> {
        let mut sides = Vec::new();
        for leg in self.relevant_legs() {
            if leg.departure.needs_disambiguation() {
                sides.push((leg.id.clone(), LegSide::Departure));
            }
            if leg.arrival.needs_disambiguation() {
                sides.push((leg.id.clone(), LegSide::Arrival));
            }
        }
        sides
    }

    pub fn needs_airport_selection(&self, id: &LegId, side: LegSide) -> bool {
        self.state
            .legs
            .iter()
            .find(|l| &l.id == id)
            .is_some_and(|l| l.side(side).needs_disambiguation())
    }

    // --- disambiguation ---------------------------------------------------

    /// Start a lookup for a side holding a free-text city. Returns the city
    /// to look up, or `None` when the side has nothing to disambiguate.
    pub fn begin_airport_lookup(&mut self, id: &LegId, side: LegSide) -> Option<String> {
        let leg = self.state.legs.iter().find(|l| &l.id == id)?;
        let point = leg.side(side);
        if !point.needs_disambiguation() {
            return None;
        }
        self.resolving = true;
        self.error = None;
        point.city.clone()
    }

    /// Commit a lookup outcome. One candidate auto-applies with no user
    /// step; several suspend readiness behind [`Self::choose_airport`]; a
    /// failure becomes a dismissible message.
    pub fn finish_airport_lookup(
        &mut self,
        id: &LegId,
        side: LegSide,
        outcome: Result<Vec<AirportCandidate>, ServiceError>,
    ) {
        self.resolving = false;
        match outcome {
            Err(e) => self.error = Some(e.to_string()),
            Ok(candidates) if candidates.is_empty() => {
                self.error = Some("no matching airports found".to_string());
            }
            Ok(mut candidates) if candidates.len() == 1 => {
                let candidate = candidates.remove(0);
                self.apply_candidate(id, side, &candidate);
            }
            Ok(candidates) => {
                self.pending.retain(|p| !(&p.leg == id && p.side == side));
                self.pending.push(PendingAirportChoice {
                    leg: id.clone(),
                    side,
                    candidates,
                });
            }
        }
    }

    /// Full lookup flow against the external service. Never returns an
    /// error; failures land in the store's message.
    pub async fn resolve_airport(
        &mut self,
        service: &dyn AirportLookupService,
        id: &LegId,
        side: LegSide,
    ) {
        let Some(city) = self.begin_airport_lookup(id, side) else {
            return;
        };
        let outcome = service.candidates(&city).await;
        self.finish_airport_lookup(id, side, outcome);
    }

    pub fn pending_choice(&self, id: &LegId, side: LegSide) -> Option<&[AirportCandidate]> {
        self.pending
            .iter()
            .find(|p| &p.leg == id && p.side == side)
            .map(|p| p.candidates.as_slice())
    }

    /// Apply the user's pick from a suspended choice.
    pub fn choose_airport(&mut self, id: &LegId, side: LegSide, code: &str) -> bool {
        let Some(position) = self.pending.iter().position(|p| &p.leg == id && p.side == side)
        else {
            return false;
        };
        let Some(candidate) = self.pending[position]
            .candidates
            .iter()
            .find(|c| c.code == code)
            .cloned()
        else {
            return false;
        };
        self.pending.remove(position);
        self.apply_candidate(id, side, &candidate);
        true
    }

    fn apply_candidate(&mut self, id: &LegId, side: LegSide, candidate: &AirportCandidate) {
        let Some(leg) = self.state.legs.iter_mut().find(|l| &l.id == id) else {
            return;
        };
        let point = leg.side_mut(side);
        point.code = Some(candidate.code.clone());
        point.airport = Some(candidate.name.clone());
        point.city = Some(candidate.city.clone());
        if candidate.country.is_some() {
            point.country = candidate.country.clone();
        }
        if candidate.coordinates.is_some() {
            point.coordinates = candidate.coordinates;
        }
        self.commit();
    }

    // --- projections ------------------------------------------------------

    /// Coordinates along the effective route, in leg order, for the map.
    /// Immediately-adjacent duplicates collapse (a multi-leg arrival that
    /// seeds the next departure draws one pin, not two).
    pub fn route_points(&self) -> Vec<Coordinates> {
        let mut points: Vec<Coordinates> = Vec::new();
        let legs = self.relevant_legs();
        for leg in legs {
            points.extend(leg.departure.coordinates);
            points.extend(leg.arrival.coordinates);
        }
        if self.state.trip_type == TripType::RoundTrip {
            // Back home.
            points.extend(legs[0].departure.coordinates);
        }
        points.dedup_by(|a, b| a == b);
        points
    }

    /// Compact human-readable state for the assistant. Pure projection,
    /// never parsed back.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        match self.state.trip_type {
            TripType::RoundTrip | TripType::OneWay => {
                let leg = &self.state.legs[0];
                parts.push(
                    match self.state.trip_type {
                        TripType::RoundTrip => "Round trip",
                        _ => "One way",
                    }
                    .to_string(),
                );
                parts.push(format!(
                    "{} → {}",
                    leg.departure.display_label().unwrap_or("?"),
                    leg.arrival.display_label().unwrap_or("?"),
                ));
                if let Some(date) = leg.date {
                    parts.push(format!("out {date}"));
                }
                if self.state.trip_type == TripType::RoundTrip {
                    if let Some(date) = self.state.return_date {
                        parts.push(format!("back {date}"));
                    }
                }
            }
            TripType::MultiLeg => {
                parts.push(format!("Multi-leg ({} legs)", self.state.legs.len()));
                let mut route: Vec<&str> = Vec::new();
                if let Some(first) = self.state.legs.first() {
                    route.push(first.departure.display_label().unwrap_or("?"));
                }
                for leg in &self.state.legs {
                    route.push(leg.arrival.display_label().unwrap_or("?"));
                }
                parts.push(route.join(" → "));
                if let Some(date) = self.state.legs.first().and_then(|l| l.date) {
                    parts.push(format!("from {date}"));
                }
            }
        }
        parts.push(format_passengers(self.state.passengers));
        parts.push(self.state.cabin.to_string());
        if self.state.direct_only {
            parts.push("direct only".to_string());
        }
        parts.join(" · ")
    }
}

fn format_passengers(passengers: PassengerCounts) -> String {
    let mut parts = vec![plural(passengers.adults, "adult")];
    if passengers.children > 0 {
        parts.push(plural(passengers.children, "child"));
    }
    if passengers.infants > 0 {
        parts.push(plural(passengers.infants, "infant"));
    }
    parts.join(", ")
}

fn plural(count: u32, noun: &str) -> String {
    match (count, noun) {
        (1, _) => format!("1 {noun}"),
        (n, "child") => format!("{n} children"),
        (n, _) => format!("{n} {noun}s"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::model::flight::{LocationPatch, LocationPoint};
    use pretty_assertions::assert_eq;

    fn store() -> FlightPlanStore {
        FlightPlanStore::load(Rc::new(MemoryStorage::new()), Rc::new(EventBus::new()))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn candidate(code: &str, city: &str) -> AirportCandidate {
        AirportCandidate {
            code: code.to_string(),
            name: format!("{city} {code}"),
            city: city.to_string(),
            country: None,
            coordinates: None,
        }
    }

    /// Round trip Paris (free text) → JFK (code) with both dates set.
    fn paris_to_jfk() -> FlightPlanStore {
        let mut store = store();
        let leg_id = store.legs()[0].id.clone();
        store.update_leg(
            &leg_id,
            LegPatch {
                departure: Some(LocationPatch {
                    city: Some("Paris".into()),
                    ..Default::default()
                }),
                arrival: Some(LocationPatch {
                    code: Some("JFK".into()),
                    city: Some("New York".into()),
                    ..Default::default()
                }),
                date: Some(date(2025, 6, 1)),
            },
        );
        store.set_return_date(Some(date(2025, 6, 10)));
        store
    }

    #[test]
    fn default_plan_is_a_round_trip_with_one_empty_leg() {
        let store = store();
        assert_eq!(store.trip_type(), TripType::RoundTrip);
        assert_eq!(store.legs().len(), 1);
        assert!(store.legs()[0].departure.is_empty());
    }

    #[test]
    fn missing_fields_report_in_fixed_order() {
        let store = store();
        assert_eq!(
            store.missing_fields(),
            vec![
                MissingField::Departure,
                MissingField::Arrival,
                MissingField::DepartureDate,
                MissingField::ReturnDate,
            ],
        );
    }

    #[test]
    fn one_way_does_not_require_a_return_date() {
        let mut store = store();
        store.set_trip_type(TripType::OneWay);
        assert!(!store.missing_fields().contains(&MissingField::ReturnDate));
    }

    #[test]
    fn multi_leg_requires_at_least_two_legs() {
        let mut store = store();
        store.set_trip_type(TripType::MultiLeg);
        assert!(store.missing_fields().contains(&MissingField::Legs));
        store.add_leg();
        assert!(!store.missing_fields().contains(&MissingField::Legs));
    }

    #[test]
    fn complete_with_free_text_city_is_not_search_ready() {
        let store = paris_to_jfk();
        assert!(store.has_complete_info());
        assert!(!store.is_ready_to_search());
        let leg_id = store.legs()[0].id.clone();
        assert!(store.needs_airport_selection(&leg_id, LegSide::Departure));
        assert!(!store.needs_airport_selection(&leg_id, LegSide::Arrival));
    }

    #[test]
    fn single_candidate_auto_applies_and_unblocks_search() {
        let mut store = paris_to_jfk();
        let leg_id = store.legs()[0].id.clone();
        assert_eq!(
            store.begin_airport_lookup(&leg_id, LegSide::Departure),
            Some("Paris".to_string()),
        );
        assert!(store.is_resolving());
        store.finish_airport_lookup(&leg_id, LegSide::Departure, Ok(vec![candidate("CDG", "Paris")]));
        assert!(!store.is_resolving());
        assert_eq!(store.legs()[0].departure.code.as_deref(), Some("CDG"));
        assert!(store.is_ready_to_search());
    }

    #[test]
    fn several_candidates_suspend_until_the_user_chooses() {
        let mut store = paris_to_jfk();
        let leg_id = store.legs()[0].id.clone();
        store.begin_airport_lookup(&leg_id, LegSide::Departure);
        store.finish_airport_lookup(
            &leg_id,
            LegSide::Departure,
            Ok(vec![candidate("CDG", "Paris"), candidate("ORY", "Paris")]),
        );
        assert!(!store.is_ready_to_search());
        assert_eq!(
            store.pending_choice(&leg_id, LegSide::Departure).unwrap().len(),
            2,
        );

        assert!(store.choose_airport(&leg_id, LegSide::Departure, "ORY"));
        assert_eq!(store.legs()[0].departure.code.as_deref(), Some("ORY"));
        assert!(store.pending_choice(&leg_id, LegSide::Departure).is_none());
        assert!(store.is_ready_to_search());
    }

    #[test]
    fn failed_lookup_becomes_a_dismissible_message() {
        let mut store = paris_to_jfk();
        let leg_id = store.legs()[0].id.clone();
        store.begin_airport_lookup(&leg_id, LegSide::Departure);
        store.finish_airport_lookup(
            &leg_id,
            LegSide::Departure,
            Err(ServiceError::Unavailable("lookup timed out".into())),
        );
        assert!(!store.is_resolving());
        assert_eq!(store.error(), Some("service unavailable: lookup timed out"));
        store.dismiss_error();
        assert_eq!(store.error(), None);
    }

    #[tokio::test]
    async fn resolve_airport_drives_the_service_end_to_end() {
        struct OneAirport;
        #[async_trait::async_trait(?Send)]
        impl AirportLookupService for OneAirport {
            async fn candidates(&self, city: &str) -> Result<Vec<AirportCandidate>, ServiceError> {
                assert_eq!(city, "Paris");
                Ok(vec![candidate("CDG", "Paris")])
            }
        }

        let mut store = paris_to_jfk();
        let leg_id = store.legs()[0].id.clone();
        store.resolve_airport(&OneAirport, &leg_id, LegSide::Departure).await;
        assert!(store.is_ready_to_search());
    }

    #[test]
    fn add_leg_seeds_departure_from_previous_arrival() {
        let mut store = store();
        store.set_trip_type(TripType::MultiLeg);
        let first = store.legs()[0].id.clone();
        store.update_leg(
            &first,
            LegPatch {
                arrival: Some(LocationPatch {
                    code: Some("MAD".into()),
                    city: Some("Madrid".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        store.add_leg().unwrap();
        assert_eq!(store.legs()[1].departure.code.as_deref(), Some("MAD"));
    }

    #[test]
    fn add_leg_is_rejected_outside_multi_mode() {
        let mut store = store();
        assert_eq!(store.add_leg(), None);
        assert_eq!(store.legs().len(), 1);
    }

    #[test]
    fn the_last_leg_cannot_be_removed() {
        let mut store = store();
        let only = store.legs()[0].id.clone();
        assert!(!store.remove_leg(&only));

        store.set_trip_type(TripType::MultiLeg);
        let second = store.add_leg().unwrap();
        assert!(store.remove_leg(&second));
        let first = store.legs()[0].id.clone();
        assert!(!store.remove_leg(&first));
        assert_eq!(store.legs().len(), 1);
    }

    #[test]
    fn route_points_dedup_adjacent_duplicates() {
        let mut store = store();
        store.set_trip_type(TripType::MultiLeg);
        let lis = Coordinates::new(38.77, -9.13);
        let mad = Coordinates::new(40.47, -3.56);
        let cdg = Coordinates::new(49.0, 2.55);
        let first = store.legs()[0].id.clone();
        store.update_leg(
            &first,
            LegPatch {
                departure: Some(LocationPatch {
                    code: Some("LIS".into()),
                    coordinates: Some(lis),
                    ..Default::default()
                }),
                arrival: Some(LocationPatch {
                    code: Some("MAD".into()),
                    coordinates: Some(mad),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        let second = store.add_leg().unwrap();
        store.update_leg(
            &second,
            LegPatch {
                arrival: Some(LocationPatch {
                    code: Some("CDG".into()),
                    coordinates: Some(cdg),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        // LIS, MAD, (MAD), CDG — the seeded duplicate collapses.
        assert_eq!(store.route_points(), vec![lis, mad, cdg]);
    }

    #[test]
    fn round_trip_route_returns_home() {
        let mut store = store();
        let a = Coordinates::new(1.0, 2.0);
        let b = Coordinates::new(3.0, 4.0);
        let leg = store.legs()[0].id.clone();
        store.update_leg(
            &leg,
            LegPatch {
                departure: Some(LocationPatch {
                    code: Some("AAA".into()),
                    coordinates: Some(a),
                    ..Default::default()
                }),
                arrival: Some(LocationPatch {
                    code: Some("BBB".into()),
                    coordinates: Some(b),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        assert_eq!(store.route_points(), vec![a, b, a]);
    }

    #[test]
    fn bulk_update_lands_every_field_at_once() {
        let mut store = store();
        store.apply_bulk_update(FlightPlanPatch {
            departure: Some(LocationPatch {
                code: Some("LIS".into()),
                city: Some("Lisbon".into()),
                ..Default::default()
            }),
            arrival: Some(LocationPatch {
                code: Some("JFK".into()),
                city: Some("New York".into()),
                ..Default::default()
            }),
            departure_date: Some(date(2025, 9, 12)),
            return_date: Some(date(2025, 9, 20)),
            passengers: Some(PassengerCounts {
                adults: 2,
                children: 1,
                infants: 0,
            }),
            cabin: Some(CabinClass::Business),
            ..Default::default()
        });
        assert!(store.is_ready_to_search());
        assert_eq!(store.passengers().total(), 3);
    }

    #[test]
    fn summary_snapshot_round_trip() {
        let mut store = paris_to_jfk();
        let leg = store.legs()[0].id.clone();
        store.begin_airport_lookup(&leg, LegSide::Departure);
        store.finish_airport_lookup(&leg, LegSide::Departure, Ok(vec![candidate("CDG", "Paris")]));
        store.set_passengers(PassengerCounts {
            adults: 2,
            children: 1,
            infants: 0,
        });
        insta::assert_snapshot!(
            store.summary(),
            @"Round trip · Paris CDG → JFK · out 2025-06-01 · back 2025-06-10 · 2 adults, 1 child · economy"
        );
    }

    #[test]
    fn summary_snapshot_multi_leg() {
        let mut store = store();
        store.set_trip_type(TripType::MultiLeg);
        let first = store.legs()[0].id.clone();
        store.update_leg(
            &first,
            LegPatch {
                departure: Some(LocationPatch {
                    code: Some("LIS".into()),
                    ..Default::default()
                }),
                arrival: Some(LocationPatch {
                    code: Some("MAD".into()),
                    ..Default::default()
                }),
                date: Some(date(2025, 7, 3)),
            },
        );
        let second = store.add_leg().unwrap();
        store.update_leg(
            &second,
            LegPatch {
                arrival: Some(LocationPatch {
                    code: Some("CDG".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        insta::assert_snapshot!(
            store.summary(),
            @"Multi-leg (2 legs) · LIS → MAD → CDG · from 2025-07-03 · 1 adult · economy"
        );
    }

    #[test]
    fn location_display_prefers_the_most_specific_field() {
        let point = LocationPoint {
            airport: Some("Charles de Gaulle".into()),
            code: Some("CDG".into()),
            city: Some("Paris".into()),
            country: Some("France".into()),
            coordinates: None,
        };
        assert_eq!(point.display_label(), Some("Charles de Gaulle"));
        let point = LocationPoint {
            code: Some("CDG".into()),
            city: Some("Paris".into()),
            ..Default::default()
        };
        assert_eq!(point.display_label(), Some("CDG"));
    }

    #[test]
    fn state_survives_a_reload() {
        let storage = Rc::new(MemoryStorage::new());
        let bus = Rc::new(EventBus::new());
        let mut store =
            FlightPlanStore::load(Rc::clone(&storage) as Rc<dyn Storage>, Rc::clone(&bus));
        store.set_trip_type(TripType::OneWay);
        store.set_cabin(CabinClass::First);

        let reloaded = FlightPlanStore::load(storage, bus);
        assert_eq!(reloaded.trip_type(), TripType::OneWay);
        assert_eq!(reloaded.cabin(), CabinClass::First);
    }

    #[test]
    fn corrupt_persisted_state_falls_back_to_defaults() {
        let storage = Rc::new(MemoryStorage::new());
        storage.write(FLIGHT_KEY, "{\"legs\": 12}").unwrap();
        let store = FlightPlanStore::load(storage, Rc::new(EventBus::new()));
        assert_eq!(store.trip_type(), TripType::RoundTrip);
        assert_eq!(store.legs().len(), 1);
    }
}
