//! Composition root. Owns the event bus, the storage handle, and the four
//! stores, and hosts every sanctioned cross-store flow: reconciliation
//! after a lodging removal, date and passenger propagation, comfort-driven
//! price defaults, and the map/chat signals.
//!
//! Stores never call each other's mutators; propagation runs here, top
//! down, so there is no circular re-entrancy to guard against.

use std::rc::Rc;

use crate::config::PlannerConfig;
use crate::events::{Event, EventBus, Tab};
use crate::io::storage::Storage;
use crate::model::activity::{ActivityDraft, ActivityId};
use crate::model::flight::{PassengerCounts, TripType};
use crate::model::lodging::{LodgingEntryId, LodgingEntryPatch};
use crate::model::traveler::{ChildTraveler, DestinationId, DestinationPatch};
use crate::services::{ActivitySearchService, SearchRequest};
use crate::stores::activity::ActivityError;
use crate::stores::{ActivityStore, FlightPlanStore, LodgingStore, TravelerStore};

pub struct TripPlanner {
    pub bus: Rc<EventBus>,
    pub traveler: TravelerStore,
    pub flights: FlightPlanStore,
    pub lodging: LodgingStore,
    pub activities: ActivityStore,
    config: PlannerConfig,
}

impl TripPlanner {
    /// Load every store from its durable key and run the startup passes:
    /// prune activities orphaned while we were away, and seed the activity
    /// price default from the traveler's comfort level.
    pub fn open(config: PlannerConfig, storage: Rc<dyn Storage>) -> Self {
        let bus = Rc::new(EventBus::new());
        let fresh_profile = storage.read(crate::stores::traveler::TRAVELER_KEY).is_none();
        let mut traveler = TravelerStore::load(Rc::clone(&storage), Rc::clone(&bus));
        if fresh_profile {
            traveler.set_comfort_level(config.comfort_level);
        }
        let flights = FlightPlanStore::load(Rc::clone(&storage), Rc::clone(&bus));
        let lodging = LodgingStore::load(Rc::clone(&storage), Rc::clone(&bus));
        let mut activities = ActivityStore::load(Rc::clone(&storage), Rc::clone(&bus));

        activities.reconcile(&lodging);
        activities.apply_comfort_level(traveler.profile().comfort_level);

        TripPlanner {
            bus,
            traveler,
            flights,
            lodging,
            activities,
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    // --- cross-store flows ------------------------------------------------

    /// Add a destination to the itinerary along with its lodging entry, and
    /// point the map at it. Returns both identifiers.
    pub fn add_city(
        &mut self,
        city: &str,
        country: &str,
        country_code: Option<&str>,
    ) -> (DestinationId, LodgingEntryId) {
        let destination = self.traveler.add_destination(city, country);
        if let Some(code) = country_code {
            self.traveler.update_destination(
                &destination,
                DestinationPatch {
                    country_code: Some(code.to_string()),
                    ..Default::default()
                },
            );
        }
        let lodging = self.lodging.add_entry(city, country);
        if country_code.is_some() {
            self.lodging.update_entry(
                &lodging,
                LodgingEntryPatch {
                    country_code: country_code.map(str::to_string),
                    ..Default::default()
                },
            );
        }
        self.focus_destination(city, country_code);
        (destination, lodging)
    }

    /// Remove a lodging entry and immediately reconcile the activities that
    /// referenced it. A non-zero prune flashes the activities tab so the
    /// deletion is user-visible.
    pub fn remove_lodging_entry(&mut self, id: &LodgingEntryId) -> bool {
        if !self.lodging.remove_entry(id) {
            return false;
        }
        let pruned = self.activities.reconcile(&self.lodging);
        if pruned > 0 {
            self.bus.emit(Event::TabFlash {
                tab: Tab::Activities,
            });
        }
        true
    }

    /// Party mutation with its downstream propagation: flight passengers
    /// track the profile. Rejected (and nothing propagates) if it would
    /// leave fewer than one adult.
    pub fn set_travelers(&mut self, adults: u32, children: Vec<ChildTraveler>, infants: u32) -> bool {
        if !self.traveler.set_travelers(adults, children, infants) {
            return false;
        }
        let profile = self.traveler.profile();
        self.flights.set_passengers(PassengerCounts {
            adults: profile.adults,
            children: profile.children.len() as u32,
            infants: profile.infants,
        });
        true
    }

    /// Comfort mutation plus the derived activity price default.
    pub fn set_comfort_level(&mut self, level: f64) {
        self.traveler.set_comfort_level(level);
        self.activities
            .apply_comfort_level(self.traveler.profile().comfort_level);
    }

    /// Copy flight dates onto every lodging entry and destination that opted
    /// into inheriting them. Multi-leg plans are skipped: there is no single
    /// out/back pair to inherit.
    pub fn sync_dates_from_flights(&mut self) {
        if self.flights.trip_type() == TripType::MultiLeg {
            return;
        }
        let Some(out) = self.flights.legs()[0].date else {
            return;
        };
        let back = self.flights.return_date();

        let inheriting: Vec<LodgingEntryId> = self
            .lodging
            .entries()
            .iter()
            .filter(|e| e.dates_from_flight)
            .map(|e| e.id.clone())
            .collect();
        for id in inheriting {
            self.lodging.update_entry(
                &id,
                LodgingEntryPatch {
                    check_in: Some(out),
                    check_out: back,
                    ..Default::default()
                },
            );
        }

        let destinations: Vec<DestinationId> = self
            .traveler
            .destinations()
            .iter()
            .filter(|d| d.dates_from_flight)
            .map(|d| d.id.clone())
            .collect();
        for id in destinations {
            self.traveler.update_destination(
                &id,
                DestinationPatch {
                    arrival: Some(out),
                    departure: back,
                    ..Default::default()
                },
            );
        }
    }

    /// Search activities for the active lodging entry, carrying its dates
    /// and the store's filter bundle.
    pub async fn search_activities(&mut self, service: &dyn ActivitySearchService) {
        let entry = self.lodging.active_entry();
        let request = SearchRequest {
            city: entry.city.clone(),
            country_code: entry.country_code.clone(),
            check_in: entry.check_in,
            check_out: entry.check_out,
            filters: self.activities.filters().clone(),
            cursor: None,
        };
        self.activities.search(service, request).await;
    }

    /// Manual activity entry, defaulting the currency from configuration.
    pub fn add_manual_activity(
        &mut self,
        mut draft: ActivityDraft,
        destination: &LodgingEntryId,
    ) -> Result<ActivityId, ActivityError> {
        if let Some(pricing) = &mut draft.pricing {
            if pricing.currency.is_empty() {
                pricing.currency = self.config.currency.clone();
            }
        }
        self.activities.add_manual(draft, destination, &self.lodging)
    }

    // --- UI signals -------------------------------------------------------

    pub fn focus_destination(&self, city: &str, country_code: Option<&str>) {
        self.bus.emit(Event::DestinationFocus {
            city: city.to_string(),
            country_code: country_code.map(str::to_string),
        });
    }

    pub fn switch_tab(&self, tab: Tab) {
        self.bus.emit(Event::SwitchTab { tab });
    }
}
