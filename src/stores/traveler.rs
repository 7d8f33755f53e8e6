//! Traveler & itinerary store: party composition plus the ordered list of
//! destinations. This is the root the other stores key off of; no
//! cross-store call originates here.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::events::{Event, EventBus};
use crate::io::codec;
use crate::io::storage::Storage;
use crate::model::traveler::{
    ChildTraveler, Destination, DestinationId, DestinationPatch, TravelerProfile,
};
use crate::stores::next_id;

/// Durable key; holds only this store's state.
pub const TRAVELER_KEY: &str = "wayplan.traveler";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
struct TravelerState {
    #[serde(default)]
    profile: TravelerProfile,
    #[serde(default)]
    destinations: Vec<Destination>,
    #[serde(default)]
    active: usize,
}

pub struct TravelerStore {
    state: TravelerState,
    storage: Rc<dyn Storage>,
    bus: Rc<EventBus>,
}

impl TravelerStore {
    /// Load from storage, falling back to the compiled-in default on a
    /// decode failure (a corrupt state file means "start fresh").
    pub fn load(storage: Rc<dyn Storage>, bus: Rc<EventBus>) -> Self {
        let mut state: TravelerState = storage
            .read(TRAVELER_KEY)
            .and_then(|text| codec::decode(&text))
            .unwrap_or_default();
        state.profile.adults = state.profile.adults.max(1);
        state.active = clamp_index(state.active, state.destinations.len());
        TravelerStore {
            state,
            storage,
            bus,
        }
    }

    fn commit(&mut self) {
        if let Some(text) = codec::encode(&self.state) {
            if let Err(e) = self.storage.write(TRAVELER_KEY, &text) {
                tracing::warn!(error = %e, "traveler state write failed; session continues");
            }
        }
        self.bus.emit(Event::TravelerChanged);
    }

    // --- profile ----------------------------------------------------------

    pub fn profile(&self) -> &TravelerProfile {
        &self.state.profile
    }

    /// Set the party composition. Rejected (returns `false`, state
    /// untouched) if it would leave fewer than one adult.
    pub fn set_travelers(&mut self, adults: u32, children: Vec<ChildTraveler>, infants: u32) -> bool {
        if adults < 1 {
            tracing::debug!("rejected traveler update: adults must stay >= 1");
            return false;
        }
        self.state.profile.adults = adults;
        self.state.profile.children = children;
        self.state.profile.infants = infants;
        self.commit();
        true
    }

    /// Comfort scalar, clamped into 0.0..=1.0.
    pub fn set_comfort_level(&mut self, level: f64) {
        self.state.profile.comfort_level = level.clamp(0.0, 1.0);
        self.commit();
    }

    pub fn total_travelers(&self) -> u32 {
        self.state.profile.total()
    }

    // --- itinerary --------------------------------------------------------

    pub fn destinations(&self) -> &[Destination] {
        &self.state.destinations
    }

    pub fn active_index(&self) -> usize {
        self.state.active
    }

    pub fn active_destination(&self) -> Option<&Destination> {
        self.state.destinations.get(self.state.active)
    }

    /// Append a destination and make it active. Returns its stable id.
    pub fn add_destination(
        &mut self,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> DestinationId {
        let id = DestinationId::new(next_id(
            "D",
            self.state.destinations.iter().map(|d| d.id.as_str()),
        ));
        self.state
            .destinations
            .push(Destination::new(id.clone(), city, country));
        self.state.active = self.state.destinations.len() - 1;
        self.commit();
        id
    }

    pub fn update_destination(&mut self, id: &DestinationId, patch: DestinationPatch) -> bool {
        let Some(destination) = self.state.destinations.iter_mut().find(|d| &d.id == id) else {
            return false;
        };
        patch.apply(destination);
        self.commit();
        true
    }

    /// Remove a destination; the active index re-clamps to the shrunken
    /// list. Removing an unknown id is a no-op.
    pub fn remove_destination(&mut self, id: &DestinationId) -> bool {
        let before = self.state.destinations.len();
        self.state.destinations.retain(|d| &d.id != id);
        if self.state.destinations.len() == before {
            return false;
        }
        self.state.active = clamp_index(self.state.active, self.state.destinations.len());
        self.commit();
        true
    }

    /// Clamped to the valid range; clamped again whenever the list shrinks.
    pub fn set_active(&mut self, index: usize) {
        self.state.active = clamp_index(index, self.state.destinations.len());
        self.commit();
    }

    // --- derived ----------------------------------------------------------

    pub fn has_destination(&self) -> bool {
        !self.state.destinations.is_empty()
    }

    pub fn has_any_date(&self) -> bool {
        self.state
            .destinations
            .iter()
            .any(|d| d.arrival.is_some() || d.departure.is_some())
    }
}

fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 { 0 } else { index.min(len - 1) }
}
