//! Lodging store: one configuration entry per destination. The entry ids
//! are the canonical destination identifiers the activity store keys off.

use std::rc::Rc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::events::{Event, EventBus};
use crate::io::codec;
use crate::io::storage::Storage;
use crate::model::lodging::{
    BudgetPreset, LodgingEntry, LodgingEntryId, LodgingEntryPatch, PropertyType, Room,
};
use crate::model::traveler::TravelerProfile;
use crate::stores::next_id;
use crate::stores::traveler::TravelerStore;

/// Durable key; holds only this store's state.
pub const LODGING_KEY: &str = "wayplan.lodging";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LodgingState {
    #[serde(default)]
    entries: Vec<LodgingEntry>,
    #[serde(default)]
    active: usize,
}

impl Default for LodgingState {
    fn default() -> Self {
        LodgingState {
            entries: vec![LodgingEntry::new(LodgingEntryId::new("L-001"))],
            active: 0,
        }
    }
}

pub struct LodgingStore {
    state: LodgingState,
    storage: Rc<dyn Storage>,
    bus: Rc<EventBus>,
}

impl LodgingStore {
    pub fn load(storage: Rc<dyn Storage>, bus: Rc<EventBus>) -> Self {
        let mut state: LodgingState = storage
            .read(LODGING_KEY)
            .and_then(|text| codec::decode(&text))
            .unwrap_or_default();
        // The collection is never empty, even if the persisted data was.
        if state.entries.is_empty() {
            let fresh = LodgingEntryId::new(next_id(
                "L",
                state.entries.iter().map(|e| e.id.as_str()),
            ));
            state.entries.push(LodgingEntry::new(fresh));
        }
        state.active = state.active.min(state.entries.len() - 1);
        LodgingStore {
            state,
            storage,
            bus,
        }
    }

    fn commit(&mut self) {
        if let Some(text) = codec::encode(&self.state) {
            if let Err(e) = self.storage.write(LODGING_KEY, &text) {
                tracing::warn!(error = %e, "lodging state write failed; session continues");
            }
        }
        self.bus.emit(Event::LodgingChanged);
    }

    // --- accessors --------------------------------------------------------

    pub fn entries(&self) -> &[LodgingEntry] {
        &self.state.entries
    }

    pub fn active_index(&self) -> usize {
        self.state.active
    }

    /// The entry all single-entry mutators act on. Always present.
    pub fn active_entry(&self) -> &LodgingEntry {
        &self.state.entries[self.state.active]
    }

    pub fn entry(&self, id: &LodgingEntryId) -> Option<&LodgingEntry> {
        self.state.entries.iter().find(|e| &e.id == id)
    }

    pub fn contains(&self, id: &LodgingEntryId) -> bool {
        self.entry(id).is_some()
    }

    // --- collection ops ---------------------------------------------------

    /// Append an entry and make it active. Returns the new destination id.
    pub fn add_entry(
        &mut self,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> LodgingEntryId {
        let id = LodgingEntryId::new(next_id(
            "L",
            self.state.entries.iter().map(|e| e.id.as_str()),
        ));
        let mut entry = LodgingEntry::new(id.clone());
        entry.city = city.into();
        entry.country = country.into();
        self.state.entries.push(entry);
        self.state.active = self.state.entries.len() - 1;
        self.commit();
        id
    }

    /// Remove an entry. If that empties the collection, a fresh default
    /// entry replaces it — the collection length never drops below one.
    /// The active index re-clamps either way.
    pub fn remove_entry(&mut self, id: &LodgingEntryId) -> bool {
        let before = self.state.entries.len();
        // Reserve the replacement id while the removed entry is still in the
        // collection, so a fresh default never reuses a removed id and
        // reconciliation still sees the old one as gone.
        let fresh = LodgingEntryId::new(next_id(
            "L",
            self.state.entries.iter().map(|e| e.id.as_str()),
        ));
        self.state.entries.retain(|e| &e.id != id);
        if self.state.entries.len() == before {
            return false;
        }
        if self.state.entries.is_empty() {
            self.state.entries.push(LodgingEntry::new(fresh));
        }
        self.state.active = self.state.active.min(self.state.entries.len() - 1);
        self.commit();
        true
    }

    pub fn set_active(&mut self, index: usize) {
        self.state.active = index.min(self.state.entries.len() - 1);
        self.commit();
    }

    /// Partial update by id. The advanced-filter bundle deep-merges rather
    /// than being replaced wholesale.
    pub fn update_entry(&mut self, id: &LodgingEntryId, patch: LodgingEntryPatch) -> bool {
        let Some(entry) = self.state.entries.iter_mut().find(|e| &e.id == id) else {
            return false;
        };
        patch.apply(entry);
        self.commit();
        true
    }

    // --- active-entry mutators ---------------------------------------------

    fn active_mut(&mut self) -> &mut LodgingEntry {
        &mut self.state.entries[self.state.active]
    }

    /// Apply a named preset's fixed nightly range. Passing `Custom` here is
    /// a no-op; custom bounds go through [`Self::set_custom_budget`].
    pub fn set_budget_preset(&mut self, preset: BudgetPreset) {
        let Some((min, max)) = preset.range() else {
            tracing::debug!("ignored custom preset without bounds");
            return;
        };
        let entry = self.active_mut();
        entry.budget_preset = preset;
        entry.price_min = min;
        entry.price_max = max;
        self.commit();
    }

    /// Exact user-supplied bounds; the preset becomes `Custom`.
    pub fn set_custom_budget(&mut self, min: u32, max: u32) {
        let entry = self.active_mut();
        entry.budget_preset = BudgetPreset::Custom;
        entry.price_min = min;
        entry.price_max = max.max(min);
        self.commit();
    }

    /// Toggle a property type on the active entry. At most two may be
    /// selected; toggling a third on evicts the oldest.
    pub fn toggle_property_type(&mut self, property: PropertyType) {
        let entry = self.active_mut();
        if let Some(position) = entry.property_types.iter().position(|p| *p == property) {
            entry.property_types.remove(position);
        } else {
            entry.property_types.push(property);
            if entry.property_types.len() > 2 {
                entry.property_types.remove(0);
            }
        }
        self.commit();
    }

    pub fn toggle_amenity(&mut self, amenity: &str) {
        let entry = self.active_mut();
        if !entry.amenities.shift_remove(amenity) {
            entry.amenities.insert(amenity.to_string());
        }
        self.commit();
    }

    pub fn set_min_rating(&mut self, rating: f32) {
        self.active_mut().min_rating = rating;
        self.commit();
    }

    pub fn set_destination(
        &mut self,
        city: impl Into<String>,
        country: impl Into<String>,
        country_code: Option<String>,
    ) {
        let entry = self.active_mut();
        entry.city = city.into();
        entry.country = country.into();
        entry.country_code = country_code;
        self.commit();
    }

    pub fn set_dates(&mut self, check_in: Option<NaiveDate>, check_out: Option<NaiveDate>) {
        let entry = self.active_mut();
        entry.check_in = check_in;
        entry.check_out = check_out;
        self.commit();
    }

    /// Explicit room layout; overrides the suggestion until auto mode
    /// returns.
    pub fn set_custom_rooms(&mut self, rooms: Vec<Room>) {
        self.active_mut().custom_rooms = Some(rooms);
        self.commit();
    }

    pub fn use_auto_rooms(&mut self) {
        self.active_mut().custom_rooms = None;
        self.commit();
    }

    // --- derived ------------------------------------------------------------

    /// True when the active entry has a city OR the itinerary has any
    /// destination. Deliberately an OR: a nearby flow (flights, chat) may
    /// supply the destination before the lodging tab is touched.
    pub fn ready_to_search(&self, itinerary: &TravelerStore) -> bool {
        !self.active_entry().city.is_empty() || itinerary.has_destination()
    }

    /// Room layout for the active entry: the explicit custom list when set,
    /// otherwise the suggestion for the current party.
    pub fn rooms_for_active(&self, profile: &TravelerProfile) -> Vec<Room> {
        if let Some(rooms) = &self.active_entry().custom_rooms {
            return rooms.clone();
        }
        suggest_rooms(profile.adults, profile.children.len() as u32)
    }

    /// Nights summed across all entries; an entry missing either date
    /// contributes nothing, and check-out on or before check-in counts as
    /// zero, never negative.
    pub fn total_nights(&self) -> u32 {
        self.state
            .entries
            .iter()
            .filter_map(LodgingEntry::nights)
            .sum()
    }
}

/// Display suggestion for splitting the party into rooms — not a booking
/// constraint. 1–2 adults travel in one room (a family room when children
/// come along); larger parties split into rooms of at most 2 adults, with
/// up to 2 children placed in the first room only.
pub fn suggest_rooms(adults: u32, children: u32) -> Vec<Room> {
    if adults <= 2 && children == 0 {
        return vec![Room {
            adults,
            children: 0,
        }];
    }
    if adults <= 2 {
        return vec![Room { adults, children }];
    }
    let mut rooms = Vec::new();
    let mut remaining = adults;
    while remaining > 0 {
        let in_room = remaining.min(2);
        rooms.push(Room {
            adults: in_room,
            children: 0,
        });
        remaining -= in_room;
    }
    rooms[0].children = children.min(2);
    rooms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::MemoryStorage;
    use crate::model::lodging::{AdvancedFiltersPatch, MealPlan};
    use pretty_assertions::assert_eq;

    fn store() -> LodgingStore {
        LodgingStore::load(Rc::new(MemoryStorage::new()), Rc::new(EventBus::new()))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn starts_with_one_default_entry() {
        let store = store();
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.active_index(), 0);
        assert_eq!(store.active_entry().budget_preset, BudgetPreset::Comfort);
    }

    #[test]
    fn collection_never_empties_under_removal() {
        let mut store = store();
        store.add_entry("Lisbon", "Portugal");
        store.add_entry("Porto", "Portugal");
        // Remove everything, repeatedly, in whatever order ids come up.
        for _ in 0..10 {
            let id = store.entries()[0].id.clone();
            store.remove_entry(&id);
            assert!(!store.entries().is_empty());
            assert!(store.active_index() < store.entries().len());
        }
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn removing_the_last_entry_leaves_a_fresh_default() {
        let mut store = store();
        store.set_destination("Rome", "Italy", Some("IT".into()));
        let only = store.active_entry().id.clone();
        assert!(store.remove_entry(&only));
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.active_entry().city, "");
        // The replacement carries a new identity; the removed id stays dead.
        assert_ne!(store.active_entry().id, only);
    }

    #[test]
    fn add_entry_appends_and_activates() {
        let mut store = store();
        let id = store.add_entry("Kyoto", "Japan");
        assert_eq!(id.as_str(), "L-002");
        assert_eq!(store.active_entry().city, "Kyoto");
    }

    #[test]
    fn budget_preset_scenario() {
        let mut store = store();
        store.set_budget_preset(BudgetPreset::Eco);
        assert_eq!(store.active_entry().budget_preset, BudgetPreset::Eco);
        assert_eq!(store.active_entry().price_min, 0);
        assert_eq!(store.active_entry().price_max, 80);

        store.set_budget_preset(BudgetPreset::Premium);
        assert_eq!(store.active_entry().budget_preset, BudgetPreset::Premium);
        assert_eq!(store.active_entry().price_min, 180);
        assert_eq!(store.active_entry().price_max, 350);

        store.set_custom_budget(45, 90);
        assert_eq!(store.active_entry().budget_preset, BudgetPreset::Custom);
        assert_eq!(store.active_entry().price_min, 45);
        assert_eq!(store.active_entry().price_max, 90);
    }

    #[test]
    fn third_property_type_evicts_the_oldest() {
        let mut store = store();
        store.toggle_property_type(PropertyType::Hotel);
        store.toggle_property_type(PropertyType::Apartment);
        store.toggle_property_type(PropertyType::Villa);
        assert_eq!(
            store.active_entry().property_types,
            vec![PropertyType::Apartment, PropertyType::Villa],
        );
        // Toggling an existing one off
        store.toggle_property_type(PropertyType::Villa);
        assert_eq!(
            store.active_entry().property_types,
            vec![PropertyType::Apartment],
        );
    }

    #[test]
    fn amenity_toggle_round_trips() {
        let mut store = store();
        store.toggle_amenity("pool");
        assert!(store.active_entry().amenities.contains("pool"));
        store.toggle_amenity("pool");
        assert!(!store.active_entry().amenities.contains("pool"));
    }

    #[test]
    fn update_entry_deep_merges_the_filter_bundle() {
        let mut store = store();
        let id = store.active_entry().id.clone();
        store.update_entry(
            &id,
            LodgingEntryPatch {
                filters: Some(AdvancedFiltersPatch {
                    view: Some("sea".into()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        store.update_entry(
            &id,
            LodgingEntryPatch {
                filters: Some(AdvancedFiltersPatch {
                    meal_plan: Some(MealPlan::Breakfast),
                    ..Default::default()
                }),
                ..Default::default()
            },
        );
        // Both filter fields survive: merged, not replaced.
        let entry = store.active_entry();
        assert_eq!(entry.filters.view.as_deref(), Some("sea"));
        assert_eq!(entry.filters.meal_plan, Some(MealPlan::Breakfast));
    }

    #[test]
    fn update_entry_reaches_budget_and_amenities_on_a_non_active_entry() {
        let mut store = store();
        let first = store.active_entry().id.clone();
        store.add_entry("Porto", "Portugal");
        store.update_entry(
            &first,
            LodgingEntryPatch {
                budget_preset: Some(BudgetPreset::Luxury),
                amenities: Some(["spa".to_string()].into_iter().collect()),
                custom_rooms: Some(vec![Room {
                    adults: 3,
                    children: 0,
                }]),
                ..Default::default()
            },
        );
        let entry = store.entry(&first).unwrap();
        assert_eq!(entry.budget_preset, BudgetPreset::Luxury);
        assert_eq!(entry.price_min, 350);
        assert_eq!(entry.price_max, 800);
        assert!(entry.amenities.contains("spa"));
        assert_eq!(entry.custom_rooms.as_deref(), Some(&[Room {
            adults: 3,
            children: 0,
        }][..]));
        // The active entry keeps its own configuration.
        assert_eq!(store.active_entry().budget_preset, BudgetPreset::Comfort);

        // An explicit range through the same path flips the preset.
        store.update_entry(
            &first,
            LodgingEntryPatch {
                price_range: Some((45, 90)),
                ..Default::default()
            },
        );
        let entry = store.entry(&first).unwrap();
        assert_eq!(entry.budget_preset, BudgetPreset::Custom);
        assert_eq!(entry.price_max, 90);
    }

    #[test]
    fn total_nights_ignores_incomplete_and_zero_night_entries() {
        let mut store = store();
        store.set_dates(Some(date(2025, 6, 1)), Some(date(2025, 6, 4)));
        store.add_entry("Porto", "Portugal");
        store.set_dates(Some(date(2025, 6, 10)), Some(date(2025, 6, 10)));
        store.add_entry("Faro", "Portugal");
        // Third entry has no dates at all.
        assert_eq!(store.total_nights(), 3);
    }

    #[test]
    fn check_out_before_check_in_counts_as_zero() {
        let mut store = store();
        store.set_dates(Some(date(2025, 6, 5)), Some(date(2025, 6, 1)));
        assert_eq!(store.total_nights(), 0);
    }

    #[test]
    fn room_suggestion_scenarios() {
        assert_eq!(
            suggest_rooms(3, 0),
            vec![
                Room {
                    adults: 2,
                    children: 0
                },
                Room {
                    adults: 1,
                    children: 0
                },
            ],
        );
        assert_eq!(
            suggest_rooms(2, 2),
            vec![Room {
                adults: 2,
                children: 2
            }],
        );
        assert_eq!(
            suggest_rooms(1, 0),
            vec![Room {
                adults: 1,
                children: 0
            }],
        );
        assert_eq!(
            suggest_rooms(5, 3),
            vec![
                Room {
                    adults: 2,
                    children: 2
                },
                Room {
                    adults: 2,
                    children: 0
                },
                Room {
                    adults: 1,
                    children: 0
                },
            ],
        );
    }

    #[test]
    fn custom_rooms_override_until_auto_mode_returns() {
        let mut store = store();
        let profile = TravelerProfile {
            adults: 3,
            ..Default::default()
        };
        assert_eq!(store.rooms_for_active(&profile).len(), 2);

        store.set_custom_rooms(vec![Room {
            adults: 3,
            children: 0,
        }]);
        assert_eq!(
            store.rooms_for_active(&profile),
            vec![Room {
                adults: 3,
                children: 0
            }],
        );

        store.use_auto_rooms();
        assert_eq!(store.rooms_for_active(&profile).len(), 2);
    }

    #[test]
    fn ready_to_search_is_an_or_with_the_itinerary() {
        let bus = Rc::new(EventBus::new());
        let storage = Rc::new(MemoryStorage::new());
        let mut itinerary =
            TravelerStore::load(Rc::clone(&storage) as Rc<dyn Storage>, Rc::clone(&bus));
        let mut store = store();

        // Nothing anywhere
        assert!(!store.ready_to_search(&itinerary));
        // City on the active entry only
        store.set_destination("Rome", "Italy", None);
        assert!(store.ready_to_search(&itinerary));
        // Itinerary destination only
        store.set_destination("", "", None);
        itinerary.add_destination("Lisbon", "Portugal");
        assert!(store.ready_to_search(&itinerary));
    }

    #[test]
    fn state_survives_a_reload() {
        let storage = Rc::new(MemoryStorage::new());
        let bus = Rc::new(EventBus::new());
        let mut store =
            LodgingStore::load(Rc::clone(&storage) as Rc<dyn Storage>, Rc::clone(&bus));
        store.set_destination("Kyoto", "Japan", Some("JP".into()));
        store.set_custom_budget(45, 90);

        let reloaded = LodgingStore::load(storage, bus);
        assert_eq!(reloaded.active_entry().city, "Kyoto");
        assert_eq!(reloaded.active_entry().budget_preset, BudgetPreset::Custom);
        assert_eq!(reloaded.active_entry().price_min, 45);
    }

    #[test]
    fn corrupt_persisted_state_falls_back_to_defaults() {
        let storage = Rc::new(MemoryStorage::new());
        storage.write(LODGING_KEY, "[]").unwrap();
        let store = LodgingStore::load(storage, Rc::new(EventBus::new()));
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn persisted_empty_collection_heals_on_load() {
        let storage = Rc::new(MemoryStorage::new());
        storage
            .write(LODGING_KEY, r#"{"entries": [], "active": 3}"#)
            .unwrap();
        let store = LodgingStore::load(storage, Rc::new(EventBus::new()));
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.active_index(), 0);
    }
}
