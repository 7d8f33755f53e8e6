//! Activity store: planned/booked entries plus the transient search
//! session. Every entry references a lodging entry id as its destination;
//! the reconciliation pass deletes entries whose destination disappeared —
//! the one sanctioned cross-store mutation in the system.

use std::rc::Rc;

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::events::{Event, EventBus};
use crate::io::codec;
use crate::io::storage::Storage;
use crate::model::activity::{
    ActivityDraft, ActivityEntry, ActivityFilterPatch, ActivityFilters, ActivityId, ActivityPatch,
    ActivityResult, ActivitySource, price_range_for_comfort,
};
use crate::model::lodging::LodgingEntryId;
use crate::services::{ActivitySearchService, RecommendationService, SearchRequest, ServiceError};
use crate::stores::lodging::LodgingStore;
use crate::stores::next_id;

/// Durable key; holds only this store's state.
pub const ACTIVITY_KEY: &str = "wayplan.activities";

/// Error type for activity operations that need a user-visible message.
#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    #[error("unknown destination: {0}")]
    UnknownDestination(LodgingEntryId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
struct ActivityState {
    #[serde(default)]
    entries: IndexMap<ActivityId, ActivityEntry>,
    #[serde(default)]
    filters: ActivityFilters,
}

pub struct ActivityStore {
    state: ActivityState,
    storage: Rc<dyn Storage>,
    bus: Rc<EventBus>,
    // Transient search session; never persisted.
    results: Vec<ActivityResult>,
    next_cursor: Option<String>,
    last_search: Option<SearchRequest>,
    searching: bool,
    recommendations: Vec<ActivityResult>,
    loading_recommendations: bool,
    error: Option<String>,
    price_filter_overridden: bool,
}

impl ActivityStore {
    pub fn load(storage: Rc<dyn Storage>, bus: Rc<EventBus>) -> Self {
        let state: ActivityState = storage
            .read(ACTIVITY_KEY)
            .and_then(|text| codec::decode(&text))
            .unwrap_or_default();
        ActivityStore {
            state,
            storage,
            bus,
            results: Vec::new(),
            next_cursor: None,
            last_search: None,
            searching: false,
            recommendations: Vec::new(),
            loading_recommendations: false,
            error: None,
            price_filter_overridden: false,
        }
    }

    fn commit(&mut self) {
        if let Some(text) = codec::encode(&self.state) {
            if let Err(e) = self.storage.write(ACTIVITY_KEY, &text) {
                tracing::warn!(error = %e, "activity state write failed; session continues");
            }
        }
        self.bus.emit(Event::ActivitiesChanged);
    }

    // --- accessors --------------------------------------------------------

    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.state.entries.values()
    }

    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }

    pub fn get(&self, id: &ActivityId) -> Option<&ActivityEntry> {
        self.state.entries.get(id)
    }

    pub fn filters(&self) -> &ActivityFilters {
        &self.state.filters
    }

    pub fn results(&self) -> &[ActivityResult] {
        &self.results
    }

    pub fn recommendations(&self) -> &[ActivityResult] {
        &self.recommendations
    }

    pub fn is_searching(&self) -> bool {
        self.searching
    }

    pub fn is_loading_recommendations(&self) -> bool {
        self.loading_recommendations
    }

    pub fn has_more_results(&self) -> bool {
        self.next_cursor.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    // --- search session ---------------------------------------------------

    /// Start a search: raises the in-progress flag, clears the previous
    /// error, records the originating parameters (the staleness token), and
    /// signals the map.
    pub fn begin_search(&mut self, request: SearchRequest) {
        self.bus.emit(Event::ActivitySearch {
            city: request.city.clone(),
            country_code: request.country_code.clone(),
            check_in: request.check_in,
            check_out: request.check_out,
        });
        self.searching = true;
        self.error = None;
        self.last_search = Some(request.without_cursor());
    }

    /// Commit a search outcome. An outcome whose originating parameters no
    /// longer match the last search started is stale — a newer search owns
    /// the session — and is discarded without touching any session state,
    /// including the in-progress flag the newer search holds. Only the
    /// owning outcome clears the flag, whether it succeeded or failed.
    pub fn finish_search(
        &mut self,
        request: &SearchRequest,
        outcome: Result<crate::model::activity::ResultPage, ServiceError>,
    ) {
        if self.last_search.as_ref() != Some(&request.without_cursor()) {
            tracing::debug!(city = %request.city, "discarded stale search response");
            return;
        }
        self.searching = false;
        match outcome {
            Ok(page) => {
                if request.cursor.is_some() {
                    self.results.extend(page.items);
                } else {
                    self.results = page.items;
                }
                self.next_cursor = page.next_cursor;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    /// Full search flow. Never propagates the service failure; it lands in
    /// the store's dismissible message.
    pub async fn search(&mut self, service: &dyn ActivitySearchService, request: SearchRequest) {
        self.begin_search(request.clone());
        let outcome = service.search(&request).await;
        self.finish_search(&request, outcome);
    }

    /// Append the next page using the last search's parameters. A no-op
    /// without a prior search or a further page.
    pub async fn load_more(&mut self, service: &dyn ActivitySearchService) {
        let (Some(base), Some(cursor)) = (self.last_search.clone(), self.next_cursor.clone())
        else {
            return;
        };
        let mut request = base;
        request.cursor = Some(cursor);
        self.searching = true;
        let outcome = service.search(&request).await;
        self.finish_search(&request, outcome);
    }

    /// Destination-scoped recommendations, behind their own in-progress
    /// flag so a slow fetch never blocks the search UI.
    pub async fn load_recommendations(
        &mut self,
        service: &dyn RecommendationService,
        lodging: &LodgingStore,
        destination: &LodgingEntryId,
    ) {
        let Some(entry) = lodging.entry(destination) else {
            self.error = Some(ActivityError::UnknownDestination(destination.clone()).to_string());
            return;
        };
        let (city, country_code) = (entry.city.clone(), entry.country_code.clone());
        self.loading_recommendations = true;
        let outcome = service
            .recommendations(&city, country_code.as_deref())
            .await;
        self.loading_recommendations = false;
        match outcome {
            Ok(page) => self.recommendations = page.items,
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    // --- entry CRUD -------------------------------------------------------

    /// Materialize a transient search result into a persisted entry,
    /// denormalizing the destination's city/country for display.
    pub fn add_from_search_result(
        &mut self,
        result: &ActivityResult,
        destination: &LodgingEntryId,
        lodging: &LodgingStore,
    ) -> Result<ActivityId, ActivityError> {
        let Some(dest) = lodging.entry(destination) else {
            return Err(ActivityError::UnknownDestination(destination.clone()));
        };
        let (city, country) = (dest.city.clone(), dest.country.clone());
        let id = self.assign_id();
        let now = Utc::now();
        let entry = ActivityEntry {
            id: id.clone(),
            destination: destination.clone(),
            city,
            country,
            title: result.title.clone(),
            description: result.description.clone(),
            media: result.media.clone(),
            categories: result.categories.clone(),
            pricing: result.pricing.clone(),
            rating: result.rating,
            duration_minutes: result.duration_minutes,
            slot: None,
            source: ActivitySource::Search,
            booked: false,
            user_modified: false,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.state.entries.insert(id.clone(), entry);
        self.commit();
        Ok(id)
    }

    /// A manually entered activity.
    pub fn add_manual(
        &mut self,
        draft: ActivityDraft,
        destination: &LodgingEntryId,
        lodging: &LodgingStore,
    ) -> Result<ActivityId, ActivityError> {
        let Some(dest) = lodging.entry(destination) else {
            return Err(ActivityError::UnknownDestination(destination.clone()));
        };
        let (city, country) = (dest.city.clone(), dest.country.clone());
        let id = self.assign_id();
        let now = Utc::now();
        let entry = ActivityEntry {
            id: id.clone(),
            destination: destination.clone(),
            city,
            country,
            title: draft.title,
            description: draft.description,
            media: Vec::new(),
            categories: draft.categories,
            pricing: draft.pricing.unwrap_or_default(),
            rating: Default::default(),
            duration_minutes: draft.duration_minutes,
            slot: draft.slot,
            source: ActivitySource::Manual,
            booked: false,
            user_modified: false,
            created_at: Some(now),
            updated_at: Some(now),
        };
        self.state.entries.insert(id.clone(), entry);
        self.commit();
        Ok(id)
    }

    fn assign_id(&self) -> ActivityId {
        ActivityId::new(next_id(
            "A",
            self.state.entries.keys().map(|id| id.as_str()),
        ))
    }

    /// Partial update; the entry is marked user-modified.
    pub fn update(&mut self, id: &ActivityId, patch: ActivityPatch) -> bool {
        let Some(entry) = self.state.entries.get_mut(id) else {
            return false;
        };
        patch.apply(entry);
        entry.user_modified = true;
        entry.updated_at = Some(Utc::now());
        self.commit();
        true
    }

    pub fn remove(&mut self, id: &ActivityId) -> bool {
        if self.state.entries.shift_remove(id).is_none() {
            return false;
        }
        self.commit();
        true
    }

    // --- filters ----------------------------------------------------------

    /// Plain merge into the active filter bundle. An explicit price range
    /// pins the filter for the rest of the session: the comfort-level
    /// derivation stops touching it.
    pub fn update_filters(&mut self, patch: ActivityFilterPatch) {
        if let Some(categories) = patch.categories {
            self.state.filters.categories = categories;
        }
        if let Some((min, max)) = patch.price_range {
            self.state.filters.price_min = min;
            self.state.filters.price_max = max.max(min);
            self.price_filter_overridden = true;
        }
        if let Some(min_rating) = patch.min_rating {
            self.state.filters.min_rating = min_rating;
        }
        if let Some(duration) = patch.duration {
            self.state.filters.duration = Some(duration);
        }
        if let Some(time_of_day) = patch.time_of_day {
            self.state.filters.time_of_day = Some(time_of_day);
        }
        self.commit();
    }

    /// Re-derive the default price range from the traveler comfort scalar.
    /// Skipped once the user has overridden the price filter this session.
    pub fn apply_comfort_level(&mut self, level: f64) {
        if self.price_filter_overridden {
            return;
        }
        let (min, max) = price_range_for_comfort(level);
        if self.state.filters.price_min == min && self.state.filters.price_max == max {
            return;
        }
        self.state.filters.price_min = min;
        self.state.filters.price_max = max;
        self.commit();
    }

    // --- reconciliation ---------------------------------------------------

    /// Delete every entry whose destination no longer resolves in the
    /// lodging store. Runs after every lodging removal, not only at
    /// startup. Returns the pruned count, which also goes out as a
    /// user-visible notice event.
    pub fn reconcile(&mut self, lodging: &LodgingStore) -> usize {
        let before = self.state.entries.len();
        self.state
            .entries
            .retain(|_, entry| lodging.contains(&entry.destination));
        let pruned = before - self.state.entries.len();
        if pruned > 0 {
            tracing::debug!(pruned, "removed activities for vanished destinations");
            self.commit();
            self.bus.emit(Event::ActivitiesPruned { count: pruned });
        }
        pruned
    }
}
