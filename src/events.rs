//! Typed in-process publish/subscribe channel.
//!
//! The bus decouples the stores from the UI regions that react to them (map,
//! chat, tabs) without either side holding a handle to the other. Delivery
//! is synchronous and in registration order; nothing is queued or durable —
//! an emit with no subscribers is simply lost, because events are "refresh
//! your view" signals, never the data of record.
//!
//! The bus is an explicitly constructed instance owned by the composition
//! root and handed to subscribers, so tests get an isolated bus each.
//! Subscribers that attach on activation must detach on deactivation; the
//! bus does not manage their lifecycle.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use chrono::NaiveDate;
use indexmap::IndexMap;

/// The planning tabs external UI collaborators can be pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Profile,
    Flights,
    Lodging,
    Activities,
}

/// Event topics. The string forms are the contract with the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    DestinationFocus,
    ActivitySearch,
    TabFlash,
    SwitchTab,
    TravelerChanged,
    FlightPlanChanged,
    LodgingChanged,
    ActivitiesChanged,
    ActivitiesPruned,
}

impl Topic {
    pub fn as_str(self) -> &'static str {
        match self {
            Topic::DestinationFocus => "map:focus-destination",
            Topic::ActivitySearch => "activities:search",
            Topic::TabFlash => "ui:flash-tab",
            Topic::SwitchTab => "ui:switch-tab",
            Topic::TravelerChanged => "traveler:changed",
            Topic::FlightPlanChanged => "flights:changed",
            Topic::LodgingChanged => "lodging:changed",
            Topic::ActivitiesChanged => "activities:changed",
            Topic::ActivitiesPruned => "activities:pruned",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event payloads: plain data, never object references.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Pan the map to a destination.
    DestinationFocus {
        city: String,
        country_code: Option<String>,
    },
    /// An activity search started; the map prepares its overlay.
    ActivitySearch {
        city: String,
        country_code: Option<String>,
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
    },
    /// Draw attention to a tab after a background mutation.
    TabFlash { tab: Tab },
    /// Make a tab the active one.
    SwitchTab { tab: Tab },
    TravelerChanged,
    FlightPlanChanged,
    LodgingChanged,
    ActivitiesChanged,
    /// Entries were pruned because their destination disappeared.
    ActivitiesPruned { count: usize },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::DestinationFocus { .. } => Topic::DestinationFocus,
            Event::ActivitySearch { .. } => Topic::ActivitySearch,
            Event::TabFlash { .. } => Topic::TabFlash,
            Event::SwitchTab { .. } => Topic::SwitchTab,
            Event::TravelerChanged => Topic::TravelerChanged,
            Event::FlightPlanChanged => Topic::FlightPlanChanged,
            Event::LodgingChanged => Topic::LodgingChanged,
            Event::ActivitiesChanged => Topic::ActivitiesChanged,
            Event::ActivitiesPruned { .. } => Topic::ActivitiesPruned,
        }
    }
}

type Handler = Rc<dyn Fn(&Event)>;

/// Ticket returned by [`EventBus::on`]; pass it back to [`EventBus::off`]
/// on deactivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    topic: Topic,
    id: u64,
}

/// The process's event channel. Single-threaded; handlers run on the
/// emitting call stack.
#[derive(Default)]
pub struct EventBus {
    handlers: RefCell<IndexMap<Topic, Vec<(u64, Handler)>>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    /// Subscribe a handler to a topic. Handlers for one topic run in
    /// registration order.
    pub fn on(&self, topic: Topic, handler: impl Fn(&Event) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers
            .borrow_mut()
            .entry(topic)
            .or_default()
            .push((id, Rc::new(handler)));
        Subscription { topic, id }
    }

    /// Remove a subscription. Unknown tickets are ignored.
    pub fn off(&self, subscription: Subscription) {
        if let Some(list) = self.handlers.borrow_mut().get_mut(&subscription.topic) {
            list.retain(|(id, _)| *id != subscription.id);
        }
    }

    /// Deliver an event to every current subscriber of its topic,
    /// synchronously and in registration order. A handler that panics is
    /// caught and logged so its siblings still run. The handler list is
    /// snapshotted first, so a handler may subscribe or unsubscribe without
    /// poisoning the fan-out; additions take effect from the next emit.
    pub fn emit(&self, event: Event) {
        let topic = event.topic();
        let snapshot: Vec<Handler> = self
            .handlers
            .borrow()
            .get(&topic)
            .map(|list| list.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();

        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(&event))).is_err() {
                tracing::error!(topic = %topic, "event handler panicked");
            }
        }
    }
}
