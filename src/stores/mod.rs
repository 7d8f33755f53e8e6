pub mod activity;
pub mod flight;
pub mod lodging;
pub mod traveler;

pub use activity::{ActivityError, ActivityStore};
pub use flight::FlightPlanStore;
pub use lodging::LodgingStore;
pub use traveler::TravelerStore;

/// Assign the next `PREFIX-NNN` identifier by scanning the collection for
/// the highest existing suffix, so ids stay stable across sessions and
/// never collide after removals.
pub(crate) fn next_id<'a>(prefix: &str, existing: impl Iterator<Item = &'a str>) -> String {
    let mut max = 0u32;
    for id in existing {
        if let Some(n) = id
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|digits| digits.parse::<u32>().ok())
        {
            max = max.max(n);
        }
    }
    format!("{}-{:03}", prefix, max + 1)
}
