pub mod activity;
pub mod flight;
pub mod geo;
pub mod lodging;
pub mod traveler;

pub use activity::*;
pub use flight::*;
pub use geo::*;
pub use lodging::*;
pub use traveler::*;
