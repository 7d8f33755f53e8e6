//! wayplan — the trip-state synchronization core of a trip-planning UI.
//!
//! Four independent stores (traveler/itinerary, flight plan, lodging,
//! activities) persist durably through a defensive codec, stay referentially
//! consistent as destinations come and go, and notify decoupled UI regions
//! (map, chat, tabs) through an injected event bus. Rendering, map drawing
//! and the real search backends live elsewhere; this crate owns the state,
//! its invariants, and the seams to those collaborators.

pub mod config;
pub mod events;
pub mod io;
pub mod model;
pub mod planner;
pub mod services;
pub mod stores;
