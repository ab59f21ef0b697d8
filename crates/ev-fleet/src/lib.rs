//! `ev-fleet`: ambulance agents, missions, and civilian traffic.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`ambulance`] | `Ambulance`, `Advance`: per-ambulance position integrator     |
//! | [`mission`]   | `Mission`, `LegEvent`, `DispatchOutcome`                      |
//! | [`fleet`]     | `Fleet`: every ambulance with its mission, plan, and ETA      |
//! | [`civilian`]  | `Civilian`, `CivilianTraffic`, `CivilianParams`               |
//! | [`error`]     | `FleetError`, `FleetResult<T>`                                |
//!
//! # Movement model
//!
//! Ambulances move waypoint to waypoint along the active leg of their
//! [`MissionPlan`](ev_spatial::MissionPlan) at a fixed speed per tick.  A
//! tick that would overshoot the target waypoint snaps onto it instead.
//! The fleet advances the waypoint index and switches legs
//! (to patient → to hospital → idle); the simulation decides whether an
//! ambulance may move at all this tick.

pub mod ambulance;
pub mod civilian;
pub mod error;
pub mod fleet;
pub mod mission;

#[cfg(test)]
mod tests;

pub use ambulance::{Advance, Ambulance};
pub use civilian::{Civilian, CivilianParams, CivilianState, CivilianTraffic};
pub use error::{FleetError, FleetResult};
pub use fleet::Fleet;
pub use mission::{DispatchOutcome, LegEvent, Mission};
