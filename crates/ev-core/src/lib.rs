//! `ev-core`: foundational types for the emergency-vehicle preemption
//! simulator.
//!
//! This crate is a dependency of every other `ev-*` crate.  It has no `ev-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module        | Contents                                                  |
//! |---------------|-----------------------------------------------------------|
//! | [`ids`]       | `AmbulanceId`, `IntersectionId`, `SegmentId`, `SignalId`, `VehicleId` |
//! | [`geo`]       | `GeoPoint`, haversine, point-to-segment, `move_towards`   |
//! | [`direction`] | `Approach` (N/E/S/W), `ApproachSet`                       |
//! | [`phase`]     | `AmbulancePhase`, `AmbulanceStatus`                       |
//! | [`time`]      | `Tick`, `SimClock`, `SimConfig`                           |
//! | [`rng`]       | `SimRng`                                                  |
//! | [`error`]     | `EvError`, `EvResult` (config and label validation)       |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod direction;
pub mod error;
pub mod geo;
pub mod ids;
pub mod phase;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use direction::{Approach, ApproachSet};
pub use error::{EvError, EvResult};
pub use geo::GeoPoint;
pub use ids::{AmbulanceId, IntersectionId, SegmentId, SignalId, VehicleId};
pub use phase::{AmbulancePhase, AmbulanceStatus};
pub use rng::SimRng;
pub use time::{SimClock, SimConfig, Tick};
