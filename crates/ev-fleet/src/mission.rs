//! Mission descriptions and the events a mission produces.

use ev_core::{AmbulanceId, IntersectionId, Tick};

/// Station → patient → hospital, dispatched at `dispatch_tick`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Mission {
    pub station: IntersectionId,
    pub patient: IntersectionId,
    pub hospital: IntersectionId,
    #[cfg_attr(feature = "serialize", serde(default))]
    pub dispatch_tick: Tick,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Dispatched,
    /// No drivable route to the patient; the ambulance stays idle where it is.
    NoRoute,
}

/// Leg transitions reported by [`Fleet::step`](crate::Fleet::step).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum LegEvent {
    /// Arrived at the patient and started the hospital leg.
    ReachedPatient { ambulance: AmbulanceId, elapsed_secs: f64 },
    /// Arrived at the hospital; the mission is over and `eta_secs` is the
    /// time from dispatch.
    ReachedHospital { ambulance: AmbulanceId, eta_secs: f64 },
    /// Arrived at the patient but the hospital is unreachable.  The
    /// ambulance goes idle where it stands.
    Stalled { ambulance: AmbulanceId },
}
