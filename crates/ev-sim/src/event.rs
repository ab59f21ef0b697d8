//! `SimEvent`: the human-readable event log exposed to observers.

use std::fmt;

use ev_core::{AmbulanceId, SignalId, Tick};
use ev_fleet::LegEvent;
use ev_signal::{StaleReason, TimerKind};

#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    Dispatched { tick: Tick, ambulance: AmbulanceId, signals_on_route: usize },
    /// No route to the patient; the ambulance stays idle where it is.
    NoRoute { tick: Tick, ambulance: AmbulanceId },
    SignalPreempted { tick: Tick, signal: SignalId, ambulance: AmbulanceId },
    ClearanceStarted { tick: Tick, signal: SignalId, ambulance: AmbulanceId },
    SignalReleased { tick: Tick, signal: SignalId, ambulance: AmbulanceId },
    AmbulanceHeld { tick: Tick, ambulance: AmbulanceId, signal: SignalId },
    /// The wait is over: the held signal is GREEN and the ambulance moves on.
    WaitEnded { tick: Tick, ambulance: AmbulanceId, signal: SignalId },
    PreemptionConflict { tick: Tick, signal: SignalId, winner: AmbulanceId, loser: AmbulanceId },
    StaleTimer { tick: Tick, signal: SignalId, ambulance: AmbulanceId, kind: TimerKind, reason: StaleReason },
    ReachedPatient { tick: Tick, ambulance: AmbulanceId, elapsed_secs: f64 },
    ReachedHospital { tick: Tick, ambulance: AmbulanceId, eta_secs: f64 },
    /// Reached the patient with no route to the hospital.
    Stalled { tick: Tick, ambulance: AmbulanceId },
    Reset { tick: Tick, epoch: u64 },
}

impl SimEvent {
    pub fn tick(&self) -> Tick {
        match *self {
            SimEvent::Dispatched { tick, .. }
            | SimEvent::NoRoute { tick, .. }
            | SimEvent::SignalPreempted { tick, .. }
            | SimEvent::ClearanceStarted { tick, .. }
            | SimEvent::SignalReleased { tick, .. }
            | SimEvent::AmbulanceHeld { tick, .. }
            | SimEvent::WaitEnded { tick, .. }
            | SimEvent::PreemptionConflict { tick, .. }
            | SimEvent::StaleTimer { tick, .. }
            | SimEvent::ReachedPatient { tick, .. }
            | SimEvent::ReachedHospital { tick, .. }
            | SimEvent::Stalled { tick, .. }
            | SimEvent::Reset { tick, .. } => tick,
        }
    }

    /// Short machine-friendly name, used as the `kind` column of event logs.
    pub fn kind(&self) -> &'static str {
        match self {
            SimEvent::Dispatched { .. }         => "dispatched",
            SimEvent::NoRoute { .. }            => "no_route",
            SimEvent::SignalPreempted { .. }    => "signal_preempted",
            SimEvent::ClearanceStarted { .. }   => "clearance_started",
            SimEvent::SignalReleased { .. }     => "signal_released",
            SimEvent::AmbulanceHeld { .. }      => "ambulance_held",
            SimEvent::WaitEnded { .. }          => "wait_ended",
            SimEvent::PreemptionConflict { .. } => "preemption_conflict",
            SimEvent::StaleTimer { .. }         => "stale_timer",
            SimEvent::ReachedPatient { .. }     => "reached_patient",
            SimEvent::ReachedHospital { .. }    => "reached_hospital",
            SimEvent::Stalled { .. }            => "stalled",
            SimEvent::Reset { .. }              => "reset",
        }
    }

    /// The ambulance involved, if any.  Conflicts report the loser.
    pub fn ambulance(&self) -> Option<AmbulanceId> {
        match *self {
            SimEvent::Dispatched { ambulance, .. }
            | SimEvent::NoRoute { ambulance, .. }
            | SimEvent::SignalPreempted { ambulance, .. }
            | SimEvent::ClearanceStarted { ambulance, .. }
            | SimEvent::SignalReleased { ambulance, .. }
            | SimEvent::AmbulanceHeld { ambulance, .. }
            | SimEvent::WaitEnded { ambulance, .. }
            | SimEvent::StaleTimer { ambulance, .. }
            | SimEvent::ReachedPatient { ambulance, .. }
            | SimEvent::ReachedHospital { ambulance, .. }
            | SimEvent::Stalled { ambulance, .. } => Some(ambulance),
            SimEvent::PreemptionConflict { loser, .. } => Some(loser),
            SimEvent::Reset { .. } => None,
        }
    }

    /// The signal involved, if any.
    pub fn signal(&self) -> Option<SignalId> {
        match *self {
            SimEvent::SignalPreempted { signal, .. }
            | SimEvent::ClearanceStarted { signal, .. }
            | SimEvent::SignalReleased { signal, .. }
            | SimEvent::AmbulanceHeld { signal, .. }
            | SimEvent::WaitEnded { signal, .. }
            | SimEvent::PreemptionConflict { signal, .. }
            | SimEvent::StaleTimer { signal, .. } => Some(signal),
            _ => None,
        }
    }

    pub(crate) fn from_leg(tick: Tick, leg: LegEvent) -> Self {
        match leg {
            LegEvent::ReachedPatient { ambulance, elapsed_secs } => {
                SimEvent::ReachedPatient { tick, ambulance, elapsed_secs }
            }
            LegEvent::ReachedHospital { ambulance, eta_secs } => {
                SimEvent::ReachedHospital { tick, ambulance, eta_secs }
            }
            LegEvent::Stalled { ambulance } => SimEvent::Stalled { tick, ambulance },
        }
    }
}

impl fmt::Display for SimEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.tick())?;
        match self {
            SimEvent::Dispatched { ambulance, signals_on_route, .. } => {
                write!(f, "{ambulance} dispatched, {signals_on_route} signals on route")
            }
            SimEvent::NoRoute { ambulance, .. } => {
                write!(f, "{ambulance} has no route to the patient and stays idle")
            }
            SimEvent::SignalPreempted { signal, ambulance, .. } => {
                write!(f, "{signal} turned GREEN for {ambulance}")
            }
            SimEvent::ClearanceStarted { signal, ambulance, .. } => {
                write!(f, "{ambulance} passed {signal}; clearance started")
            }
            SimEvent::SignalReleased { signal, ambulance, .. } => {
                write!(f, "{signal} released by {ambulance}, back to RED")
            }
            SimEvent::AmbulanceHeld { ambulance, signal, .. } => {
                write!(f, "{ambulance} stopped at {signal}")
            }
            SimEvent::WaitEnded { ambulance, signal, .. } => {
                write!(f, "{signal} GREEN, {ambulance} proceeds")
            }
            SimEvent::PreemptionConflict { signal, winner, loser, .. } => {
                write!(f, "{loser} lost {signal} to nearer {winner}")
            }
            SimEvent::StaleTimer { signal, ambulance, kind, reason, .. } => {
                write!(f, "ignored stale {} for {signal}/{ambulance} ({reason:?})", kind.as_str())
            }
            SimEvent::ReachedPatient { ambulance, elapsed_secs, .. } => {
                write!(f, "{ambulance} reached the patient after {elapsed_secs:.1} s")
            }
            SimEvent::ReachedHospital { ambulance, eta_secs, .. } => {
                write!(f, "{ambulance} reached the hospital, mission time {eta_secs:.1} s")
            }
            SimEvent::Stalled { ambulance, .. } => {
                write!(f, "{ambulance} cannot reach the hospital and has stopped")
            }
            SimEvent::Reset { epoch, .. } => write!(f, "simulation reset (epoch {epoch})"),
        }
    }
}
