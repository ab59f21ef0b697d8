//! Signal intents: what one ambulance wants done to the board this tick.

use ev_core::SignalId;

/// A requested signal transition, produced by the read-only planning phase
/// and applied by the coordinator in ascending ambulance order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum SignalIntent {
    /// Smart mode: turn the next signal on the route GREEN.
    Preempt { signal: SignalId, distance_m: f64 },

    /// Normal mode: stop at this signal and hold it RED for the wait.
    Hold { signal: SignalId, distance_m: f64 },

    /// Smart mode: the ambulance is past this signal; start its clearance.
    BeginClearance { signal: SignalId },

    /// Give back a signal the ambulance owns but no longer needs.
    Release { signal: SignalId },
}

impl SignalIntent {
    #[inline]
    pub fn signal(&self) -> SignalId {
        match *self {
            SignalIntent::Preempt { signal, .. }
            | SignalIntent::Hold { signal, .. }
            | SignalIntent::BeginClearance { signal }
            | SignalIntent::Release { signal } => signal,
        }
    }

    /// Claims take ownership of a signal and can contend with other
    /// ambulances.
    #[inline]
    pub fn is_claim(&self) -> bool {
        matches!(self, SignalIntent::Preempt { .. } | SignalIntent::Hold { .. })
    }

    /// Ambulance-to-signal distance of a claim.
    pub fn distance_m(&self) -> Option<f64> {
        match *self {
            SignalIntent::Preempt { distance_m, .. } | SignalIntent::Hold { distance_m, .. } => Some(distance_m),
            _ => None,
        }
    }
}
