//! Per-signal state machine.
//!
//! ```text
//!              preempt                 begin_clearance
//!   NORMAL ───────────────► EMERGENCY ─────────────────► ENDING_EMERGENCY
//!     ▲   hold (RED)          │  grant (RED → GREEN)            │
//!     │                       │                                 │
//!     └──────── release ──────┴──────────── release ────────────┘
//! ```
//!
//! Transitions here touch one signal only.  Rules that span an intersection
//! (conflicting approaches, cycle suspension) live on
//! [`SignalBoard`](crate::SignalBoard).

use ev_core::{AmbulanceId, Approach, GeoPoint, IntersectionId, SignalId, Tick};

// ── LightPhase ────────────────────────────────────────────────────────────────

/// Displayed light colour.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum LightPhase {
    #[default]
    Red,
    Yellow,
    Green,
}

impl LightPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            LightPhase::Red    => "RED",
            LightPhase::Yellow => "YELLOW",
            LightPhase::Green  => "GREEN",
        }
    }
}

impl std::fmt::Display for LightPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── SignalMode ────────────────────────────────────────────────────────────────

/// Who is driving the signal: the background cycle or a preemption.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalMode {
    #[default]
    Normal,
    Emergency,
    /// Clearance interval after the owning ambulance has passed.
    EndingEmergency,
}

impl SignalMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SignalMode::Normal          => "NORMAL",
            SignalMode::Emergency       => "EMERGENCY",
            SignalMode::EndingEmergency => "ENDING_EMERGENCY",
        }
    }
}

impl std::fmt::Display for SignalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Signal ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    pub id: SignalId,
    pub intersection: IntersectionId,
    pub position: GeoPoint,
    /// Controlled approach; `None` for a simple light facing every direction.
    pub approach: Option<Approach>,

    pub phase: LightPhase,
    pub mode: SignalMode,
    pub preempted_by: Option<AmbulanceId>,
    /// Whole seconds until `deadline`, 0 when none is pending.
    pub countdown_secs: u32,
    /// Tick of the next scheduled change of this signal, if any.
    pub deadline: Option<Tick>,
    /// Bumped on every preemption transition.  Timers scheduled against an
    /// older generation are stale.
    pub generation: u64,
}

impl Signal {
    pub fn new(id: SignalId, intersection: IntersectionId, position: GeoPoint) -> Self {
        Self {
            id,
            intersection,
            position,
            approach: None,
            phase: LightPhase::Red,
            mode: SignalMode::Normal,
            preempted_by: None,
            countdown_secs: 0,
            deadline: None,
            generation: 0,
        }
    }

    pub fn with_approach(mut self, approach: Approach) -> Self {
        self.approach = Some(approach);
        self
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn is_green(&self) -> bool {
        self.phase == LightPhase::Green
    }

    #[inline]
    pub fn is_red(&self) -> bool {
        self.phase == LightPhase::Red
    }

    #[inline]
    pub fn is_normal(&self) -> bool {
        self.mode == SignalMode::Normal
    }

    #[inline]
    pub fn is_owned_by(&self, ambulance: AmbulanceId) -> bool {
        self.preempted_by == Some(ambulance)
    }

    /// GREEN because `ambulance` preempted it and has not yet passed.
    pub fn is_preempted_green_for(&self, ambulance: AmbulanceId) -> bool {
        self.is_green() && self.mode == SignalMode::Emergency && self.is_owned_by(ambulance)
    }

    /// Resolver input for this signal.
    pub fn site(&self) -> ev_spatial::SignalSite {
        ev_spatial::SignalSite { id: self.id, position: self.position, approach: self.approach }
    }

    // ── Preemption transitions ────────────────────────────────────────────

    /// Any state → GREEN, EMERGENCY, owned by `ambulance`.
    pub fn preempt(&mut self, ambulance: AmbulanceId) {
        self.phase = LightPhase::Green;
        self.mode = SignalMode::Emergency;
        self.preempted_by = Some(ambulance);
        self.deadline = None;
        self.generation += 1;
    }

    /// Normal-mode stop: RED, EMERGENCY, owned by `ambulance` until `until`.
    pub fn hold(&mut self, ambulance: AmbulanceId, until: Tick) {
        self.phase = LightPhase::Red;
        self.mode = SignalMode::Emergency;
        self.preempted_by = Some(ambulance);
        self.deadline = Some(until);
        self.generation += 1;
    }

    /// Held RED → GREEN for the owner, staying GREEN until `until`.
    pub fn grant(&mut self, until: Tick) {
        self.phase = LightPhase::Green;
        self.deadline = Some(until);
        self.generation += 1;
    }

    /// EMERGENCY → ENDING_EMERGENCY; stays GREEN until `until`.
    pub fn begin_clearance(&mut self, until: Tick) {
        self.mode = SignalMode::EndingEmergency;
        self.deadline = Some(until);
        self.generation += 1;
    }

    /// Back to RED, NORMAL, no owner.
    pub fn release(&mut self) {
        self.phase = LightPhase::Red;
        self.mode = SignalMode::Normal;
        self.preempted_by = None;
        self.deadline = None;
        self.generation += 1;
    }

    /// RED, EMERGENCY, no owner: a conflicting approach of a preempted
    /// intersection.
    pub fn force_red(&mut self) {
        self.phase = LightPhase::Red;
        self.mode = SignalMode::Emergency;
        self.preempted_by = None;
        self.deadline = None;
        self.generation += 1;
    }

    // ── Background transitions ────────────────────────────────────────────

    /// Set the cycle-driven phase.  Only meaningful in NORMAL mode; the
    /// generation is untouched.
    pub fn set_background(&mut self, phase: LightPhase, deadline: Option<Tick>) {
        debug_assert!(self.is_normal());
        self.phase = phase;
        self.deadline = deadline;
    }

    /// Recompute `countdown_secs` from the pending deadline.
    pub fn refresh_countdown(&mut self, now: Tick, tick_duration_ms: u32) {
        self.countdown_secs = match self.deadline {
            Some(d) => {
                let ms = d.since(now) * tick_duration_ms as u64;
                ms.div_ceil(1_000) as u32
            }
            None => 0,
        };
    }
}
