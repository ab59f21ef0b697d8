//! Background cycling for signals that are not preempted.

use ev_core::{IntersectionId, SignalId, SimClock, Tick};

use crate::signal::{LightPhase, Signal};

// ── BackgroundPolicy ──────────────────────────────────────────────────────────

/// Baseline behaviour of a signal with no preemption active.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(tag = "kind", rename_all = "snake_case"))]
pub enum BackgroundPolicy {
    /// Idle signals rest RED forever.
    #[default]
    AllRed,
    /// Round-robin per intersection: one signal GREEN, then YELLOW, then the
    /// next signal GREEN.  A lone signal rests RED for `red_ms` between
    /// greens.
    Cycle { green_ms: u64, yellow_ms: u64, red_ms: u64 },
}

impl BackgroundPolicy {
    /// 15 s green, 3 s yellow, 15 s red.
    pub const STANDARD_CYCLE: BackgroundPolicy =
        BackgroundPolicy::Cycle { green_ms: 15_000, yellow_ms: 3_000, red_ms: 15_000 };

    pub fn is_cycling(&self) -> bool {
        matches!(self, BackgroundPolicy::Cycle { .. })
    }
}

// ── IntersectionCycle ─────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Stage {
    Green,
    Yellow,
    Red,
}

/// Round-robin state for the signals of one intersection.
#[derive(Clone, Debug)]
pub struct IntersectionCycle {
    pub intersection: IntersectionId,
    /// Member signals in ascending id order.
    pub signals: Vec<SignalId>,
    current: usize,
    stage: Stage,
    next_change: Tick,
    suspended: bool,
}

impl IntersectionCycle {
    pub fn new(intersection: IntersectionId, mut signals: Vec<SignalId>) -> Self {
        signals.sort();
        Self {
            intersection,
            signals,
            current: 0,
            stage: Stage::Green,
            next_change: Tick::ZERO,
            suspended: false,
        }
    }

    /// Signal currently served by the cycle.
    pub fn current_signal(&self) -> Option<SignalId> {
        self.signals.get(self.current).copied()
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn next_change(&self) -> Tick {
        self.next_change
    }

    /// Stop cycling.  Called when any member signal is preempted.
    pub fn suspend(&mut self) {
        self.suspended = true;
    }

    /// Start from a clean phase: first signal GREEN, the rest RED.
    pub fn restart(&mut self, signals: &mut [Signal], policy: BackgroundPolicy, clock: &SimClock) {
        self.suspended = false;
        self.current = 0;
        self.stage = Stage::Green;
        let now = clock.current_tick;
        match policy {
            BackgroundPolicy::AllRed => {
                for &id in &self.signals {
                    signals[id.index()].set_background(LightPhase::Red, None);
                }
            }
            BackgroundPolicy::Cycle { green_ms, .. } => {
                self.next_change = now + clock.ticks_for_ms(green_ms).max(1);
                for (i, &id) in self.signals.iter().enumerate() {
                    if i == 0 {
                        signals[id.index()].set_background(LightPhase::Green, Some(self.next_change));
                    } else {
                        signals[id.index()].set_background(LightPhase::Red, None);
                    }
                }
            }
        }
    }

    /// Advance the cycle if its current stage has elapsed.  Returns `true`
    /// if any phase changed.
    pub fn step(&mut self, signals: &mut [Signal], policy: BackgroundPolicy, clock: &SimClock) -> bool {
        let BackgroundPolicy::Cycle { green_ms, yellow_ms, red_ms } = policy else {
            return false;
        };
        let now = clock.current_tick;
        if self.suspended || self.signals.is_empty() || now < self.next_change {
            return false;
        }

        let ticks = |ms: u64| clock.ticks_for_ms(ms).max(1);
        let cur = self.signals[self.current];
        match self.stage {
            Stage::Green => {
                self.stage = Stage::Yellow;
                self.next_change = now + ticks(yellow_ms);
                signals[cur.index()].set_background(LightPhase::Yellow, Some(self.next_change));
            }
            Stage::Yellow if self.signals.len() == 1 => {
                self.stage = Stage::Red;
                self.next_change = now + ticks(red_ms);
                signals[cur.index()].set_background(LightPhase::Red, Some(self.next_change));
            }
            Stage::Yellow | Stage::Red => {
                signals[cur.index()].set_background(LightPhase::Red, None);
                self.current = (self.current + 1) % self.signals.len();
                self.stage = Stage::Green;
                self.next_change = now + ticks(green_ms);
                let next = self.signals[self.current];
                signals[next.index()].set_background(LightPhase::Green, Some(self.next_change));
            }
        }
        true
    }
}
