//! The `SignalBoard`: every signal in the scenario plus intersection-level
//! rules.
//!
//! Two rules span an intersection:
//!
//! - While any member signal is under preemption, every other member is held
//!   RED (EMERGENCY, no owner) so conflicting approaches are never GREEN
//!   together.
//! - The background cycle is suspended while any member is not NORMAL and
//!   restarts from a clean phase once all members are NORMAL again.

use std::collections::BTreeMap;

use ev_core::{AmbulanceId, IntersectionId, SignalId, SimClock, Tick};
use ev_spatial::{RoadGraph, SignalSite};

use crate::cycle::{BackgroundPolicy, IntersectionCycle};
use crate::signal::{LightPhase, Signal, SignalMode};
use crate::{SignalError, SignalResult};

pub struct SignalBoard {
    /// Indexed by `SignalId`.
    signals: Vec<Signal>,
    cycles: Vec<IntersectionCycle>,
    cycle_of: BTreeMap<IntersectionId, usize>,
    policy: BackgroundPolicy,
}

impl SignalBoard {
    /// Build a board.  Signal ids must be dense from 0 in vector order.
    ///
    /// Signals start at the background baseline as of tick 0.
    pub fn new(signals: Vec<Signal>, policy: BackgroundPolicy) -> SignalResult<Self> {
        for (i, s) in signals.iter().enumerate() {
            let expected = SignalId(i as u32);
            if s.id != expected {
                return Err(SignalError::IdOutOfSequence { expected, found: s.id });
            }
        }

        let mut members: BTreeMap<IntersectionId, Vec<SignalId>> = BTreeMap::new();
        for s in &signals {
            members.entry(s.intersection).or_default().push(s.id);
        }
        let mut cycles = Vec::with_capacity(members.len());
        let mut cycle_of = BTreeMap::new();
        for (intersection, ids) in members {
            cycle_of.insert(intersection, cycles.len());
            cycles.push(IntersectionCycle::new(intersection, ids));
        }

        let mut board = Self { signals, cycles, cycle_of, policy };
        board.reset(&SimClock::new(1));
        Ok(board)
    }

    /// Check that every signal's intersection exists in `graph`.
    pub fn validate(&self, graph: &RoadGraph) -> SignalResult<()> {
        match self.signals.iter().find(|s| !graph.contains(s.intersection)) {
            Some(s) => Err(SignalError::MissingGeometry { signal: s.id, intersection: s.intersection }),
            None => Ok(()),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn policy(&self) -> BackgroundPolicy {
        self.policy
    }

    #[inline]
    pub fn get(&self, id: SignalId) -> Option<&Signal> {
        self.signals.get(id.index())
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Signal> {
        self.signals.iter()
    }

    /// Resolver input for every signal.
    pub fn sites(&self) -> Vec<SignalSite> {
        self.signals.iter().map(Signal::site).collect()
    }

    /// Members of `intersection`, ascending.  Empty if it has no signals.
    pub fn at_intersection(&self, intersection: IntersectionId) -> &[SignalId] {
        self.cycle_of
            .get(&intersection)
            .map(|&c| self.cycles[c].signals.as_slice())
            .unwrap_or(&[])
    }

    pub fn cycle(&self, intersection: IntersectionId) -> Option<&IntersectionCycle> {
        self.cycle_of.get(&intersection).map(|&c| &self.cycles[c])
    }

    /// Signals currently preempted by `ambulance`.
    pub fn owned_by(&self, ambulance: AmbulanceId) -> Vec<SignalId> {
        self.signals
            .iter()
            .filter(|s| s.is_owned_by(ambulance))
            .map(|s| s.id)
            .collect()
    }

    /// `true` if no signal is under preemption.
    pub fn is_baseline(&self) -> bool {
        self.signals.iter().all(|s| s.is_normal() && s.preempted_by.is_none())
    }

    /// Number of GREEN signals at `intersection`.
    pub fn green_count(&self, intersection: IntersectionId) -> usize {
        self.at_intersection(intersection)
            .iter()
            .filter(|id| self.signals[id.index()].is_green())
            .count()
    }

    // ── Preemption transitions ────────────────────────────────────────────
    //
    // Callers have checked that `id` is on the board.

    pub(crate) fn preempt(&mut self, id: SignalId, ambulance: AmbulanceId) {
        self.signals[id.index()].preempt(ambulance);
        self.engage(id);
    }

    pub(crate) fn hold(&mut self, id: SignalId, ambulance: AmbulanceId, until: Tick) {
        self.signals[id.index()].hold(ambulance, until);
        self.engage(id);
    }

    pub(crate) fn grant(&mut self, id: SignalId, until: Tick) {
        self.signals[id.index()].grant(until);
        self.engage(id);
    }

    pub(crate) fn begin_clearance(&mut self, id: SignalId, until: Tick) {
        self.signals[id.index()].begin_clearance(until);
    }

    pub(crate) fn release(&mut self, id: SignalId) {
        self.signals[id.index()].release();
        let intersection = self.signals[id.index()].intersection;
        let members = self.at_intersection(intersection).to_vec();
        if members.iter().all(|m| self.signals[m.index()].preempted_by.is_none()) {
            for m in members {
                let s = &mut self.signals[m.index()];
                if s.mode == SignalMode::Emergency {
                    s.release();
                }
            }
        }
    }

    /// Suspend the cycle at `id`'s intersection and hold every other member
    /// RED.
    fn engage(&mut self, id: SignalId) {
        let intersection = self.signals[id.index()].intersection;
        if let Some(&c) = self.cycle_of.get(&intersection) {
            self.cycles[c].suspend();
            for &other in &self.cycles[c].signals {
                if other == id {
                    continue;
                }
                let s = &mut self.signals[other.index()];
                let suppressed = s.is_red() && s.mode == SignalMode::Emergency && s.preempted_by.is_none();
                if !suppressed {
                    if let Some(prev) = s.preempted_by {
                        log::debug!("{other} taken from {prev} by conflicting preemption of {id}");
                    }
                    s.force_red();
                }
            }
        }
    }

    // ── Background ────────────────────────────────────────────────────────

    /// Advance background cycles.  Suspended intersections whose members are
    /// all NORMAL restart cleanly.
    pub fn step_background(&mut self, clock: &SimClock) {
        let policy = self.policy;
        for cycle in &mut self.cycles {
            if cycle.is_suspended() {
                let all_normal = cycle.signals.iter().all(|id| self.signals[id.index()].is_normal());
                if all_normal {
                    cycle.restart(&mut self.signals, policy, clock);
                }
            } else {
                cycle.step(&mut self.signals, policy, clock);
            }
        }
    }

    /// Recompute every signal's countdown.
    pub fn refresh_countdowns(&mut self, clock: &SimClock) {
        for s in &mut self.signals {
            s.refresh_countdown(clock.current_tick, clock.tick_duration_ms);
        }
    }

    /// Return every signal to the background baseline as of `clock`.
    pub fn reset(&mut self, clock: &SimClock) {
        for s in &mut self.signals {
            if !s.is_normal() || s.preempted_by.is_some() {
                s.release();
            }
            s.set_background(LightPhase::Red, None);
            s.countdown_secs = 0;
        }
        let policy = self.policy;
        for cycle in &mut self.cycles {
            cycle.restart(&mut self.signals, policy, clock);
        }
        self.refresh_countdowns(clock);
    }
}
