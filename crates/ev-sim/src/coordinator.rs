//! `TrafficCoordinator`: decides, once per tick, which signal transitions
//! every active ambulance gets.
//!
//! # Per-tick protocol
//!
//! ```text
//! plan        read-only; one intent list per active ambulance, computed from
//!             the board as it stood at the start of the phase
//! arbitrate   claims (preempt/hold) on the same intersection from several
//!             ambulances: nearest wins, ties to the lower id
//! apply       sequential, ascending AmbulanceId
//! ```
//!
//! Wait records are the only authority on whether an ambulance is stopped.
//! They are written in the apply phase and read by the movement phase of the
//! same tick through [`TrafficCoordinator::is_held`].

use std::collections::BTreeMap;

use ev_core::{AmbulanceId, AmbulancePhase, GeoPoint, IntersectionId, SignalId, SimClock, Tick};
use ev_fleet::{Fleet, LegEvent};
use ev_signal::{
    ControllerParams, FireOutcome, PreemptionMode, SignalBoard, SignalController, SignalMode, TimerEvent, TimerKey,
    TimerKind,
};
use ev_spatial::{MissionPlan, SignalOnRouteResolver, SignalSite, SignalsOnRoute};

use crate::event::SimEvent;
use crate::intent::SignalIntent;
use crate::policy::{self, PlanInput};

#[cfg(feature = "fx-hash")]
type Map<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fx-hash"))]
type Map<K, V> = std::collections::HashMap<K, V>;

#[cfg(feature = "fx-hash")]
pub(crate) type SignalSet = rustc_hash::FxHashSet<SignalId>;
#[cfg(not(feature = "fx-hash"))]
pub(crate) type SignalSet = std::collections::HashSet<SignalId>;

// ── Route signal table ────────────────────────────────────────────────────────

/// One leg of one ambulance's mission.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct RouteKey {
    pub ambulance: AmbulanceId,
    pub phase: AmbulancePhase,
}

impl RouteKey {
    pub fn new(ambulance: AmbulanceId, phase: AmbulancePhase) -> Self {
        Self { ambulance, phase }
    }
}

/// Signals on each active leg, resolved once at dispatch.
#[derive(Clone, Debug, Default)]
pub struct RouteSignalTable {
    inner: BTreeMap<RouteKey, SignalsOnRoute>,
}

impl RouteSignalTable {
    pub fn insert(&mut self, key: RouteKey, signals: SignalsOnRoute) {
        self.inner.insert(key, signals);
    }

    pub fn get(&self, key: RouteKey) -> Option<&SignalsOnRoute> {
        self.inner.get(&key)
    }

    /// Drop every leg of `ambulance`.
    pub fn remove_ambulance(&mut self, ambulance: AmbulanceId) {
        self.inner.retain(|k, _| k.ambulance != ambulance);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RouteKey, &SignalsOnRoute)> {
        self.inner.iter()
    }
}

// ── WaitRecord ────────────────────────────────────────────────────────────────

/// Normal mode: an ambulance stopped at a signal.  Exists from the hold
/// until the wait timer fires.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WaitRecord {
    pub signal: SignalId,
    pub wait_start: Tick,
    pub waypoint_index_at_stop: usize,
    pub position: GeoPoint,
}

// ── TrafficCoordinator ────────────────────────────────────────────────────────

pub struct TrafficCoordinator {
    controller: SignalController,
    resolver: SignalOnRouteResolver,
    sites: Vec<SignalSite>,
    routes: RouteSignalTable,
    waits: Map<AmbulanceId, WaitRecord>,
    passed: Map<AmbulanceId, SignalSet>,
}

impl TrafficCoordinator {
    /// Wrap `controller`.  Routes bind signals within the controller's
    /// `route_threshold_m`.
    pub fn new(controller: SignalController) -> Self {
        let resolver = SignalOnRouteResolver::new(controller.params().route_threshold_m);
        let sites = controller.board().sites();
        Self {
            controller,
            resolver,
            sites,
            routes: RouteSignalTable::default(),
            waits: Map::default(),
            passed: Map::default(),
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn controller(&self) -> &SignalController {
        &self.controller
    }

    pub fn board(&self) -> &SignalBoard {
        self.controller.board()
    }

    pub fn params(&self) -> &ControllerParams {
        self.controller.params()
    }

    pub fn mode(&self) -> PreemptionMode {
        self.controller.mode()
    }

    pub fn routes(&self) -> &RouteSignalTable {
        &self.routes
    }

    pub fn wait_record(&self, ambulance: AmbulanceId) -> Option<&WaitRecord> {
        self.waits.get(&ambulance)
    }

    /// `true` while `ambulance` is stopped at a signal.  Held ambulances do
    /// not move.
    #[inline]
    pub fn is_held(&self, ambulance: AmbulanceId) -> bool {
        self.waits.contains_key(&ambulance)
    }

    /// `true` if `ambulance` has already waited at `signal` on this leg.
    pub fn has_passed(&self, ambulance: AmbulanceId, signal: SignalId) -> bool {
        self.passed.get(&ambulance).is_some_and(|p| p.contains(&signal))
    }

    // ── Routes ────────────────────────────────────────────────────────────

    pub fn resolve_route(&self, route: &[GeoPoint]) -> SignalsOnRoute {
        self.resolver.resolve(route, &self.sites)
    }

    /// Resolve the patient and hospital legs of `plan` for `ambulance`,
    /// replacing anything it had before.  Returns how many signals the two
    /// legs carry.
    pub fn assign_mission(&mut self, ambulance: AmbulanceId, plan: &MissionPlan) -> usize {
        self.routes.remove_ambulance(ambulance);
        self.passed.remove(&ambulance);
        let to_patient = self.resolve_route(&plan.to_patient.waypoints);
        let to_hospital = self.resolve_route(&plan.to_hospital.waypoints);
        let count = to_patient.len() + to_hospital.len();
        log::debug!(
            "{ambulance}: {} signals to patient, {} to hospital",
            to_patient.len(),
            to_hospital.len()
        );
        self.routes.insert(RouteKey::new(ambulance, AmbulancePhase::ToPatient), to_patient);
        self.routes.insert(RouteKey::new(ambulance, AmbulancePhase::ToHospital), to_hospital);
        count
    }

    /// Forget every leg of `ambulance`, e.g. after a failed dispatch.
    pub fn drop_mission(&mut self, ambulance: AmbulanceId) {
        self.routes.remove_ambulance(ambulance);
        self.passed.remove(&ambulance);
        self.waits.remove(&ambulance);
    }

    // ── Timers ────────────────────────────────────────────────────────────

    /// Deliver every timer due this tick.
    pub fn fire_timers(&mut self, clock: &SimClock, events: &mut Vec<SimEvent>) {
        for outcome in self.controller.fire_due(clock) {
            self.handle_outcome(outcome, clock.current_tick, events);
        }
    }

    /// Deliver one timer event out of band.  Stale events are reported and
    /// change nothing.
    pub fn deliver(&mut self, event: TimerEvent, clock: &SimClock, events: &mut Vec<SimEvent>) {
        let outcome = self.controller.fire(event, clock);
        self.handle_outcome(outcome, clock.current_tick, events);
    }

    fn handle_outcome(&mut self, outcome: FireOutcome, tick: Tick, events: &mut Vec<SimEvent>) {
        let TimerEvent { key: TimerKey { ambulance, signal }, kind, epoch, .. } = *outcome.event();
        match outcome {
            FireOutcome::Applied(_) => match kind {
                TimerKind::ClearanceElapsed | TimerKind::GreenHoldElapsed => {
                    events.push(SimEvent::SignalReleased { tick, signal, ambulance });
                }
                TimerKind::WaitElapsed => {
                    self.end_wait(ambulance, signal);
                    log::info!("{ambulance} resumes after waiting at {signal}");
                    events.push(SimEvent::WaitEnded { tick, ambulance, signal });
                }
            },
            FireOutcome::Stale { reason, .. } => {
                // The signal was taken while the ambulance waited; it must
                // not stay parked forever.
                if kind == TimerKind::WaitElapsed
                    && epoch == self.controller.epoch()
                    && self.end_wait(ambulance, signal)
                {
                    log::warn!("{ambulance} lost {signal} while waiting; moving on");
                }
                events.push(SimEvent::StaleTimer { tick, signal, ambulance, kind, reason });
            }
        }
    }

    /// Close `ambulance`'s wait at `signal`, if that is where it is waiting.
    fn end_wait(&mut self, ambulance: AmbulanceId, signal: SignalId) -> bool {
        if !self.waits.get(&ambulance).is_some_and(|w| w.signal == signal) {
            return false;
        }
        self.waits.remove(&ambulance);
        self.passed.entry(ambulance).or_default().insert(signal);
        true
    }

    // ── Tick ──────────────────────────────────────────────────────────────

    /// Plan, arbitrate and apply this tick's signal intents for every active
    /// ambulance in `fleet`.
    pub fn tick(&mut self, fleet: &Fleet, clock: &SimClock, events: &mut Vec<SimEvent>) {
        let mut planned = self.plan(fleet);
        self.arbitrate(&mut planned, clock.current_tick, events);
        self.apply(planned, fleet, clock, events);
    }

    /// Intents per active ambulance, ascending id.
    ///
    /// With the `parallel` feature, ambulances are planned on Rayon's thread
    /// pool.  The result order is the same either way.
    pub fn plan(&self, fleet: &Fleet) -> Vec<(AmbulanceId, Vec<SignalIntent>)> {
        let ids = fleet.active_ids();
        let plan_one = |&id: &AmbulanceId| (id, self.plan_ambulance(id, fleet));

        #[cfg(not(feature = "parallel"))]
        {
            ids.iter().map(plan_one).collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            ids.par_iter().map(plan_one).collect()
        }
    }

    fn plan_ambulance(&self, id: AmbulanceId, fleet: &Fleet) -> Vec<SignalIntent> {
        let Some(ambulance) = fleet.get(id) else {
            return Vec::new();
        };
        let Some(signals) = self.routes.get(RouteKey::new(id, ambulance.phase)) else {
            return Vec::new();
        };
        let input = PlanInput {
            ambulance,
            route: fleet.active_route(id),
            signals,
            wait: self.waits.get(&id),
            passed: self.passed.get(&id),
        };
        match self.mode() {
            PreemptionMode::Smart => policy::plan_smart(&input, self.board()),
            PreemptionMode::Normal => policy::plan_normal(&input, self.board(), self.params()),
        }
    }

    /// Drop losing claims where several ambulances want the same
    /// intersection this tick.
    fn arbitrate(&self, planned: &mut [(AmbulanceId, Vec<SignalIntent>)], tick: Tick, events: &mut Vec<SimEvent>) {
        let board = self.board();
        let intersection_of = |intent: &SignalIntent| -> Option<IntersectionId> {
            if !intent.is_claim() {
                return None;
            }
            board.get(intent.signal()).map(|s| s.intersection)
        };

        let mut claims: BTreeMap<IntersectionId, Vec<(AmbulanceId, f64)>> = BTreeMap::new();
        for (id, intents) in planned.iter() {
            for intent in intents {
                if let (Some(at), Some(d)) = (intersection_of(intent), intent.distance_m()) {
                    claims.entry(at).or_default().push((*id, d));
                }
            }
        }

        for (intersection, contenders) in claims {
            if contenders.len() < 2 {
                continue;
            }
            let Some(winner) = policy::arbitrate(&contenders) else {
                continue;
            };
            for (loser, intents) in planned.iter_mut().filter(|(id, _)| *id != winner) {
                intents.retain(|intent| {
                    if intersection_of(intent) != Some(intersection) {
                        return true;
                    }
                    let signal = intent.signal();
                    log::info!("{loser} loses {signal} at {intersection} to nearer {winner}");
                    events.push(SimEvent::PreemptionConflict { tick, signal, winner, loser: *loser });
                    false
                });
            }
        }
    }

    fn apply(
        &mut self,
        planned: Vec<(AmbulanceId, Vec<SignalIntent>)>,
        fleet: &Fleet,
        clock: &SimClock,
        events: &mut Vec<SimEvent>,
    ) {
        let tick = clock.current_tick;
        for (ambulance, intents) in planned {
            for intent in intents {
                match intent {
                    SignalIntent::Preempt { signal, .. } => {
                        if self.controller.preempt(ambulance, signal) {
                            events.push(SimEvent::SignalPreempted { tick, signal, ambulance });
                        }
                    }
                    SignalIntent::BeginClearance { signal } => {
                        if self.controller.begin_clearance(ambulance, signal, clock) {
                            events.push(SimEvent::ClearanceStarted { tick, signal, ambulance });
                        }
                    }
                    SignalIntent::Release { signal } => {
                        if self.controller.release(ambulance, signal) {
                            events.push(SimEvent::SignalReleased { tick, signal, ambulance });
                        }
                    }
                    SignalIntent::Hold { signal, .. } => self.apply_hold(ambulance, signal, fleet, clock, events),
                }
            }
        }
    }

    fn apply_hold(
        &mut self,
        ambulance: AmbulanceId,
        signal: SignalId,
        fleet: &Fleet,
        clock: &SimClock,
        events: &mut Vec<SimEvent>,
    ) {
        let Some(a) = fleet.get(ambulance) else {
            return;
        };
        if self.is_held(ambulance) {
            return;
        }
        if !self.controller.hold(ambulance, signal, clock) {
            log::debug!("{ambulance} could not hold {signal}");
            return;
        }
        let tick = clock.current_tick;
        self.waits.insert(ambulance, WaitRecord {
            signal,
            wait_start: tick,
            waypoint_index_at_stop: a.waypoint_index,
            position: a.position,
        });
        log::info!("{ambulance} stopped at {signal}");
        events.push(SimEvent::AmbulanceHeld { tick, ambulance, signal });
    }

    /// Clean up after an ambulance finished a leg.
    ///
    /// The passed set belongs to a leg and is cleared.  In smart mode every
    /// signal still GREEN for the ambulance starts its clearance; any other
    /// signal it owns outside a clearance is released.  A finished mission also drops its routes.
    pub fn on_leg_event(&mut self, leg: &LegEvent, clock: &SimClock, events: &mut Vec<SimEvent>) {
        let (ambulance, finished) = match *leg {
            LegEvent::ReachedPatient { ambulance, .. } => (ambulance, false),
            LegEvent::ReachedHospital { ambulance, .. } | LegEvent::Stalled { ambulance } => (ambulance, true),
        };
        let tick = clock.current_tick;
        self.waits.remove(&ambulance);
        if let Some(p) = self.passed.get_mut(&ambulance) {
            p.clear();
        }

        if self.mode() == PreemptionMode::Smart {
            for signal in self.board().owned_by(ambulance) {
                let Some(mode) = self.board().get(signal).map(|s| s.mode) else {
                    continue;
                };
                if mode == SignalMode::EndingEmergency {
                    continue;
                }
                let green = self.board().get(signal).is_some_and(|s| s.is_preempted_green_for(ambulance));
                if green {
                    if self.controller.begin_clearance(ambulance, signal, clock) {
                        events.push(SimEvent::ClearanceStarted { tick, signal, ambulance });
                    }
                } else if self.controller.release(ambulance, signal) {
                    events.push(SimEvent::SignalReleased { tick, signal, ambulance });
                }
            }
        }
        if finished {
            self.routes.remove_ambulance(ambulance);
        }
    }

    // ── Housekeeping ──────────────────────────────────────────────────────

    pub fn step_background(&mut self, clock: &SimClock) {
        self.controller.step_background(clock);
    }

    pub fn refresh_countdowns(&mut self, clock: &SimClock) {
        self.controller.refresh_countdowns(clock);
    }

    /// Clear waits, passed sets and routes, cancel every timer, start a new
    /// epoch, and put every signal back on its background baseline.
    /// Returns the new epoch.
    pub fn reset(&mut self, clock: &SimClock) -> u64 {
        self.waits.clear();
        self.passed.clear();
        self.routes.clear();
        self.controller.reset(clock);
        self.controller.epoch()
    }

    /// Predicted mission time for a route with `signals` signals on it,
    /// given `base_secs` of unobstructed driving.
    ///
    /// Smart mode never stops, so the prediction is the base time.  Normal
    /// mode adds the wait plus the green hold at every signal.
    pub fn estimate_eta(&self, base_secs: f64, signals: usize) -> f64 {
        match self.mode() {
            PreemptionMode::Smart => base_secs,
            PreemptionMode::Normal => {
                let p = self.params();
                base_secs + signals as f64 * (p.wait_delay_ms + p.green_hold_ms) as f64 / 1_000.0
            }
        }
    }
}
