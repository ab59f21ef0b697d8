//! The `Sim` struct and its tick loop.

use ev_core::{AmbulanceId, GeoPoint, SimClock, SimConfig, Tick};
use ev_fleet::{CivilianTraffic, DispatchOutcome, Fleet};
use ev_spatial::{MissionPlan, RoadGraph, RoutePlanner};

use crate::coordinator::TrafficCoordinator;
use crate::event::SimEvent;
use crate::SimObserver;

/// The simulation runner.
///
/// `Sim<P>` holds all simulation state and drives the tick loop:
///
/// 1. **Timers**: deliver deferred signal transitions due this tick.
/// 2. **Dispatch**: plan and start missions whose dispatch tick is now.
/// 3. **Preemption**: the coordinator plans, arbitrates and applies signal
///    intents for every active ambulance.
/// 4. **Background**: advance background cycles at idle intersections.
/// 5. **Ambulances**: move every active ambulance that is not held at a
///    signal; handle leg completion.
/// 6. **Civilians**: yield to ambulances, stop at RED, or drive on.
/// 7. **Observers**: refresh countdowns, deliver events and snapshots.
/// 8. **Clock**: advance.
///
/// Ambulances move against signal states that were fully written in steps
/// 1-4, never against a half-updated board.
///
/// Create via [`SimBuilder`](crate::SimBuilder).
pub struct Sim<P: RoutePlanner> {
    pub config: SimConfig,
    pub clock: SimClock,
    pub graph: RoadGraph,
    pub planner: P,
    pub fleet: Fleet,
    pub civilians: CivilianTraffic,
    pub coordinator: TrafficCoordinator,

    /// Events of the tick in progress (plus any reset notice).
    pending: Vec<SimEvent>,
    /// Events of the last completed tick.
    last: Vec<SimEvent>,
}

impl<P: RoutePlanner> Sim<P> {
    pub(crate) fn new(
        config: SimConfig,
        graph: RoadGraph,
        planner: P,
        fleet: Fleet,
        civilians: CivilianTraffic,
        coordinator: TrafficCoordinator,
    ) -> Self {
        Self {
            clock: config.make_clock(),
            config,
            graph,
            planner,
            fleet,
            civilians,
            coordinator,
            pending: Vec::new(),
            last: Vec::new(),
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run from the current tick to `config.end_tick()`.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) {
        while self.clock.current_tick < self.config.end_tick() {
            self.tick(observer);
        }
        observer.on_sim_end(self.clock.current_tick);
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) {
        for _ in 0..n {
            self.tick(observer);
        }
    }

    /// Run until every mission is over and no signal timer is pending, or
    /// `max_ticks` have elapsed.  Returns the tick at which the simulation
    /// went idle.
    pub fn run_until_idle<O: SimObserver>(&mut self, max_ticks: u64, observer: &mut O) -> Option<Tick> {
        let mut idle_at = None;
        for _ in 0..max_ticks {
            self.tick(observer);
            if self.is_idle() {
                idle_at = Some(self.clock.current_tick);
                break;
            }
        }
        observer.on_sim_end(self.clock.current_tick);
        idle_at
    }

    /// `true` once no ambulance is on a mission or waiting for dispatch and
    /// no signal timer is pending.
    pub fn is_idle(&self) -> bool {
        self.fleet.all_settled() && self.coordinator.controller().timers().is_empty()
    }

    /// Return to tick 0: ambulances home and idle, civilians at their starts,
    /// every wait, passed set and timer dropped, signals on their baseline.
    /// Missions stay assigned and will dispatch again.
    pub fn reset(&mut self) {
        self.clock.reset();
        self.fleet.reset();
        self.civilians.reset();
        let epoch = self.coordinator.reset(&self.clock);
        self.pending.clear();
        self.last.clear();
        self.pending.push(SimEvent::Reset { tick: self.clock.current_tick, epoch });
        log::info!("simulation reset, epoch {epoch}");
    }

    /// Events produced by the last completed tick.
    pub fn last_events(&self) -> &[SimEvent] {
        &self.last
    }

    /// Measured mission time of `ambulance`, once it reached the hospital.
    pub fn eta_secs(&self, ambulance: AmbulanceId) -> Option<f64> {
        self.fleet.eta_secs(ambulance)
    }

    /// Predicted mission time of `ambulance`'s current plan: unobstructed
    /// driving time of both legs plus the mode's per-signal allowance.
    pub fn predicted_eta_secs(&self, ambulance: AmbulanceId) -> Option<f64> {
        let a = self.fleet.get(ambulance)?;
        let plan = self.fleet.plan(ambulance)?;
        if !plan.to_patient.is_drivable() {
            return None;
        }
        let legs = [&plan.to_patient.waypoints, &plan.to_hospital.waypoints];
        let ticks: u64 = legs.iter().map(|w| drive_ticks(w, a.speed_m_per_tick)).sum();
        let base_secs = self.clock.ms_for_ticks(ticks) as f64 / 1_000.0;
        let signals: usize = legs.iter().map(|w| self.coordinator.resolve_route(w).len()).sum();
        Some(self.coordinator.estimate_eta(base_secs, signals))
    }

    // ── Core tick processing ──────────────────────────────────────────────

    fn tick<O: SimObserver>(&mut self, observer: &mut O) {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);

        // ── ① Deferred signal transitions ─────────────────────────────────
        self.coordinator.fire_timers(&self.clock, &mut self.pending);

        // ── ② Dispatch ────────────────────────────────────────────────────
        self.dispatch_due(now);

        // ── ③ Preemption: plan, arbitrate, apply ──────────────────────────
        self.coordinator.tick(&self.fleet, &self.clock, &mut self.pending);

        // ── ④ Background cycles ───────────────────────────────────────────
        self.coordinator.step_background(&self.clock);

        // ── ⑤ Ambulances ──────────────────────────────────────────────────
        self.move_ambulances(now);

        // ── ⑥ Civilians ───────────────────────────────────────────────────
        self.move_civilians();

        // ── ⑦ Observers ───────────────────────────────────────────────────
        self.coordinator.refresh_countdowns(&self.clock);
        for event in &self.pending {
            observer.on_event(event);
        }
        observer.on_tick_end(now, self.pending.len());
        if self.config.output_interval_ticks > 0 && now.0.is_multiple_of(self.config.output_interval_ticks) {
            observer.on_snapshot(now, self.coordinator.board(), &self.fleet);
        }
        self.last = std::mem::take(&mut self.pending);

        // ── ⑧ Clock ───────────────────────────────────────────────────────
        self.clock.advance();
    }

    fn dispatch_due(&mut self, now: Tick) {
        for id in self.fleet.due_dispatches(now) {
            let Some(m) = self.fleet.mission(id).copied() else {
                continue;
            };
            let plan = MissionPlan::plan(&self.planner, &self.graph, m.station, m.patient, m.hospital);
            let signals_on_route = self.coordinator.assign_mission(id, &plan);
            match self.fleet.dispatch(id, plan, now) {
                Ok(DispatchOutcome::Dispatched) => {
                    self.pending.push(SimEvent::Dispatched { tick: now, ambulance: id, signals_on_route });
                }
                Ok(DispatchOutcome::NoRoute) => {
                    self.coordinator.drop_mission(id);
                    self.pending.push(SimEvent::NoRoute { tick: now, ambulance: id });
                }
                Err(e) => {
                    log::warn!("dispatch of {id} skipped: {e}");
                    self.coordinator.drop_mission(id);
                }
            }
        }
    }

    fn move_ambulances(&mut self, now: Tick) {
        for id in self.fleet.active_ids() {
            if self.coordinator.is_held(id) {
                continue;
            }
            match self.fleet.step(id, &self.clock) {
                Ok(Some(leg)) => {
                    self.pending.push(SimEvent::from_leg(now, leg));
                    self.coordinator.on_leg_event(&leg, &self.clock, &mut self.pending);
                }
                Ok(None) => {}
                Err(e) => log::warn!("{id} skipped this tick: {e}"),
            }
        }
    }

    fn move_civilians(&mut self) {
        if self.civilians.is_empty() {
            return;
        }
        let ambulances: Vec<GeoPoint> = self.fleet.iter().filter(|a| a.is_active()).map(|a| a.position).collect();
        let reds: Vec<GeoPoint> = self.coordinator.board().iter().filter(|s| s.is_red()).map(|s| s.position).collect();
        self.civilians.step(&ambulances, &reds);
    }
}

/// Ticks to drive `waypoints` at `speed` metres per tick.  Each waypoint is
/// reached on a whole tick, so every segment takes at least one.
fn drive_ticks(waypoints: &[GeoPoint], speed: f64) -> u64 {
    waypoints
        .windows(2)
        .map(|w| (w[0].distance_m(w[1]) / speed).ceil().max(1.0) as u64)
        .sum()
}
