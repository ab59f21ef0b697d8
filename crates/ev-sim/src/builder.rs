//! Fluent builder for constructing a [`Sim`].

use ev_core::{GeoPoint, IntersectionId, SimConfig, SimRng};
use ev_fleet::{CivilianParams, CivilianTraffic, Fleet, Mission};
use ev_signal::{ControllerParams, Signal, SignalController};
use ev_spatial::{RoadGraph, RoutePlanner, SpatialError};

use crate::coordinator::TrafficCoordinator;
use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim<P>`].
///
/// # Required inputs
///
/// - [`SimConfig`]: tick duration, total ticks, seed, snapshot interval
/// - [`RoadGraph`]: the road network
/// - `P: RoutePlanner`: the path search (e.g. [`ev_spatial::AStarPlanner`])
///
/// # Optional inputs (have defaults)
///
/// | Method                   | Default                           |
/// |--------------------------|-----------------------------------|
/// | `.params(p)`             | `ControllerParams::default()` (smart) |
/// | `.signals(v)`            | no signals                        |
/// | `.ambulance(m, speed)`   | no ambulances                     |
/// | `.civilians(p, n)`       | no random civilians               |
/// | `.civilian_route(r)`     | no fixed-route civilians          |
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimBuilder::new(config, graph, AStarPlanner)
///     .params(ControllerParams::normal())
///     .signals(signals)
///     .ambulance(mission, 15.0)
///     .build()?;
/// sim.run_until_idle(10_000, &mut NoopObserver);
/// ```
pub struct SimBuilder<P: RoutePlanner> {
    config:          SimConfig,
    graph:           RoadGraph,
    planner:         P,
    params:          ControllerParams,
    signals:         Vec<Signal>,
    ambulances:      Vec<(Mission, f64)>,
    civilian_params: CivilianParams,
    civilian_count:  usize,
    civilian_routes: Vec<Vec<GeoPoint>>,
}

impl<P: RoutePlanner> SimBuilder<P> {
    pub fn new(config: SimConfig, graph: RoadGraph, planner: P) -> Self {
        Self {
            config,
            graph,
            planner,
            params:          ControllerParams::default(),
            signals:         Vec::new(),
            ambulances:      Vec::new(),
            civilian_params: CivilianParams::default(),
            civilian_count:  0,
            civilian_routes: Vec::new(),
        }
    }

    /// Preemption mode, thresholds, delays and background policy.
    pub fn params(mut self, params: ControllerParams) -> Self {
        self.params = params;
        self
    }

    /// Every signal in the scenario.  Ids must be dense from 0.
    pub fn signals(mut self, signals: Vec<Signal>) -> Self {
        self.signals = signals;
        self
    }

    /// Add an ambulance stationed at `mission.station` that runs `mission`.
    /// Ambulance ids follow call order.
    pub fn ambulance(mut self, mission: Mission, speed_m_per_tick: f64) -> Self {
        self.ambulances.push((mission, speed_m_per_tick));
        self
    }

    /// Spawn `count` civilian vehicles on random looping routes, seeded from
    /// `config.seed`.
    pub fn civilians(mut self, params: CivilianParams, count: usize) -> Self {
        self.civilian_params = params;
        self.civilian_count = count;
        self
    }

    /// Add a civilian vehicle looping over `route`.
    pub fn civilian_route(mut self, route: Vec<GeoPoint>) -> Self {
        self.civilian_routes.push(route);
        self
    }

    /// Validate inputs and return a ready-to-run [`Sim`].
    ///
    /// # Errors
    ///
    /// - [`SimError::Core`] for an out-of-range tick duration.
    /// - [`SimError::Config`] for invalid controller or civilian parameters.
    /// - [`SimError::Signal`] for signal ids out of sequence or a signal at
    ///   an intersection missing from the graph.
    /// - [`SimError::Spatial`] for a mission endpoint missing from the graph.
    /// - [`SimError::Fleet`] for a non-positive ambulance speed.
    pub fn build(self) -> SimResult<Sim<P>> {
        // ── Validate configuration ────────────────────────────────────────
        self.config.validate()?;
        self.params.validate().map_err(SimError::Config)?;
        let cp = &self.civilian_params;
        if !(cp.speed_m_per_tick > 0.0 && cp.yield_radius_m > 0.0 && cp.stop_radius_m > 0.0) {
            return Err(SimError::Config(format!("civilian parameters must be positive, got {cp:?}")));
        }

        // ── Signals ───────────────────────────────────────────────────────
        let clock = self.config.make_clock();
        let signal_count = self.signals.len();
        let controller = SignalController::new(self.signals, self.params, &clock)?;
        controller.board().validate(&self.graph)?;
        let coordinator = TrafficCoordinator::new(controller);

        // ── Ambulances ────────────────────────────────────────────────────
        let mut fleet = Fleet::new();
        for &(mission, speed) in &self.ambulances {
            let home = position_of(&self.graph, mission.station)?;
            position_of(&self.graph, mission.patient)?;
            position_of(&self.graph, mission.hospital)?;
            let id = fleet.add(home, speed)?;
            fleet.assign(id, mission)?;
        }

        // ── Civilians ─────────────────────────────────────────────────────
        let mut civilians = CivilianTraffic::new(self.civilian_params);
        for route in self.civilian_routes {
            civilians.add(route);
        }
        if self.civilian_count > 0 {
            let mut rng = SimRng::new(self.config.seed).child(1);
            civilians.spawn_random(&self.graph, &self.planner, self.civilian_count, &mut rng);
        }

        log::info!(
            "sim ready: {} intersections, {signal_count} signals, {} ambulances, {} civilians, {} mode",
            self.graph.intersection_count(),
            fleet.len(),
            civilians.len(),
            coordinator.mode(),
        );
        Ok(Sim::new(self.config, self.graph, self.planner, fleet, civilians, coordinator))
    }
}

fn position_of(graph: &RoadGraph, id: IntersectionId) -> SimResult<GeoPoint> {
    graph.position(id).ok_or(SimError::Spatial(SpatialError::IntersectionNotFound(id)))
}
