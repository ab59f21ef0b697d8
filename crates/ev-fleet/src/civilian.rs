//! Civilian traffic that reacts to ambulances and RED signals.
//!
//! Each tick a civilian vehicle, in priority order:
//!
//! 1. pulls over if any active ambulance is within `yield_radius_m`;
//! 2. stops if a RED signal ahead of it is within `stop_radius_m`;
//! 3. otherwise drives on, looping back to its first waypoint at the end.

use ev_core::{GeoPoint, IntersectionId, SimRng, VehicleId};
use ev_spatial::{RoadGraph, RoutePlanner};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct CivilianParams {
    pub yield_radius_m: f64,
    pub stop_radius_m: f64,
    pub speed_m_per_tick: f64,
}

impl Default for CivilianParams {
    fn default() -> Self {
        Self { yield_radius_m: 120.0, stop_radius_m: 30.0, speed_m_per_tick: 5.0 }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum CivilianState {
    #[default]
    Driving,
    PulledOver,
    StoppedAtSignal,
}

impl CivilianState {
    pub fn as_str(self) -> &'static str {
        match self {
            CivilianState::Driving         => "driving",
            CivilianState::PulledOver      => "pulled_over",
            CivilianState::StoppedAtSignal => "stopped_at_signal",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Civilian {
    pub id: VehicleId,
    pub position: GeoPoint,
    pub route: Vec<GeoPoint>,
    pub waypoint_index: usize,
    pub state: CivilianState,
}

impl Civilian {
    /// Place a vehicle at the start of `route`.  A route with fewer than two
    /// points never moves.
    pub fn new(id: VehicleId, route: Vec<GeoPoint>) -> Self {
        let position = route.first().copied().unwrap_or(GeoPoint::new(0.0, 0.0));
        Self { id, position, waypoint_index: 1.min(route.len()), route, state: CivilianState::Driving }
    }

    /// `true` if `signal` lies within `radius_m` and in front of the vehicle.
    fn signal_ahead(&self, signal: GeoPoint, radius_m: f64) -> bool {
        let Some(&target) = self.route.get(self.waypoint_index) else {
            return false;
        };
        if self.position.distance_m(signal) > radius_m {
            return false;
        }
        let (hx, hy) = (target.lat - self.position.lat, target.lon - self.position.lon);
        let (sx, sy) = (signal.lat - self.position.lat, signal.lon - self.position.lon);
        hx * sx + hy * sy > 0.0
    }

    /// One tick.  `ambulances` are positions of active ambulances;
    /// `red_signals` are positions of RED signals.
    pub fn step(&mut self, ambulances: &[GeoPoint], red_signals: &[GeoPoint], params: &CivilianParams) {
        if ambulances.iter().any(|&a| self.position.distance_m(a) <= params.yield_radius_m) {
            self.state = CivilianState::PulledOver;
            return;
        }
        if red_signals.iter().any(|&s| self.signal_ahead(s, params.stop_radius_m)) {
            self.state = CivilianState::StoppedAtSignal;
            return;
        }
        self.state = CivilianState::Driving;
        if self.route.len() < 2 {
            return;
        }
        let target = self.route[self.waypoint_index];
        let (position, reached) = self.position.move_towards(target, params.speed_m_per_tick);
        self.position = position;
        if reached {
            self.waypoint_index = (self.waypoint_index + 1) % self.route.len();
        }
    }
}

/// Every civilian vehicle in the scenario.
#[derive(Clone, Debug, Default)]
pub struct CivilianTraffic {
    pub params: CivilianParams,
    vehicles: Vec<Civilian>,
    starts: Vec<GeoPoint>,
}

impl CivilianTraffic {
    pub fn new(params: CivilianParams) -> Self {
        Self { params, vehicles: Vec::new(), starts: Vec::new() }
    }

    /// Add a vehicle looping over `route`.
    pub fn add(&mut self, route: Vec<GeoPoint>) -> VehicleId {
        let id = VehicleId(self.vehicles.len() as u32);
        let vehicle = Civilian::new(id, route);
        self.starts.push(vehicle.position);
        self.vehicles.push(vehicle);
        id
    }

    /// Add `count` vehicles, each looping between two random intersections.
    /// Pairs without a route in both directions are redrawn, up to a fixed
    /// number of attempts.
    pub fn spawn_random<P: RoutePlanner>(
        &mut self,
        graph: &RoadGraph,
        planner: &P,
        count: usize,
        rng: &mut SimRng,
    ) -> usize {
        let n = graph.intersection_count();
        if n < 2 {
            return 0;
        }
        let mut added = 0;
        let mut attempts = 0;
        while added < count && attempts < count * 20 {
            attempts += 1;
            let a = IntersectionId(rng.gen_range(0..n as u32));
            let b = IntersectionId(rng.gen_range(0..n as u32));
            if a == b {
                continue;
            }
            let out = planner.find_path(graph, a, b);
            let back = planner.find_path(graph, b, a);
            if out.is_empty() || back.is_empty() {
                continue;
            }
            let mut ids = out;
            ids.extend_from_slice(&back[1..back.len() - 1]);
            self.add(graph.waypoints(&ids));
            added += 1;
        }
        if added < count {
            log::warn!("spawned {added} of {count} civilian vehicles");
        }
        added
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    pub fn vehicles(&self) -> &[Civilian] {
        &self.vehicles
    }

    pub fn step(&mut self, ambulances: &[GeoPoint], red_signals: &[GeoPoint]) {
        for v in &mut self.vehicles {
            v.step(ambulances, red_signals, &self.params);
        }
    }

    /// Put every vehicle back at the start of its route.
    pub fn reset(&mut self) {
        for (v, &start) in self.vehicles.iter_mut().zip(&self.starts) {
            v.position = start;
            v.waypoint_index = 1.min(v.route.len());
            v.state = CivilianState::Driving;
        }
    }
}
