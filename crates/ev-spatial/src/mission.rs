//! Three-leg ambulance mission routes.

use ev_core::{GeoPoint, IntersectionId};

use crate::network::RoadGraph;
use crate::planner::RoutePlanner;

/// One planned leg of a mission.  Empty when no path exists.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Leg {
    pub intersections: Vec<IntersectionId>,
    pub waypoints: Vec<GeoPoint>,
    pub length_m: f64,
}

impl Leg {
    fn plan<P: RoutePlanner + ?Sized>(
        planner: &P,
        graph: &RoadGraph,
        from: IntersectionId,
        to: IntersectionId,
    ) -> Leg {
        match planner.plan(graph, from, to) {
            Ok(path) => Leg {
                waypoints: path.waypoints(graph),
                length_m: path.cost_m,
                intersections: path.intersections,
            },
            Err(e) => {
                log::warn!("mission leg {from} -> {to} unroutable: {e}");
                Leg::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty()
    }

    /// `true` if the leg has at least one segment to drive.
    pub fn is_drivable(&self) -> bool {
        self.waypoints.len() >= 2
    }
}

/// Station → patient → hospital → station.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MissionPlan {
    pub to_patient: Leg,
    pub to_hospital: Leg,
    pub return_to_station: Leg,
}

impl MissionPlan {
    /// Plan all three legs.  A leg with no path comes back empty; the
    /// other legs are still planned.
    pub fn plan<P: RoutePlanner + ?Sized>(
        planner: &P,
        graph: &RoadGraph,
        station: IntersectionId,
        patient: IntersectionId,
        hospital: IntersectionId,
    ) -> MissionPlan {
        MissionPlan {
            to_patient: Leg::plan(planner, graph, station, patient),
            to_hospital: Leg::plan(planner, graph, patient, hospital),
            return_to_station: Leg::plan(planner, graph, hospital, station),
        }
    }

    /// `true` if every leg was planned.
    pub fn is_complete(&self) -> bool {
        !self.to_patient.is_empty() && !self.to_hospital.is_empty() && !self.return_to_station.is_empty()
    }

    /// Whole mission as one intersection list.  The shared endpoint between
    /// consecutive legs appears once.
    pub fn full_path(&self) -> Vec<IntersectionId> {
        let mut out: Vec<IntersectionId> = Vec::new();
        for leg in [&self.to_patient, &self.to_hospital, &self.return_to_station] {
            let skip = usize::from(out.last().is_some() && out.last() == leg.intersections.first());
            out.extend_from_slice(&leg.intersections[skip..]);
        }
        out
    }

    /// Total planned length in metres.
    pub fn length_m(&self) -> f64 {
        self.to_patient.length_m + self.to_hospital.length_m + self.return_to_station.length_m
    }
}
