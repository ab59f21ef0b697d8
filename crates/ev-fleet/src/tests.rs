//! Unit tests for ev-fleet.

#[cfg(test)]
mod helpers {
    use ev_core::{GeoPoint, IntersectionId, SimClock, Tick};
    use ev_spatial::{RoadGraph, RoadGraphBuilder};

    pub fn origin() -> GeoPoint {
        GeoPoint::new(0.0, 0.0)
    }

    pub fn clock_at(tick: u64) -> SimClock {
        let mut c = SimClock::new(500);
        c.current_tick = Tick(tick);
        c
    }

    /// Three intersections west to east, 1000 m apart, plus an isolated
    /// fourth far to the north.
    pub fn corridor() -> (RoadGraph, [IntersectionId; 4]) {
        let mut b = RoadGraphBuilder::new();
        let i0 = b.add_intersection(origin());
        let i1 = b.add_intersection(origin().offset_m(0.0, 1_000.0));
        let i2 = b.add_intersection(origin().offset_m(0.0, 2_000.0));
        let i3 = b.add_intersection(origin().offset_m(5_000.0, 0.0));
        b.add_road(i0, i1, 2);
        b.add_road(i1, i2, 2);
        (b.build().unwrap(), [i0, i1, i2, i3])
    }
}

// ── Ambulance ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod ambulance {
    use ev_core::{AmbulanceId, AmbulancePhase};
    use super::helpers::origin;
    use crate::Ambulance;

    #[test]
    fn new_ambulance_is_idle_at_home() {
        let a = Ambulance::new(AmbulanceId(0), origin(), 10.0);
        assert_eq!(a.phase, AmbulancePhase::Idle);
        assert!(!a.is_active());
        assert_eq!(a.position, origin());
    }

    #[test]
    fn advance_moves_by_speed() {
        let mut a = Ambulance::new(AmbulanceId(0), origin(), 10.0);
        a.waypoint_index = 1;
        let route = [origin(), origin().offset_m(0.0, 100.0)];
        let step = a.advance(&route);
        assert!(!step.reached);
        assert!((a.distance_to(origin()) - 10.0).abs() < 1e-3);
    }

    #[test]
    fn advance_snaps_onto_close_waypoint() {
        let mut a = Ambulance::new(AmbulanceId(0), origin(), 50.0);
        a.waypoint_index = 1;
        let target = origin().offset_m(0.0, 30.0);
        let step = a.advance(&[origin(), target]);
        assert!(step.reached);
        assert_eq!(a.position, target);
    }

    #[test]
    fn advance_without_target_keeps_position() {
        let mut a = Ambulance::new(AmbulanceId(0), origin(), 50.0);
        a.waypoint_index = 2;
        let step = a.advance(&[origin(), origin().offset_m(0.0, 30.0)]);
        assert!(!step.reached);
        assert_eq!(a.position, origin());
    }
}

// ── Fleet ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod fleet {
    use ev_core::{AmbulanceId, AmbulancePhase, AmbulanceStatus, Tick};
    use ev_spatial::{AStarPlanner, MissionPlan};

    use super::helpers::{clock_at, corridor};
    use crate::{DispatchOutcome, Fleet, FleetError, LegEvent, Mission};

    /// Step `id` from `from` until it goes idle, collecting leg events.
    fn drive(fleet: &mut Fleet, id: AmbulanceId, from: u64) -> Vec<(u64, LegEvent)> {
        let mut events = Vec::new();
        for t in from..from + 500 {
            if let Some(e) = fleet.step(id, &clock_at(t)).unwrap() {
                events.push((t, e));
            }
            if !fleet.get(id).unwrap().is_active() {
                break;
            }
        }
        events
    }

    #[test]
    fn rejects_bad_speed() {
        let mut fleet = Fleet::new();
        let err = fleet.add(super::helpers::origin(), 0.0).unwrap_err();
        assert!(matches!(err, FleetError::InvalidSpeed(_)));
    }

    #[test]
    fn ids_are_sequential() {
        let (g, n) = corridor();
        let mut fleet = Fleet::new();
        let a = fleet.add(g.position(n[0]).unwrap(), 10.0).unwrap();
        let b = fleet.add(g.position(n[2]).unwrap(), 10.0).unwrap();
        assert_eq!((a, b), (AmbulanceId(0), AmbulanceId(1)));
        assert_eq!(fleet.len(), 2);
    }

    #[test]
    fn assign_unknown_ambulance_fails() {
        let (_, n) = corridor();
        let mut fleet = Fleet::new();
        let m = Mission { station: n[0], patient: n[1], hospital: n[2], dispatch_tick: Tick(0) };
        assert!(matches!(fleet.assign(AmbulanceId(3), m), Err(FleetError::AmbulanceNotFound(_))));
    }

    #[test]
    fn due_dispatches_respect_tick() {
        let (g, n) = corridor();
        let mut fleet = Fleet::new();
        let id = fleet.add(g.position(n[0]).unwrap(), 10.0).unwrap();
        fleet.assign(id, Mission { station: n[0], patient: n[1], hospital: n[2], dispatch_tick: Tick(4) }).unwrap();
        assert!(fleet.due_dispatches(Tick(3)).is_empty());
        assert_eq!(fleet.due_dispatches(Tick(4)), vec![id]);
        assert!(!fleet.all_settled());
    }

    #[test]
    fn full_mission_measures_eta() {
        let (g, n) = corridor();
        let mut fleet = Fleet::new();
        // 1000 m legs at 30 m/tick: 34 ticks per leg, the last one partial.
        let id = fleet.add(g.position(n[0]).unwrap(), 30.0).unwrap();
        let plan = MissionPlan::plan(&AStarPlanner, &g, n[0], n[1], n[2]);

        assert_eq!(fleet.dispatch(id, plan, Tick(0)).unwrap(), DispatchOutcome::Dispatched);
        let a = fleet.get(id).unwrap();
        assert_eq!(a.status, AmbulanceStatus::Responding);
        assert_eq!(a.waypoint_index, 1);
        assert_eq!(fleet.active_ids(), vec![id]);
        assert_eq!(fleet.active_route(id).len(), 2);

        let events = drive(&mut fleet, id, 0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (33, LegEvent::ReachedPatient { ambulance: id, elapsed_secs: 17.0 }));
        assert_eq!(events[1], (67, LegEvent::ReachedHospital { ambulance: id, eta_secs: 34.0 }));

        let a = fleet.get(id).unwrap();
        assert_eq!(a.phase, AmbulancePhase::Idle);
        assert_eq!(a.position, g.position(n[2]).unwrap());
        assert_eq!(fleet.eta_secs(id), Some(34.0));
        assert!(fleet.active_route(id).is_empty());
    }

    #[test]
    fn transport_leg_switches_status() {
        let (g, n) = corridor();
        let mut fleet = Fleet::new();
        let id = fleet.add(g.position(n[0]).unwrap(), 30.0).unwrap();
        fleet.dispatch(id, MissionPlan::plan(&AStarPlanner, &g, n[0], n[1], n[2]), Tick(0)).unwrap();
        for t in 0..34 {
            fleet.step(id, &clock_at(t)).unwrap();
        }
        let a = fleet.get(id).unwrap();
        assert_eq!(a.phase, AmbulancePhase::ToHospital);
        assert_eq!(a.status, AmbulanceStatus::Transporting);
        assert_eq!(a.waypoint_index, 1);
        assert_eq!(a.position, g.position(n[1]).unwrap());
    }

    #[test]
    fn dispatch_twice_is_rejected() {
        let (g, n) = corridor();
        let mut fleet = Fleet::new();
        let id = fleet.add(g.position(n[0]).unwrap(), 30.0).unwrap();
        let plan = MissionPlan::plan(&AStarPlanner, &g, n[0], n[1], n[2]);
        fleet.dispatch(id, plan.clone(), Tick(0)).unwrap();
        assert!(matches!(fleet.dispatch(id, plan, Tick(1)), Err(FleetError::AlreadyDispatched(_))));
    }

    #[test]
    fn unreachable_patient_stays_idle() {
        let (g, n) = corridor();
        let mut fleet = Fleet::new();
        let home = g.position(n[3]).unwrap();
        let id = fleet.add(home, 30.0).unwrap();
        fleet.assign(id, Mission { station: n[3], patient: n[1], hospital: n[2], dispatch_tick: Tick(0) }).unwrap();
        let plan = MissionPlan::plan(&AStarPlanner, &g, n[3], n[1], n[2]);

        assert_eq!(fleet.dispatch(id, plan, Tick(0)).unwrap(), DispatchOutcome::NoRoute);
        let a = fleet.get(id).unwrap();
        assert!(!a.is_active());
        assert_eq!(a.position, home);
        assert_eq!(fleet.step(id, &clock_at(0)).unwrap(), None);
        assert!(fleet.all_settled());
    }

    #[test]
    fn unreachable_hospital_stalls_at_patient() {
        let (g, n) = corridor();
        let mut fleet = Fleet::new();
        let id = fleet.add(g.position(n[0]).unwrap(), 30.0).unwrap();
        let plan = MissionPlan::plan(&AStarPlanner, &g, n[0], n[1], n[3]);
        fleet.dispatch(id, plan, Tick(0)).unwrap();

        let events = drive(&mut fleet, id, 0);
        assert_eq!(events, vec![(33, LegEvent::Stalled { ambulance: id })]);
        assert_eq!(fleet.get(id).unwrap().position, g.position(n[1]).unwrap());
        assert_eq!(fleet.eta_secs(id), None);
    }

    #[test]
    fn late_dispatch_measures_from_dispatch_tick() {
        let (g, n) = corridor();
        let mut fleet = Fleet::new();
        let id = fleet.add(g.position(n[0]).unwrap(), 30.0).unwrap();
        fleet.dispatch(id, MissionPlan::plan(&AStarPlanner, &g, n[0], n[1], n[2]), Tick(10)).unwrap();
        drive(&mut fleet, id, 10);
        assert_eq!(fleet.eta_secs(id), Some(34.0));
        assert_eq!(fleet.dispatched_at(id), Some(Tick(10)));
    }

    #[test]
    fn reset_returns_home_and_keeps_missions() {
        let (g, n) = corridor();
        let mut fleet = Fleet::new();
        let home = g.position(n[0]).unwrap();
        let id = fleet.add(home, 30.0).unwrap();
        let m = Mission { station: n[0], patient: n[1], hospital: n[2], dispatch_tick: Tick(0) };
        fleet.assign(id, m).unwrap();
        fleet.dispatch(id, MissionPlan::plan(&AStarPlanner, &g, n[0], n[1], n[2]), Tick(0)).unwrap();
        for t in 0..10 {
            fleet.step(id, &clock_at(t)).unwrap();
        }

        fleet.reset();
        let a = fleet.get(id).unwrap();
        assert_eq!(a.position, home);
        assert!(!a.is_active());
        assert_eq!(fleet.dispatched_at(id), None);
        assert_eq!(fleet.mission(id), Some(&m));
        assert_eq!(fleet.due_dispatches(Tick(0)), vec![id]);
    }
}

// ── Civilian traffic ──────────────────────────────────────────────────────────

#[cfg(test)]
mod civilian {
    use ev_core::{SimRng, VehicleId};
    use ev_spatial::AStarPlanner;

    use super::helpers::{corridor, origin};
    use crate::{Civilian, CivilianParams, CivilianState, CivilianTraffic};

    fn eastbound() -> Civilian {
        Civilian::new(VehicleId(0), vec![origin(), origin().offset_m(0.0, 100.0)])
    }

    #[test]
    fn drives_when_clear() {
        let mut v = eastbound();
        v.step(&[], &[], &CivilianParams::default());
        assert_eq!(v.state, CivilianState::Driving);
        assert!((v.position.distance_m(origin()) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn pulls_over_for_nearby_ambulance() {
        let mut v = eastbound();
        let ambulance = origin().offset_m(0.0, -100.0);
        v.step(&[ambulance], &[], &CivilianParams::default());
        assert_eq!(v.state, CivilianState::PulledOver);
        assert_eq!(v.position, origin());
    }

    #[test]
    fn ignores_distant_ambulance() {
        let mut v = eastbound();
        v.step(&[origin().offset_m(0.0, -500.0)], &[], &CivilianParams::default());
        assert_eq!(v.state, CivilianState::Driving);
    }

    #[test]
    fn stops_at_red_ahead_only() {
        let params = CivilianParams::default();
        let mut ahead = eastbound();
        ahead.step(&[], &[origin().offset_m(0.0, 20.0)], &params);
        assert_eq!(ahead.state, CivilianState::StoppedAtSignal);
        assert_eq!(ahead.position, origin());

        let mut behind = eastbound();
        behind.step(&[], &[origin().offset_m(0.0, -20.0)], &params);
        assert_eq!(behind.state, CivilianState::Driving);
    }

    #[test]
    fn ambulance_takes_priority_over_signal() {
        let mut v = eastbound();
        v.step(&[origin().offset_m(0.0, 50.0)], &[origin().offset_m(0.0, 20.0)], &CivilianParams::default());
        assert_eq!(v.state, CivilianState::PulledOver);
    }

    #[test]
    fn loops_back_to_first_waypoint() {
        let end = origin().offset_m(0.0, 8.0);
        let mut v = Civilian::new(VehicleId(0), vec![origin(), end]);
        let params = CivilianParams::default();
        v.step(&[], &[], &params);
        v.step(&[], &[], &params);
        assert_eq!(v.position, end);
        assert_eq!(v.waypoint_index, 0);
        v.step(&[], &[], &params);
        assert!(v.position.distance_m(origin()) < 8.0);
    }

    #[test]
    fn spawn_and_reset() {
        let (g, _) = corridor();
        let mut traffic = CivilianTraffic::new(CivilianParams::default());
        let mut rng = SimRng::new(7);
        assert_eq!(traffic.spawn_random(&g, &AStarPlanner, 3, &mut rng), 3);
        assert_eq!(traffic.len(), 3);

        let starts: Vec<_> = traffic.vehicles().iter().map(|v| v.position).collect();
        for _ in 0..20 {
            traffic.step(&[], &[]);
        }
        assert!(traffic.vehicles().iter().zip(&starts).any(|(v, s)| v.position != *s));
        traffic.reset();
        let after: Vec<_> = traffic.vehicles().iter().map(|v| v.position).collect();
        assert_eq!(after, starts);
    }

    #[test]
    fn spawn_on_tiny_graph_adds_nothing() {
        let g = ev_spatial::RoadGraph::empty();
        let mut traffic = CivilianTraffic::default();
        assert_eq!(traffic.spawn_random(&g, &AStarPlanner, 2, &mut SimRng::new(1)), 0);
        assert!(traffic.is_empty());
    }
}
