//! Unit tests for ev-spatial.
//!
//! All tests use hand-built graphs laid out with `GeoPoint::offset_m` on the
//! equator, where metre offsets are exact.

#[cfg(test)]
mod helpers {
    use ev_core::{GeoPoint, IntersectionId};
    use crate::{RoadGraph, RoadGraphBuilder};

    pub fn origin() -> GeoPoint {
        GeoPoint::new(0.0, 0.0)
    }

    /// Three intersections in a west-to-east line, 1000 m apart.
    pub fn corridor() -> (RoadGraph, [IntersectionId; 3]) {
        let mut b = RoadGraphBuilder::new();
        let i0 = b.add_intersection(origin());
        let i1 = b.add_intersection(origin().offset_m(0.0, 1_000.0));
        let i2 = b.add_intersection(origin().offset_m(0.0, 2_000.0));
        b.add_road(i0, i1, 2);
        b.add_road(i1, i2, 2);
        (b.build().unwrap(), [i0, i1, i2])
    }

    /// Four two-way roads around a square, plus one isolated node.
    ///
    /// ```text
    ///   3 ---- 2
    ///   |      |
    ///   0 ---- 1        4 (isolated)
    /// ```
    ///
    /// Sides are 500 m.  Node 4 has no roads.
    pub fn square() -> (RoadGraph, [IntersectionId; 5]) {
        let mut b = RoadGraphBuilder::new();
        let n0 = b.add_intersection(origin());
        let n1 = b.add_intersection(origin().offset_m(0.0, 500.0));
        let n2 = b.add_intersection(origin().offset_m(500.0, 500.0));
        let n3 = b.add_intersection(origin().offset_m(500.0, 0.0));
        let n4 = b.add_intersection(origin().offset_m(0.0, 5_000.0));
        b.add_road(n0, n1, 1);
        b.add_road(n1, n2, 1);
        b.add_road(n2, n3, 1);
        b.add_road(n3, n0, 1);
        (b.build().unwrap(), [n0, n1, n2, n3, n4])
    }
}

// ── Builder & graph structure ─────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use ev_core::{Approach, GeoPoint, IntersectionId};
    use crate::{RoadGraph, RoadGraphBuilder, SpatialError};

    #[test]
    fn empty_graph() {
        let g = RoadGraph::empty();
        assert!(g.is_empty());
        assert_eq!(g.segment_count(), 0);
        assert_eq!(g.snap_to_intersection(GeoPoint::new(0.0, 0.0)), None);
    }

    #[test]
    fn road_adds_both_directions() {
        let (g, [i0, i1, i2]) = super::helpers::corridor();
        assert_eq!(g.intersection_count(), 3);
        assert_eq!(g.segment_count(), 4);
        assert_eq!(g.out_degree(i0), 1);
        assert_eq!(g.out_degree(i1), 2);
        assert_eq!(g.out_degree(i2), 1);
        for s in g.out_segments(i1) {
            assert_eq!(g.seg_from[s.index()], i1);
        }
    }

    #[test]
    fn lengths_derived_from_geometry() {
        let (g, _) = super::helpers::corridor();
        for &len in &g.seg_length_m {
            assert!((len - 1_000.0).abs() < 1e-6, "got {len}");
        }
    }

    #[test]
    fn lanes_at_least_one() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_intersection(GeoPoint::new(0.0, 0.0));
        let c = b.add_intersection(GeoPoint::new(0.0, 0.01));
        b.add_directed_segment(a, c, 0);
        let g = b.build().unwrap();
        assert_eq!(g.seg_lanes, vec![1]);
        assert_eq!(g.out_degree(c), 0);
    }

    #[test]
    fn incoming_approaches() {
        let (g, [i0, i1, _]) = super::helpers::corridor();
        let mid = g.approaches(i1);
        assert_eq!(mid.len(), 2);
        assert!(mid.contains(Approach::West));
        assert!(mid.contains(Approach::East));
        // Only reachable from the east.
        let west_end = g.approaches(i0);
        assert_eq!(west_end.iter().collect::<Vec<_>>(), vec![Approach::East]);
    }

    #[test]
    fn dangling_segment_rejected() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_intersection(GeoPoint::new(0.0, 0.0));
        b.add_road(a, IntersectionId(9), 1);
        match b.build() {
            Err(SpatialError::IntersectionNotFound(id)) => assert_eq!(id, IntersectionId(9)),
            other => panic!("expected IntersectionNotFound, got {:?}", other.err()),
        }
    }

    #[test]
    fn waypoints_skip_unknown_ids() {
        let (g, [i0, _, i2]) = super::helpers::corridor();
        let pts = g.waypoints(&[i0, IntersectionId(77), i2]);
        assert_eq!(pts.len(), 2);
    }
}

// ── Spatial snap ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod snap {
    use crate::tests::helpers::{corridor, origin};

    #[test]
    fn snaps_to_nearest() {
        let (g, [i0, i1, i2]) = corridor();
        assert_eq!(g.snap_to_intersection(origin().offset_m(10.0, 40.0)), Some(i0));
        assert_eq!(g.snap_to_intersection(origin().offset_m(-10.0, 1_200.0)), Some(i1));
        assert_eq!(g.snap_to_intersection(origin().offset_m(0.0, 9_000.0)), Some(i2));
    }

    #[test]
    fn k_nearest_ordered() {
        let (g, [i0, i1, i2]) = corridor();
        let near = g.k_nearest(origin().offset_m(0.0, 1_900.0), 3);
        assert_eq!(near, vec![i2, i1, i0]);
        assert_eq!(g.k_nearest(origin(), 1), vec![i0]);
    }
}

// ── Planner ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod planner {
    use ev_core::{GeoPoint, IntersectionId, SimRng};
    use crate::tests::helpers::{corridor, origin, square};
    use crate::{AStarPlanner, DijkstraPlanner, RoadGraph, RoadGraphBuilder, RoutePlanner, SpatialError};

    #[test]
    fn corridor_path() {
        let (g, [i0, i1, i2]) = corridor();
        let path = AStarPlanner.plan(&g, i0, i2).unwrap();
        assert_eq!(path.intersections, vec![i0, i1, i2]);
        assert!((path.cost_m - 2_000.0).abs() < 1e-6);
        assert_eq!(path.waypoints(&g).len(), 3);
    }

    #[test]
    fn same_node_is_trivial() {
        let (g, [_, i1, _]) = corridor();
        let path = AStarPlanner.plan(&g, i1, i1).unwrap();
        assert!(path.is_trivial());
        assert_eq!(path.intersections, vec![i1]);
        assert_eq!(path.cost_m, 0.0);
    }

    #[test]
    fn unknown_endpoint() {
        let (g, [i0, _, _]) = corridor();
        let err = AStarPlanner.plan(&g, i0, IntersectionId(50)).unwrap_err();
        assert!(matches!(err, SpatialError::IntersectionNotFound(IntersectionId(50))));
        assert!(AStarPlanner.find_path(&g, IntersectionId(50), i0).is_empty());
    }

    #[test]
    fn disconnected_gives_empty_path() {
        let (g, [n0, _, _, _, n4]) = square();
        let err = AStarPlanner.plan(&g, n0, n4).unwrap_err();
        assert!(matches!(err, SpatialError::NoRoute { .. }));
        assert!(AStarPlanner.find_path(&g, n0, n4).is_empty());
    }

    #[test]
    fn empty_graph_gives_empty_path() {
        let g = RoadGraph::empty();
        assert!(AStarPlanner.find_path(&g, IntersectionId(0), IntersectionId(1)).is_empty());
    }

    #[test]
    fn respects_one_way() {
        let mut b = RoadGraphBuilder::new();
        let a = b.add_intersection(origin());
        let c = b.add_intersection(origin().offset_m(0.0, 300.0));
        b.add_directed_segment(a, c, 1);
        let g = b.build().unwrap();
        assert_eq!(AStarPlanner.find_path(&g, a, c), vec![a, c]);
        assert!(AStarPlanner.find_path(&g, c, a).is_empty());
    }

    #[test]
    fn square_opposite_corner_costs_two_sides() {
        let (g, [n0, _, n2, _, _]) = square();
        let path = AStarPlanner.plan(&g, n0, n2).unwrap();
        assert_eq!(path.intersections.len(), 3);
        assert!((path.cost_m - 1_000.0).abs() < 1e-3, "got {}", path.cost_m);
    }

    /// Random sparse graph: positions scattered in a 3 km box, each node
    /// linked to a few random others.
    fn random_graph(seed: u64, n: usize) -> RoadGraph {
        let mut rng = SimRng::new(seed);
        let mut b = RoadGraphBuilder::new();
        let ids: Vec<IntersectionId> = (0..n)
            .map(|_| {
                let north = rng.gen_range(0.0..3_000.0);
                let east = rng.gen_range(0.0..3_000.0);
                b.add_intersection(GeoPoint::new(0.0, 0.0).offset_m(north, east))
            })
            .collect();
        for i in 0..n {
            for _ in 0..2 {
                let j = rng.gen_range(0..n);
                if j == i {
                    continue;
                }
                if rng.gen_bool(0.3) {
                    b.add_directed_segment(ids[i], ids[j], 1);
                } else {
                    b.add_road(ids[i], ids[j], 1);
                }
            }
        }
        b.build().unwrap()
    }

    #[test]
    fn astar_matches_dijkstra() {
        for seed in [1, 7, 42, 1234] {
            let g = random_graph(seed, 25);
            for a in 0..g.intersection_count() as u32 {
                for b in 0..g.intersection_count() as u32 {
                    let (a, b) = (IntersectionId(a), IntersectionId(b));
                    let fast = AStarPlanner.plan(&g, a, b);
                    let oracle = DijkstraPlanner.plan(&g, a, b);
                    match (fast, oracle) {
                        (Ok(p), Ok(q)) => {
                            assert!(
                                (p.cost_m - q.cost_m).abs() < 1e-6,
                                "seed {seed} {a}->{b}: astar {} dijkstra {}",
                                p.cost_m,
                                q.cost_m
                            );
                            assert_eq!(p.intersections.first(), Some(&a));
                            assert_eq!(p.intersections.last(), Some(&b));
                        }
                        (Err(_), Err(_)) => {}
                        (p, q) => panic!("seed {seed} {a}->{b}: reachability differs: {:?} vs {:?}", p.ok(), q.ok()),
                    }
                }
            }
        }
    }

    #[test]
    fn path_cost_matches_segment_sum() {
        let g = random_graph(99, 30);
        let path = AStarPlanner.plan(&g, IntersectionId(0), IntersectionId(29));
        if let Ok(path) = path {
            let sum: f64 = path
                .waypoints(&g)
                .windows(2)
                .map(|w| w[0].distance_m(w[1]))
                .sum();
            assert!((sum - path.cost_m).abs() < 1e-6);
        }
    }
}

// ── Mission plans ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod mission {
    use crate::tests::helpers::{corridor, square};
    use crate::{AStarPlanner, MissionPlan};

    #[test]
    fn three_legs_concatenate_without_duplicates() {
        let (g, [i0, i1, i2]) = corridor();
        let plan = MissionPlan::plan(&AStarPlanner, &g, i0, i1, i2);
        assert!(plan.is_complete());
        assert_eq!(plan.to_patient.intersections, vec![i0, i1]);
        assert_eq!(plan.to_hospital.intersections, vec![i1, i2]);
        assert_eq!(plan.return_to_station.intersections, vec![i2, i1, i0]);
        assert_eq!(plan.full_path(), vec![i0, i1, i2, i1, i0]);
        assert!((plan.length_m() - 4_000.0).abs() < 1e-6);
    }

    #[test]
    fn unroutable_leg_is_empty() {
        let (g, [n0, n1, _, _, n4]) = square();
        let plan = MissionPlan::plan(&AStarPlanner, &g, n0, n4, n1);
        assert!(!plan.is_complete());
        assert!(plan.to_patient.is_empty());
        assert!(!plan.to_patient.is_drivable());
        assert!(plan.to_hospital.is_empty());
        assert_eq!(plan.return_to_station.intersections, vec![n1, n0]);
    }
}

// ── Resolver ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod resolver {
    use ev_core::{Approach, GeoPoint, SignalId};
    use crate::tests::helpers::origin;
    use crate::{SignalOnRouteResolver, SignalSite};

    fn line() -> Vec<GeoPoint> {
        vec![origin(), origin().offset_m(0.0, 1_000.0), origin().offset_m(0.0, 2_000.0)]
    }

    #[test]
    fn binds_within_threshold_only() {
        let sites = [
            SignalSite::new(SignalId(0), origin().offset_m(30.0, 500.0)),
            SignalSite::new(SignalId(1), origin().offset_m(80.0, 1_500.0)),
        ];
        let out = SignalOnRouteResolver::default().resolve(&line(), &sites);
        assert_eq!(out.len(), 1);
        let e = out.get(SignalId(0)).unwrap();
        assert_eq!(e.ordinal, 0);
        assert!((e.distance_m - 30.0).abs() < 0.01);
        assert!(!out.contains(SignalId(1)));
    }

    #[test]
    fn sorted_by_ordinal() {
        let sites = [
            SignalSite::new(SignalId(5), origin().offset_m(0.0, 1_500.0)),
            SignalSite::new(SignalId(9), origin().offset_m(0.0, 200.0)),
            SignalSite::new(SignalId(2), origin().offset_m(0.0, 1_800.0)),
        ];
        let out = SignalOnRouteResolver::default().resolve(&line(), &sites);
        assert_eq!(out.ids(), vec![SignalId(9), SignalId(2), SignalId(5)]);
        let ordinals: Vec<usize> = out.iter().map(|e| e.ordinal).collect();
        assert_eq!(ordinals, vec![0, 1, 1]);
    }

    #[test]
    fn tie_goes_to_earlier_segment() {
        // Exactly on the shared waypoint: distance 0 to both segments.
        let sites = [SignalSite::new(SignalId(0), origin().offset_m(0.0, 1_000.0))];
        let out = SignalOnRouteResolver::default().resolve(&line(), &sites);
        assert_eq!(out.as_slice()[0].ordinal, 0);
    }

    #[test]
    fn looping_route_binds_once() {
        // Out and back along the same road.
        let a = origin();
        let b = origin().offset_m(0.0, 1_000.0);
        let route = vec![a, b, a];
        let sites = [SignalSite::new(SignalId(3), origin().offset_m(10.0, 400.0))];
        let out = SignalOnRouteResolver::default().resolve(&route, &sites);
        assert_eq!(out.len(), 1);
        assert!((out.as_slice()[0].distance_m - 10.0).abs() < 0.01);
    }

    #[test]
    fn idempotent() {
        let sites: Vec<SignalSite> = (0..20)
            .map(|i| SignalSite::new(SignalId(i), origin().offset_m((i as f64) * 3.0 - 30.0, (i as f64) * 100.0)))
            .collect();
        let r = SignalOnRouteResolver::default();
        assert_eq!(r.resolve(&line(), &sites), r.resolve(&line(), &sites));
    }

    #[test]
    fn degenerate_routes_bind_nothing() {
        let sites = [SignalSite::new(SignalId(0), origin())];
        let r = SignalOnRouteResolver::default();
        assert!(r.resolve(&[], &sites).is_empty());
        assert!(r.resolve(&[origin()], &sites).is_empty());
    }

    #[test]
    fn approach_filter() {
        // Both signals sit at the middle intersection; the route arrives there
        // travelling east, i.e. on the west approach.
        let mid = origin().offset_m(0.0, 1_000.0);
        let sites = [
            SignalSite::new(SignalId(0), mid).with_approach(Approach::West),
            SignalSite::new(SignalId(1), mid).with_approach(Approach::North),
            SignalSite::new(SignalId(2), mid).with_approach(Approach::East),
        ];
        let out = SignalOnRouteResolver::default().resolve(&line(), &sites);
        assert_eq!(out.ids(), vec![SignalId(0)]);
    }

    #[test]
    fn turning_route_binds_one_signal_per_corner() {
        // East into the corner, then north out of it.  The south-approach
        // signal matches the outgoing segment's direction but sits at its
        // start, so only the west-approach signal is on the route.
        let corner = origin().offset_m(0.0, 1_000.0);
        let route = [origin(), corner, corner.offset_m(1_000.0, 0.0)];
        let sites: Vec<SignalSite> = Approach::ALL
            .iter()
            .enumerate()
            .map(|(i, &a)| SignalSite::new(SignalId(i as u32), corner).with_approach(a))
            .collect();

        let out = SignalOnRouteResolver::default().resolve(&route, &sites);
        assert_eq!(out.len(), 1);
        let e = out.as_slice()[0];
        assert_eq!(sites[e.signal.index()].approach, Some(Approach::West));
        assert_eq!(e.ordinal, 0);
    }

    #[test]
    fn route_starting_at_a_corner_skips_its_signals() {
        let sites = [SignalSite::new(SignalId(0), origin()).with_approach(Approach::West)];
        assert!(SignalOnRouteResolver::default().resolve(&line(), &sites).is_empty());
    }
}

// ── Registry & routing provider ───────────────────────────────────────────────

#[cfg(test)]
mod registry {
    use ev_core::{GeoPoint, SignalId};
    use crate::tests::helpers::{corridor, origin};
    use crate::{AStarPlanner, GraphRoutingProvider, RoadGraph, RoutingProvider, SignalRegistry, SignalSite, SpatialError};

    fn registry() -> SignalRegistry {
        SignalRegistry::new(vec![
            SignalSite::new(SignalId(2), origin().offset_m(0.0, 1_000.0)),
            SignalSite::new(SignalId(0), origin().offset_m(0.0, 100.0)),
            SignalSite::new(SignalId(1), origin().offset_m(5_000.0, 5_000.0)),
        ])
    }

    #[test]
    fn bounding_box_query() {
        let reg = registry();
        assert_eq!(reg.len(), 3);
        let near = reg.signals_near(origin().offset_m(-50.0, -50.0), origin().offset_m(50.0, 1_050.0));
        let ids: Vec<SignalId> = near.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SignalId(0), SignalId(2)]);
        // Corner order does not matter.
        let swapped = reg.signals_near(origin().offset_m(50.0, 1_050.0), origin().offset_m(-50.0, -50.0));
        assert_eq!(swapped.len(), 2);
    }

    #[test]
    fn near_route_uses_margin() {
        let reg = registry();
        let route = [origin().offset_m(60.0, 0.0), origin().offset_m(60.0, 2_000.0)];
        assert!(reg.signals_near_route(&route, 10.0).is_empty());
        assert_eq!(reg.signals_near_route(&route, 70.0).len(), 2);
        assert!(reg.signals_near_route(&[], 70.0).is_empty());
    }

    #[test]
    fn lookup_by_id() {
        let reg = registry();
        assert!(reg.get(SignalId(1)).is_some());
        assert!(reg.get(SignalId(9)).is_none());
    }

    #[test]
    fn graph_provider_snaps_endpoints() {
        let (g, _) = corridor();
        let provider = GraphRoutingProvider::new(&g, AStarPlanner);
        let route = provider
            .route(origin().offset_m(20.0, -20.0), origin().offset_m(-15.0, 2_030.0))
            .unwrap();
        assert_eq!(route.len(), 3);
        assert_eq!(route[0], g.node_pos[0]);
        assert_eq!(route[2], g.node_pos[2]);
    }

    #[test]
    fn graph_provider_on_empty_graph() {
        let g = RoadGraph::empty();
        let provider = GraphRoutingProvider::new(&g, AStarPlanner);
        let err = provider.route(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)).unwrap_err();
        assert!(matches!(err, SpatialError::EmptyGraph));
    }
}

// ── CSV loader ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader {
    use std::io::Cursor;
    use ev_core::IntersectionId;
    use crate::{load_graph_reader, SpatialError};

    const NODES: &str = "id,lat,lon\n0,0.0,0.0\n1,0.0,0.009\n2,0.0,0.018\n";

    #[test]
    fn loads_two_way_and_one_way() {
        let roads = "from,to,lanes,oneway\n0,1,2,false\n1,2,1,true\n";
        let g = load_graph_reader(Cursor::new(NODES), Cursor::new(roads)).unwrap();
        assert_eq!(g.intersection_count(), 3);
        assert_eq!(g.segment_count(), 3);
        assert_eq!(g.out_degree(IntersectionId(2)), 0);
    }

    #[test]
    fn oneway_column_optional() {
        let roads = "from,to,lanes\n0,1,2\n";
        let g = load_graph_reader(Cursor::new(NODES), Cursor::new(roads)).unwrap();
        assert_eq!(g.segment_count(), 2);
    }

    #[test]
    fn dangling_road_is_fatal() {
        let roads = "from,to,lanes\n0,7,2\n";
        let err = load_graph_reader(Cursor::new(NODES), Cursor::new(roads)).unwrap_err();
        assert!(matches!(err, SpatialError::IntersectionNotFound(IntersectionId(7))));
    }

    #[test]
    fn out_of_order_ids_rejected() {
        let nodes = "id,lat,lon\n0,0.0,0.0\n2,0.0,0.01\n";
        let err = load_graph_reader(Cursor::new(nodes), Cursor::new("from,to,lanes\n")).unwrap_err();
        assert!(matches!(err, SpatialError::Parse(_)));
    }

    #[test]
    fn malformed_row_rejected() {
        let nodes = "id,lat,lon\n0,north,0.0\n";
        let err = load_graph_reader(Cursor::new(nodes), Cursor::new("from,to,lanes\n")).unwrap_err();
        assert!(matches!(err, SpatialError::Parse(_)));
    }
}
