//! Route planning over the road graph.
//!
//! # Pluggability
//!
//! Mission planning goes through the [`RoutePlanner`] trait.  [`AStarPlanner`]
//! is the default and uses the haversine distance to the goal as heuristic;
//! it never overestimates because every segment's cost is the great-circle
//! length of that segment.  [`DijkstraPlanner`] explores without a heuristic
//! and is kept as a reference for tests and benchmarking.
//!
//! # Cost units
//!
//! All costs are metres (`f64`).  Ordering inside the heap uses
//! `f64::total_cmp` with a monotonically increasing insertion sequence as
//! the secondary key, so equal-cost frontiers pop in a deterministic order.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ev_core::{GeoPoint, IntersectionId, SegmentId};

use crate::network::RoadGraph;
use crate::{SpatialError, SpatialResult};

// ── Path ──────────────────────────────────────────────────────────────────────

/// A planned path: intersections to visit in order plus the total length.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    /// Intersections from source to destination, both inclusive.
    pub intersections: Vec<IntersectionId>,
    /// Sum of segment lengths in metres.
    pub cost_m: f64,
}

impl Path {
    /// `true` if the source and destination are the same intersection.
    pub fn is_trivial(&self) -> bool {
        self.intersections.len() <= 1
    }

    /// Positions of the path's intersections.
    pub fn waypoints(&self, graph: &RoadGraph) -> Vec<GeoPoint> {
        graph.waypoints(&self.intersections)
    }
}

// ── RoutePlanner trait ────────────────────────────────────────────────────────

/// Pluggable shortest-path engine.
///
/// # Thread safety
///
/// Implementations must be `Send + Sync` so a single planner can be shared
/// between the coordinator and any parallel dispatch stage.
pub trait RoutePlanner: Send + Sync {
    /// Plan a path from `from` to `to`.
    ///
    /// `from == to` yields a trivial path `[from]` with zero cost.
    ///
    /// # Errors
    ///
    /// - [`SpatialError::IntersectionNotFound`] if either id is not in the graph.
    /// - [`SpatialError::NoRoute`] if `to` is unreachable from `from`.
    fn plan(&self, graph: &RoadGraph, from: IntersectionId, to: IntersectionId) -> SpatialResult<Path>;

    /// Intersection ids of the shortest path, or an empty list when no path
    /// exists or an endpoint is unknown.
    fn find_path(&self, graph: &RoadGraph, from: IntersectionId, to: IntersectionId) -> Vec<IntersectionId> {
        match self.plan(graph, from, to) {
            Ok(path) => path.intersections,
            Err(e) => {
                log::debug!("no path {from} -> {to}: {e}");
                Vec::new()
            }
        }
    }
}

// ── Heap key ──────────────────────────────────────────────────────────────────

/// Total-ordered `f64` for use as a heap key.
#[derive(Copy, Clone, Debug, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

// ── AStarPlanner ──────────────────────────────────────────────────────────────

/// A* search with a haversine heuristic.
///
/// `g` is the accumulated segment length from the source; `h` is the
/// straight-line distance to the goal; nodes are expanded in ascending
/// `f = g + h`.  Each node is expanded at most once (closed set).
#[derive(Copy, Clone, Debug, Default)]
pub struct AStarPlanner;

impl RoutePlanner for AStarPlanner {
    fn plan(&self, graph: &RoadGraph, from: IntersectionId, to: IntersectionId) -> SpatialResult<Path> {
        search(graph, from, to, true)
    }
}

// ── DijkstraPlanner ───────────────────────────────────────────────────────────

/// Uninformed Dijkstra search.  Produces the same costs as [`AStarPlanner`].
#[derive(Copy, Clone, Debug, Default)]
pub struct DijkstraPlanner;

impl RoutePlanner for DijkstraPlanner {
    fn plan(&self, graph: &RoadGraph, from: IntersectionId, to: IntersectionId) -> SpatialResult<Path> {
        search(graph, from, to, false)
    }
}

// ── Search internals ──────────────────────────────────────────────────────────

fn search(
    graph: &RoadGraph,
    from: IntersectionId,
    to: IntersectionId,
    use_heuristic: bool,
) -> SpatialResult<Path> {
    for id in [from, to] {
        if !graph.contains(id) {
            return Err(SpatialError::IntersectionNotFound(id));
        }
    }
    if from == to {
        return Ok(Path { intersections: vec![from], cost_m: 0.0 });
    }

    let goal = graph.node_pos[to.index()];
    let h = |n: IntersectionId| -> f64 {
        if use_heuristic { graph.node_pos[n.index()].distance_m(goal) } else { 0.0 }
    };

    let n = graph.intersection_count();
    // g[v] = best known path length to v.
    let mut g         = vec![f64::INFINITY; n];
    // prev_seg[v] = segment that reached v; INVALID for unreached nodes.
    let mut prev_seg  = vec![SegmentId::INVALID; n];
    let mut closed    = vec![false; n];
    let mut seq: u64  = 0;

    g[from.index()] = 0.0;

    // Min-heap on (f, seq, node).  `seq` breaks ties in insertion order.
    let mut heap: BinaryHeap<Reverse<(Cost, u64, IntersectionId)>> = BinaryHeap::new();
    heap.push(Reverse((Cost(h(from)), seq, from)));

    while let Some(Reverse((_, _, node))) = heap.pop() {
        if node == to {
            return Ok(reconstruct(graph, &prev_seg, to, g[to.index()]));
        }
        if closed[node.index()] {
            continue;
        }
        closed[node.index()] = true;

        let g_node = g[node.index()];
        for seg in graph.out_segments(node) {
            let next = graph.seg_to[seg.index()];
            if closed[next.index()] {
                continue;
            }
            let tentative = g_node + graph.seg_length_m[seg.index()];
            if tentative < g[next.index()] {
                g[next.index()] = tentative;
                prev_seg[next.index()] = seg;
                seq += 1;
                heap.push(Reverse((Cost(tentative + h(next)), seq, next)));
            }
        }
    }

    Err(SpatialError::NoRoute { from, to })
}

fn reconstruct(graph: &RoadGraph, prev_seg: &[SegmentId], to: IntersectionId, cost_m: f64) -> Path {
    let mut intersections = vec![to];
    let mut cur = to;
    loop {
        let s = prev_seg[cur.index()];
        if s == SegmentId::INVALID {
            break;
        }
        cur = graph.seg_from[s.index()];
        intersections.push(cur);
    }
    intersections.reverse();
    Path { intersections, cost_m }
}
