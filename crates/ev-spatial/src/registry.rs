//! Signal registry and routing provider.
//!
//! These are the two data sources the preemption engine consumes: where the
//! signals are, and what polyline an ambulance follows between two
//! positions.  A scenario may back them with files, a local graph, or a test
//! fixture.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use ev_core::geo::METRES_PER_DEGREE;
use ev_core::{GeoPoint, SignalId};

use crate::network::RoadGraph;
use crate::planner::RoutePlanner;
use crate::resolver::SignalSite;
use crate::{SpatialError, SpatialResult};

// ── R-tree entry ──────────────────────────────────────────────────────────────

#[derive(Clone)]
struct SiteEntry {
    point: [f64; 2], // [lat, lon]
    slot: usize,
}

impl RTreeObject for SiteEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for SiteEntry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── SignalRegistry ────────────────────────────────────────────────────────────

/// Every signal site in the scenario, indexed for bounding-box queries.
pub struct SignalRegistry {
    sites: Vec<SignalSite>,
    index: RTree<SiteEntry>,
}

impl SignalRegistry {
    pub fn new(sites: Vec<SignalSite>) -> Self {
        let entries = sites
            .iter()
            .enumerate()
            .map(|(slot, s)| SiteEntry { point: [s.position.lat, s.position.lon], slot })
            .collect();
        Self { sites, index: RTree::bulk_load(entries) }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn sites(&self) -> &[SignalSite] {
        &self.sites
    }

    pub fn get(&self, id: SignalId) -> Option<&SignalSite> {
        self.sites.iter().find(|s| s.id == id)
    }

    /// Sites inside the box spanned by `min` and `max` (inclusive), sorted
    /// by signal id.
    pub fn signals_near(&self, min: GeoPoint, max: GeoPoint) -> Vec<SignalSite> {
        let envelope = AABB::from_corners(
            [min.lat.min(max.lat), min.lon.min(max.lon)],
            [min.lat.max(max.lat), min.lon.max(max.lon)],
        );
        let mut found: Vec<SignalSite> = self
            .index
            .locate_in_envelope(&envelope)
            .map(|e| self.sites[e.slot])
            .collect();
        found.sort_by_key(|s| s.id);
        found
    }

    /// Sites inside the bounding box of `route` grown by `margin_m` metres
    /// on every side.  Candidate set for the resolver.
    pub fn signals_near_route(&self, route: &[GeoPoint], margin_m: f64) -> Vec<SignalSite> {
        let Some(first) = route.first() else {
            return Vec::new();
        };
        let (mut min, mut max) = (*first, *first);
        for p in route {
            min.lat = min.lat.min(p.lat);
            min.lon = min.lon.min(p.lon);
            max.lat = max.lat.max(p.lat);
            max.lon = max.lon.max(p.lon);
        }
        let dlat = margin_m / METRES_PER_DEGREE;
        let cos = max.lat.abs().max(min.lat.abs()).to_radians().cos().max(1e-6);
        let dlon = dlat / cos;
        self.signals_near(
            GeoPoint::new(min.lat - dlat, min.lon - dlon),
            GeoPoint::new(max.lat + dlat, max.lon + dlon),
        )
    }
}

// ── RoutingProvider ───────────────────────────────────────────────────────────

/// Source of route polylines between two positions.
pub trait RoutingProvider {
    /// Ordered polyline from `origin` to `destination`.
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> SpatialResult<Vec<GeoPoint>>;
}

/// [`RoutingProvider`] over a local [`RoadGraph`].  Both positions are
/// snapped to their nearest intersections before planning.
pub struct GraphRoutingProvider<'g, P: RoutePlanner> {
    pub graph: &'g RoadGraph,
    pub planner: P,
}

impl<'g, P: RoutePlanner> GraphRoutingProvider<'g, P> {
    pub fn new(graph: &'g RoadGraph, planner: P) -> Self {
        Self { graph, planner }
    }
}

impl<P: RoutePlanner> RoutingProvider for GraphRoutingProvider<'_, P> {
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> SpatialResult<Vec<GeoPoint>> {
        let from = self.graph.snap_to_intersection(origin).ok_or(SpatialError::EmptyGraph)?;
        let to   = self.graph.snap_to_intersection(destination).ok_or(SpatialError::EmptyGraph)?;
        let path = self.planner.plan(self.graph, from, to)?;
        Ok(path.waypoints(self.graph))
    }
}
