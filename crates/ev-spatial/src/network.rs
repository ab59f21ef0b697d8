//! Road graph representation and builder.
//!
//! # Data layout
//!
//! The graph uses **Compressed Sparse Row (CSR)** format for outgoing road
//! segments.  Given an `IntersectionId n`, its outgoing segments occupy:
//!
//! ```text
//! seg_from[ node_out_start[n] .. node_out_start[n+1] ]
//! ```
//!
//! All segment arrays are sorted by source intersection and indexed by
//! `SegmentId`, so iterating a node's outgoing segments is a contiguous scan,
//! the inner loop of A*.
//!
//! # Spatial index
//!
//! An R-tree (via `rstar`) maps `(lat, lon)` to the nearest intersection.
//! Used to snap routing-provider endpoints and scenario positions to nodes.
//!
//! The graph is read-only once built.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use ev_core::{Approach, ApproachSet, GeoPoint, IntersectionId, SegmentId};

use crate::{SpatialError, SpatialResult};

// ── R-tree node entry ─────────────────────────────────────────────────────────

/// Entry stored in the R-tree spatial index: a `[lat, lon]` point with the
/// associated `IntersectionId`.
#[derive(Clone)]
struct NodeEntry {
    point: [f64; 2], // [lat, lon]
    id: IntersectionId,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon space.  Sufficient for
    /// nearest-node queries within a city.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// Directed road graph in CSR format plus a spatial index for node snapping.
///
/// Fields are `pub` for direct indexed access on hot paths.  Do not construct
/// directly; use [`RoadGraphBuilder`].
pub struct RoadGraph {
    // ── Intersection data ─────────────────────────────────────────────────
    /// Geographic position of each intersection.  Indexed by `IntersectionId`.
    pub node_pos: Vec<GeoPoint>,

    /// Directions from which at least one segment enters each intersection.
    pub node_approaches: Vec<ApproachSet>,

    // ── CSR segment adjacency ─────────────────────────────────────────────
    /// CSR row pointer.  Length = `intersection_count + 1`.
    pub node_out_start: Vec<u32>,

    // ── Segment data (indexed by SegmentId = position in sorted order) ────
    /// Source intersection of each segment.  Redundant with CSR but required
    /// for route reconstruction.
    pub seg_from: Vec<IntersectionId>,

    /// Destination intersection of each segment.
    pub seg_to: Vec<IntersectionId>,

    /// Length of each segment in metres, derived from endpoint geometry.
    /// Used as the planner's edge cost.
    pub seg_length_m: Vec<f64>,

    /// Lane count of each segment (at least 1).  Informational: rendering
    /// widths and civilian spawning.
    pub seg_lanes: Vec<u8>,

    // ── Spatial index ─────────────────────────────────────────────────────
    spatial_idx: RTree<NodeEntry>,
}

impl std::fmt::Debug for RoadGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoadGraph")
            .field("intersections", &self.intersection_count())
            .field("segments", &self.segment_count())
            .finish()
    }
}

impl RoadGraph {
    /// Construct an empty graph with no intersections or segments.
    ///
    /// Any planning request against it fails with
    /// [`SpatialError::IntersectionNotFound`].
    pub fn empty() -> Self {
        RoadGraphBuilder::new().assemble()
    }

    // ── Graph dimensions ──────────────────────────────────────────────────

    pub fn intersection_count(&self) -> usize {
        self.node_pos.len()
    }

    pub fn segment_count(&self) -> usize {
        self.seg_to.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_pos.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: IntersectionId) -> bool {
        id.index() < self.node_pos.len()
    }

    /// Position of `id`, or `None` if it is not in the graph.
    #[inline]
    pub fn position(&self, id: IntersectionId) -> Option<GeoPoint> {
        self.node_pos.get(id.index()).copied()
    }

    /// Incoming approach directions of `id` (empty for unknown ids).
    #[inline]
    pub fn approaches(&self, id: IntersectionId) -> ApproachSet {
        self.node_approaches.get(id.index()).copied().unwrap_or_default()
    }

    // ── Graph traversal ───────────────────────────────────────────────────

    /// Iterator over the `SegmentId`s of all outgoing segments from `node`.
    #[inline]
    pub fn out_segments(&self, node: IntersectionId) -> impl Iterator<Item = SegmentId> + '_ {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        (start..end).map(|i| SegmentId(i as u32))
    }

    #[inline]
    pub fn out_degree(&self, node: IntersectionId) -> usize {
        let start = self.node_out_start[node.index()] as usize;
        let end   = self.node_out_start[node.index() + 1] as usize;
        end - start
    }

    /// Map an ordered list of intersection ids to their positions, skipping
    /// ids not in the graph.
    pub fn waypoints(&self, path: &[IntersectionId]) -> Vec<GeoPoint> {
        path.iter().filter_map(|&id| self.position(id)).collect()
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Return the nearest intersection to `pos`, or `None` if the graph is empty.
    pub fn snap_to_intersection(&self, pos: GeoPoint) -> Option<IntersectionId> {
        self.spatial_idx
            .nearest_neighbor(&[pos.lat, pos.lon])
            .map(|e| e.id)
    }

    /// Return up to `k` nearest intersections to `pos`, nearest first.
    pub fn k_nearest(&self, pos: GeoPoint, k: usize) -> Vec<IntersectionId> {
        self.spatial_idx
            .nearest_neighbor_iter(&[pos.lat, pos.lon])
            .take(k)
            .map(|e| e.id)
            .collect()
    }
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] incrementally, then call [`build`](Self::build).
///
/// # Example
///
/// ```
/// use ev_core::GeoPoint;
/// use ev_spatial::RoadGraphBuilder;
///
/// let mut b = RoadGraphBuilder::new();
/// let a = b.add_intersection(GeoPoint::new(12.934, 77.623));
/// let c = b.add_intersection(GeoPoint::new(12.935, 77.615));
/// b.add_road(a, c, 2);
/// let graph = b.build().unwrap();
/// assert_eq!(graph.intersection_count(), 2);
/// assert_eq!(graph.segment_count(), 2); // bidirectional
/// ```
pub struct RoadGraphBuilder {
    nodes:    Vec<GeoPoint>,
    raw_segs: Vec<RawSegment>,
}

struct RawSegment {
    from:  IntersectionId,
    to:    IntersectionId,
    lanes: u8,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self { nodes: Vec::new(), raw_segs: Vec::new() }
    }

    pub fn with_capacity(nodes: usize, segments: usize) -> Self {
        Self {
            nodes:    Vec::with_capacity(nodes),
            raw_segs: Vec::with_capacity(segments),
        }
    }

    /// Add an intersection and return its id (sequential from 0).
    pub fn add_intersection(&mut self, pos: GeoPoint) -> IntersectionId {
        let id = IntersectionId(self.nodes.len() as u32);
        self.nodes.push(pos);
        id
    }

    /// Add a **directed** segment from `from` to `to`.  Ids are validated in
    /// [`build`](Self::build).
    pub fn add_directed_segment(&mut self, from: IntersectionId, to: IntersectionId, lanes: u8) {
        self.raw_segs.push(RawSegment { from, to, lanes: lanes.max(1) });
    }

    /// Add segments in **both directions** for a two-way road.
    pub fn add_road(&mut self, a: IntersectionId, b: IntersectionId, lanes: u8) {
        self.add_directed_segment(a, b, lanes);
        self.add_directed_segment(b, a, lanes);
    }

    pub fn intersection_count(&self) -> usize { self.nodes.len() }
    pub fn segment_count(&self) -> usize { self.raw_segs.len() }

    /// Validate segment endpoints and produce a [`RoadGraph`].
    ///
    /// # Errors
    ///
    /// [`SpatialError::IntersectionNotFound`] if a segment references an id
    /// that was never added.
    pub fn build(self) -> SpatialResult<RoadGraph> {
        let n = self.nodes.len();
        if let Some(bad) = self
            .raw_segs
            .iter()
            .flat_map(|s| [s.from, s.to])
            .find(|id| id.index() >= n)
        {
            return Err(SpatialError::IntersectionNotFound(bad));
        }
        Ok(self.assemble())
    }

    /// Build without validation.  Callers guarantee every id is in range.
    fn assemble(self) -> RoadGraph {
        let node_count = self.nodes.len();
        let seg_count  = self.raw_segs.len();

        let mut raw = self.raw_segs;
        raw.sort_by_key(|s| s.from.0);

        let seg_from:  Vec<IntersectionId> = raw.iter().map(|s| s.from).collect();
        let seg_to:    Vec<IntersectionId> = raw.iter().map(|s| s.to).collect();
        let seg_lanes: Vec<u8>             = raw.iter().map(|s| s.lanes).collect();
        let seg_length_m: Vec<f64> = raw
            .iter()
            .map(|s| self.nodes[s.from.index()].distance_m(self.nodes[s.to.index()]))
            .collect();

        let mut node_approaches = vec![ApproachSet::EMPTY; node_count];
        for s in &raw {
            let from = self.nodes[s.from.index()];
            let to   = self.nodes[s.to.index()];
            if let Some(approach) = Approach::of_travel(from, to) {
                node_approaches[s.to.index()].insert(approach);
            }
        }

        let mut node_out_start = vec![0u32; node_count + 1];
        for s in &raw {
            node_out_start[s.from.index() + 1] += 1;
        }
        for i in 1..=node_count {
            node_out_start[i] += node_out_start[i - 1];
        }
        debug_assert_eq!(node_out_start[node_count] as usize, seg_count);

        let entries: Vec<NodeEntry> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, &pos)| NodeEntry {
                point: [pos.lat, pos.lon],
                id: IntersectionId(i as u32),
            })
            .collect();
        let spatial_idx = RTree::bulk_load(entries);

        RoadGraph {
            node_pos: self.nodes,
            node_approaches,
            node_out_start,
            seg_from,
            seg_to,
            seg_length_m,
            seg_lanes,
            spatial_idx,
        }
    }
}

impl Default for RoadGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
