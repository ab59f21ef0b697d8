//! CSV road-graph loader.
//!
//! # CSV format
//!
//! Two files.  Intersections, one row each, ids dense from 0 in file order:
//!
//! ```csv
//! id,lat,lon
//! 0,12.9340,77.6230
//! 1,12.9350,77.6150
//! ```
//!
//! Roads, one row each.  `oneway` is optional and defaults to `false`, in
//! which case both directions are added:
//!
//! ```csv
//! from,to,lanes,oneway
//! 0,1,2,false
//! ```
//!
//! Any malformed row or dangling id aborts the load.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use ev_core::{GeoPoint, IntersectionId};

use crate::network::{RoadGraph, RoadGraphBuilder};
use crate::{SpatialError, SpatialResult};

// ── CSV records ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct IntersectionRecord {
    id:  u32,
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct RoadRecord {
    from:   u32,
    to:     u32,
    lanes:  u8,
    #[serde(default)]
    oneway: bool,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load a [`RoadGraph`] from an intersections CSV and a roads CSV.
pub fn load_graph_csv(intersections: &Path, roads: &Path) -> SpatialResult<RoadGraph> {
    let nodes = std::fs::File::open(intersections).map_err(SpatialError::Io)?;
    let edges = std::fs::File::open(roads).map_err(SpatialError::Io)?;
    load_graph_reader(nodes, edges)
}

/// Like [`load_graph_csv`] but accepts any `Read` sources.
///
/// Useful for testing (pass a `std::io::Cursor`).
pub fn load_graph_reader<N: Read, E: Read>(intersections: N, roads: E) -> SpatialResult<RoadGraph> {
    let mut builder = RoadGraphBuilder::new();

    // ── Intersections ─────────────────────────────────────────────────────
    let mut rdr = csv::Reader::from_reader(intersections);
    for result in rdr.deserialize::<IntersectionRecord>() {
        let row = result.map_err(|e| SpatialError::Parse(e.to_string()))?;
        let expected = builder.intersection_count();
        if row.id as usize != expected {
            return Err(SpatialError::Parse(format!(
                "intersection id {} out of order: expected {expected}",
                row.id
            )));
        }
        builder.add_intersection(GeoPoint::new(row.lat, row.lon));
    }

    // ── Roads ─────────────────────────────────────────────────────────────
    let mut rdr = csv::Reader::from_reader(roads);
    for result in rdr.deserialize::<RoadRecord>() {
        let row = result.map_err(|e| SpatialError::Parse(e.to_string()))?;
        let (from, to) = (IntersectionId(row.from), IntersectionId(row.to));
        if row.oneway {
            builder.add_directed_segment(from, to, row.lanes);
        } else {
            builder.add_road(from, to, row.lanes);
        }
    }

    let graph = builder.build()?;
    log::info!(
        "loaded road graph: {} intersections, {} segments",
        graph.intersection_count(),
        graph.segment_count()
    );
    Ok(graph)
}
