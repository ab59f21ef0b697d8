//! Signal configuration loading.
//!
//! # CSV format
//!
//! One row per signal, ids dense from 0 in file order.  `approach` is
//! optional (`N`/`E`/`S`/`W` or empty for a simple light).  `lat`/`lon` are
//! optional and default to the intersection's position.
//!
//! ```csv
//! id,intersection,approach,lat,lon
//! 0,1,,,
//! 1,2,W,12.9351,77.6149
//! ```
//!
//! A signal whose intersection is not in the road graph is a fatal
//! configuration error ([`SignalError::MissingGeometry`]).

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use ev_core::{Approach, GeoPoint, IntersectionId, SignalId};
use ev_spatial::RoadGraph;

use crate::signal::Signal;
use crate::{SignalError, SignalResult};

#[derive(Deserialize)]
struct SignalRecord {
    id:           u32,
    intersection: u32,
    #[serde(default)]
    approach:     Option<String>,
    #[serde(default)]
    lat:          Option<f64>,
    #[serde(default)]
    lon:          Option<f64>,
}

/// Load signals from a CSV file, validating them against `graph`.
pub fn load_signals_csv(path: &Path, graph: &RoadGraph) -> SignalResult<Vec<Signal>> {
    let file = std::fs::File::open(path).map_err(SignalError::Io)?;
    load_signals_reader(file, graph)
}

/// Like [`load_signals_csv`] but accepts any `Read` source.
pub fn load_signals_reader<R: Read>(reader: R, graph: &RoadGraph) -> SignalResult<Vec<Signal>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut signals: Vec<Signal> = Vec::new();

    for result in rdr.deserialize::<SignalRecord>() {
        let row = result.map_err(|e| SignalError::Parse(e.to_string()))?;
        let id = SignalId(row.id);
        let expected = SignalId(signals.len() as u32);
        if id != expected {
            return Err(SignalError::IdOutOfSequence { expected, found: id });
        }

        let intersection = IntersectionId(row.intersection);
        let Some(node_pos) = graph.position(intersection) else {
            return Err(SignalError::MissingGeometry { signal: id, intersection });
        };
        let position = match (row.lat, row.lon) {
            (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
            (None, None) => node_pos,
            _ => return Err(SignalError::Parse(format!("{id}: lat and lon must be given together"))),
        };

        let mut signal = Signal::new(id, intersection, position);
        match row.approach.as_deref().map(str::trim) {
            None | Some("") => {}
            Some(label) => {
                let approach: Approach = label.parse().map_err(|e| SignalError::Parse(format!("{id}: {e}")))?;
                signal = signal.with_approach(approach);
            }
        }
        signals.push(signal);
    }

    log::info!("loaded {} signals", signals.len());
    Ok(signals)
}

/// One simple (unconstrained) signal at each of `intersections`.
pub fn signals_at(graph: &RoadGraph, intersections: &[IntersectionId]) -> SignalResult<Vec<Signal>> {
    intersections
        .iter()
        .enumerate()
        .map(|(i, &node)| {
            let id = SignalId(i as u32);
            graph
                .position(node)
                .map(|pos| Signal::new(id, node, pos))
                .ok_or(SignalError::MissingGeometry { signal: id, intersection: node })
        })
        .collect()
}

/// One signal per incoming approach at each of `intersections`.
///
/// An intersection with no incoming segments gets one simple signal.
pub fn signals_per_approach(graph: &RoadGraph, intersections: &[IntersectionId]) -> SignalResult<Vec<Signal>> {
    let mut signals = Vec::new();
    for &node in intersections {
        let next_id = SignalId(signals.len() as u32);
        let pos = graph
            .position(node)
            .ok_or(SignalError::MissingGeometry { signal: next_id, intersection: node })?;
        let approaches = graph.approaches(node);
        if approaches.is_empty() {
            signals.push(Signal::new(next_id, node, pos));
            continue;
        }
        for approach in approaches.iter() {
            let id = SignalId(signals.len() as u32);
            signals.push(Signal::new(id, node, pos).with_approach(approach));
        }
    }
    Ok(signals)
}
