//! Road networks for the corridor demo.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use ev_core::{GeoPoint, IntersectionId};
use ev_signal::{Signal, load_signals_csv, signals_at};
use ev_spatial::{RoadGraph, RoadGraphBuilder, load_graph_csv};

/// Where the scenario's road network comes from.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NetworkSource {
    /// A straight east-west arterial with a simple signal at every listed
    /// intersection index.
    Corridor {
        intersections: usize,
        spacing_m: f64,
        #[serde(default)]
        signalized: Vec<u32>,
    },
    /// Intersections, roads and signals from CSV files.
    Csv { intersections: PathBuf, roads: PathBuf, signals: PathBuf },
}

impl Default for NetworkSource {
    fn default() -> Self {
        NetworkSource::Corridor { intersections: 3, spacing_m: 1_000.0, signalized: vec![1] }
    }
}

/// West end of the corridor, downtown Mobile, AL.
const CORRIDOR_ORIGIN: GeoPoint = GeoPoint { lat: 30.6944, lon: -88.0431 };

/// Build an `n`-intersection corridor with two-lane roads in both directions.
pub fn build_corridor(n: usize, spacing_m: f64) -> Result<(RoadGraph, Vec<IntersectionId>)> {
    if n < 2 {
        bail!("a corridor needs at least 2 intersections, got {n}");
    }
    let mut b = RoadGraphBuilder::with_capacity(n, 2 * (n - 1));
    let ids: Vec<IntersectionId> = (0..n)
        .map(|i| b.add_intersection(CORRIDOR_ORIGIN.offset_m(0.0, i as f64 * spacing_m)))
        .collect();
    for w in ids.windows(2) {
        b.add_road(w[0], w[1], 2);
    }
    Ok((b.build()?, ids))
}

/// Load or build the network and its signals.
pub fn load(source: &NetworkSource) -> Result<(RoadGraph, Vec<Signal>)> {
    match source {
        NetworkSource::Corridor { intersections, spacing_m, signalized } => {
            let (graph, _) = build_corridor(*intersections, *spacing_m)?;
            let at: Vec<IntersectionId> = signalized.iter().map(|&i| IntersectionId(i)).collect();
            let signals = signals_at(&graph, &at)?;
            Ok((graph, signals))
        }
        NetworkSource::Csv { intersections, roads, signals } => {
            let graph = load_graph_csv(intersections, roads)
                .with_context(|| format!("loading {} and {}", intersections.display(), roads.display()))?;
            let signals =
                load_signals_csv(signals, &graph).with_context(|| format!("loading {}", signals.display()))?;
            Ok((graph, signals))
        }
    }
}
