//! Binding signals to a planned route.
//!
//! A signal is *on* a route when its perpendicular distance to some segment
//! of the route polyline is below the threshold.  The index of the closest
//! segment is the signal's **ordinal**: its position along the route, which
//! the coordinator compares against an ambulance's waypoint index to decide
//! which signal is next and which are already passed.

use ev_core::{Approach, GeoPoint, SignalId};

/// Default on-route threshold in metres.
pub const DEFAULT_THRESHOLD_M: f64 = 50.0;

// ── Inputs ────────────────────────────────────────────────────────────────────

/// A signal position as known to the resolver.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalSite {
    pub id: SignalId,
    pub position: GeoPoint,
    /// Approach this signal controls.  `None` for simple lights that face
    /// every direction.
    pub approach: Option<Approach>,
}

impl SignalSite {
    pub fn new(id: SignalId, position: GeoPoint) -> Self {
        Self { id, position, approach: None }
    }

    pub fn with_approach(mut self, approach: Approach) -> Self {
        self.approach = Some(approach);
        self
    }
}

// ── Outputs ───────────────────────────────────────────────────────────────────

/// One signal bound to a route.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalOnRoute {
    pub signal: SignalId,
    pub position: GeoPoint,
    /// Index of the route segment (`waypoints[i] → waypoints[i + 1]`) the
    /// signal is bound to.
    pub ordinal: usize,
    /// Distance from the signal to that segment in metres.
    pub distance_m: f64,
}

/// Signals on one route leg, sorted by `(ordinal, signal)`.
///
/// Immutable once resolved; a new leg gets a new list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignalsOnRoute {
    entries: Vec<SignalOnRoute>,
}

impl SignalsOnRoute {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SignalOnRoute> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[SignalOnRoute] {
        &self.entries
    }

    /// The entry for `signal`, if it is on this route.
    pub fn get(&self, signal: SignalId) -> Option<&SignalOnRoute> {
        self.entries.iter().find(|e| e.signal == signal)
    }

    pub fn contains(&self, signal: SignalId) -> bool {
        self.get(signal).is_some()
    }

    /// Signal ids in route order.
    pub fn ids(&self) -> Vec<SignalId> {
        self.entries.iter().map(|e| e.signal).collect()
    }
}

impl<'a> IntoIterator for &'a SignalsOnRoute {
    type Item = &'a SignalOnRoute;
    type IntoIter = std::slice::Iter<'a, SignalOnRoute>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ── Resolver ──────────────────────────────────────────────────────────────────

/// Computes [`SignalsOnRoute`] for a waypoint polyline.
///
/// Deterministic: the same route and site set always give the same list.
#[derive(Copy, Clone, Debug)]
pub struct SignalOnRouteResolver {
    /// Strict upper bound on the signal-to-route distance, in metres.
    pub threshold_m: f64,
}

impl Default for SignalOnRouteResolver {
    fn default() -> Self {
        Self { threshold_m: DEFAULT_THRESHOLD_M }
    }
}

impl SignalOnRouteResolver {
    pub fn new(threshold_m: f64) -> Self {
        Self { threshold_m }
    }

    /// Bind `sites` to `route`.
    ///
    /// Each signal binds to exactly one segment: the closest one, with ties
    /// going to the earlier segment.  Signals with an approach only consider
    /// segments that arrive from that approach, never the segment that
    /// departs from the signal's intersection, so a turning route binds one
    /// signal per corner.  Routes with fewer than two
    /// waypoints have no segments and bind nothing.
    pub fn resolve(&self, route: &[GeoPoint], sites: &[SignalSite]) -> SignalsOnRoute {
        if route.len() < 2 {
            return SignalsOnRoute::default();
        }

        let travel: Vec<Option<Approach>> = route
            .windows(2)
            .map(|w| Approach::of_travel(w[0], w[1]))
            .collect();

        let mut entries: Vec<SignalOnRoute> = sites
            .iter()
            .filter_map(|site| {
                let mut best: Option<(usize, f64)> = None;
                for (i, w) in route.windows(2).enumerate() {
                    if let Some(required) = site.approach {
                        // Segments leaving the signal's corner project onto their start.
                        if travel[i] != Some(required) || site.position.segment_fraction(w[0], w[1]) <= 0.0 {
                            continue;
                        }
                    }
                    let d = site.position.segment_distance_m(w[0], w[1]);
                    if best.is_none_or(|(_, best_d)| d < best_d) {
                        best = Some((i, d));
                    }
                }
                best.filter(|&(_, d)| d < self.threshold_m)
                    .map(|(ordinal, distance_m)| SignalOnRoute {
                        signal: site.id,
                        position: site.position,
                        ordinal,
                        distance_m,
                    })
            })
            .collect();

        entries.sort_by_key(|e| (e.ordinal, e.signal));
        SignalsOnRoute { entries }
    }
}
