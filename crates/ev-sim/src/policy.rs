//! Per-ambulance planning for the two preemption modes.
//!
//! Both planners are pure: they read the ambulance, its route signals and
//! the board as of the start of the planning phase and return intents.
//! Nothing here mutates state, so planning can run in parallel.

use ev_core::{AmbulanceId, GeoPoint};
use ev_fleet::Ambulance;
use ev_signal::{ControllerParams, SignalBoard};
use ev_spatial::{SignalOnRoute, SignalsOnRoute};

use crate::coordinator::{SignalSet, WaitRecord};
use crate::intent::SignalIntent;

/// Read-only inputs for one ambulance.
pub(crate) struct PlanInput<'a> {
    pub ambulance: &'a Ambulance,
    /// Waypoints of the active leg.
    pub route: &'a [GeoPoint],
    pub signals: &'a SignalsOnRoute,
    pub wait: Option<&'a WaitRecord>,
    /// Signals this ambulance was already released through on this leg.
    pub passed: Option<&'a SignalSet>,
}

/// `true` if `point` lies in front of a vehicle at `position` heading for
/// `target`.
pub(crate) fn is_ahead(position: GeoPoint, target: GeoPoint, point: GeoPoint) -> bool {
    let (hx, hy) = (target.lat - position.lat, target.lon - position.lon);
    let (px, py) = (point.lat - position.lat, point.lon - position.lon);
    hx * px + hy * py > 0.0
}

/// Index of the segment being driven.
#[inline]
fn current_segment(a: &Ambulance) -> usize {
    a.waypoint_index.saturating_sub(1)
}

/// A signal is passed once its segment is behind the ambulance, or it is on
/// the current segment and no longer in front.
pub(crate) fn is_passed(a: &Ambulance, route: &[GeoPoint], entry: &SignalOnRoute) -> bool {
    let current = current_segment(a);
    if entry.ordinal != current {
        return entry.ordinal < current;
    }
    match route.get(a.waypoint_index) {
        Some(&target) => !is_ahead(a.position, target, entry.position),
        None => true,
    }
}

// ── Smart mode ────────────────────────────────────────────────────────────────

/// Green wave.
///
/// - the first signal not yet passed is claimed GREEN;
/// - passed signals still GREEN for this ambulance start their clearance;
/// - signals further ahead that this ambulance still owns are released.
pub(crate) fn plan_smart(input: &PlanInput<'_>, board: &SignalBoard) -> Vec<SignalIntent> {
    let a = input.ambulance;
    let mut out = Vec::new();
    let mut target: Option<&SignalOnRoute> = None;

    for entry in input.signals {
        let Some(signal) = board.get(entry.signal) else {
            continue;
        };
        if is_passed(a, input.route, entry) {
            if signal.is_preempted_green_for(a.id) {
                out.push(SignalIntent::BeginClearance { signal: entry.signal });
            }
        } else if target.is_none() {
            target = Some(entry);
        } else if signal.is_owned_by(a.id) {
            out.push(SignalIntent::Release { signal: entry.signal });
        }
    }

    // Claims go last so this ambulance's own releases land first.
    if let Some(entry) = target {
        out.push(SignalIntent::Preempt {
            signal: entry.signal,
            distance_m: a.position.distance_m(entry.position),
        });
    }
    out
}

// ── Normal mode ───────────────────────────────────────────────────────────────

/// Stop and wait.
///
/// A held ambulance plans nothing.  Otherwise the nearest candidate strictly
/// within `proximity_threshold_m` is held.  Candidates are route signals the
/// ambulance has not already been released through, at most
/// `behind_tolerance` segments behind it and not behind it on the current
/// segment, and not owned by another ambulance.
pub(crate) fn plan_normal(
    input: &PlanInput<'_>,
    board: &SignalBoard,
    params: &ControllerParams,
) -> Vec<SignalIntent> {
    let a = input.ambulance;
    if input.wait.is_some() {
        return Vec::new();
    }
    let current = current_segment(a);
    let target = input.route.get(a.waypoint_index).copied();

    let nearest = input
        .signals
        .iter()
        .filter(|e| !input.passed.is_some_and(|p| p.contains(&e.signal)))
        .filter(|e| e.ordinal + params.behind_tolerance >= current)
        .filter(|e| e.ordinal != current || target.is_some_and(|t| is_ahead(a.position, t, e.position)))
        .filter(|e| board.get(e.signal).is_some_and(|s| s.preempted_by.is_none_or(|o| o == a.id)))
        .map(|e| (e, a.position.distance_m(e.position)))
        .filter(|&(_, d)| d < params.proximity_threshold_m)
        .min_by(|(x, dx), (y, dy)| dx.total_cmp(dy).then(x.ordinal.cmp(&y.ordinal)).then(x.signal.cmp(&y.signal)));

    match nearest {
        Some((entry, distance_m)) => vec![SignalIntent::Hold { signal: entry.signal, distance_m }],
        None => Vec::new(),
    }
}

/// Pick the winning ambulance among claims on one intersection: nearest
/// first, then lowest id.
pub(crate) fn arbitrate(claims: &[(AmbulanceId, f64)]) -> Option<AmbulanceId> {
    claims
        .iter()
        .min_by(|(ia, da), (ib, db)| da.total_cmp(db).then(ia.cmp(ib)))
        .map(|&(id, _)| id)
}
