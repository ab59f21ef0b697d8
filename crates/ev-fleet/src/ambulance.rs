//! Per-ambulance state and position integration.

use ev_core::{AmbulanceId, AmbulancePhase, AmbulanceStatus, GeoPoint};

/// Result of one [`Ambulance::advance`] call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Advance {
    pub position: GeoPoint,
    /// `true` if the ambulance is now exactly on its target waypoint.
    pub reached: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ambulance {
    pub id: AmbulanceId,
    pub position: GeoPoint,
    /// Index of the waypoint the ambulance is driving towards on its active
    /// leg.  The segment being driven is `waypoint_index - 1`.
    pub waypoint_index: usize,
    pub phase: AmbulancePhase,
    pub status: AmbulanceStatus,
    /// Metres covered per tick.
    pub speed_m_per_tick: f64,
    /// Where the ambulance returns on reset.
    pub home: GeoPoint,
}

impl Ambulance {
    pub fn new(id: AmbulanceId, home: GeoPoint, speed_m_per_tick: f64) -> Self {
        Self {
            id,
            position: home,
            waypoint_index: 0,
            phase: AmbulancePhase::Idle,
            status: AmbulanceStatus::Idle,
            speed_m_per_tick,
            home,
        }
    }

    /// Move towards `waypoints[waypoint_index]` by at most one tick's
    /// distance.  The waypoint index is left for the caller to advance.
    ///
    /// With no target (index past the end) the position is unchanged.
    pub fn advance(&mut self, waypoints: &[GeoPoint]) -> Advance {
        let Some(&target) = waypoints.get(self.waypoint_index) else {
            return Advance { position: self.position, reached: false };
        };
        let (position, reached) = self.position.move_towards(target, self.speed_m_per_tick);
        self.position = position;
        Advance { position, reached }
    }

    /// Distance to `point` in metres.
    #[inline]
    pub fn distance_to(&self, point: GeoPoint) -> f64 {
        self.position.distance_m(point)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub(crate) fn go_home(&mut self) {
        self.position = self.home;
        self.waypoint_index = 0;
        self.phase = AmbulancePhase::Idle;
        self.status = AmbulanceStatus::Idle;
    }
}
