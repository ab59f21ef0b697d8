//! Plain data row types written by output backends.

/// One signal's state at a snapshot tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalStateRow {
    pub tick:            u64,
    pub signal_id:       u32,
    pub intersection_id: u32,
    pub phase:           &'static str,
    pub mode:            &'static str,
    /// Owning ambulance; `u32::MAX` when the signal is not preempted.
    pub preempted_by:    u32,
    pub countdown_secs:  u32,
}

/// One ambulance's position and mission state at a snapshot tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbulanceTrackRow {
    pub tick:           u64,
    pub ambulance_id:   u32,
    pub lat:            f64,
    pub lon:            f64,
    pub phase:          &'static str,
    pub status:         &'static str,
    pub waypoint_index: u32,
}

/// One entry of the event log.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub tick:         u64,
    pub kind:         &'static str,
    /// `u32::MAX` when the event concerns no ambulance.
    pub ambulance_id: u32,
    /// `u32::MAX` when the event concerns no signal.
    pub signal_id:    u32,
    pub message:      String,
}
