//! Controller parameters.

use crate::cycle::BackgroundPolicy;

/// How signals respond to an approaching ambulance.  Fixed for a whole run.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(rename_all = "snake_case"))]
pub enum PreemptionMode {
    /// Green wave: the next signal on the route turns GREEN ahead of the
    /// ambulance and is released after a clearance interval once passed.
    #[default]
    Smart,
    /// Stop and wait: the ambulance halts at each signal, which turns GREEN
    /// after a fixed wait.
    Normal,
}

impl PreemptionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            PreemptionMode::Smart  => "smart",
            PreemptionMode::Normal => "normal",
        }
    }
}

impl std::fmt::Display for PreemptionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serialize", serde(default))]
pub struct ControllerParams {
    pub mode: PreemptionMode,

    /// Maximum signal-to-route distance for a signal to be bound to a route.
    pub route_threshold_m: f64,

    /// Normal mode: ambulance-to-signal distance that triggers a stop.
    pub proximity_threshold_m: f64,

    /// Smart mode: GREEN held this long after the ambulance passes.
    pub clearance_delay_ms: u64,

    /// Normal mode: how long the ambulance waits at a RED signal.
    pub wait_delay_ms: u64,

    /// Normal mode: how long the signal stays GREEN after the wait.
    pub green_hold_ms: u64,

    /// Normal mode: signals whose ordinal is more than this many waypoints
    /// behind the ambulance are ignored.
    pub behind_tolerance: usize,

    pub background: BackgroundPolicy,
}

impl Default for ControllerParams {
    fn default() -> Self {
        Self {
            mode:                  PreemptionMode::Smart,
            route_threshold_m:     50.0,
            proximity_threshold_m: 50.0,
            clearance_delay_ms:    3_000,
            wait_delay_ms:         5_000,
            green_hold_ms:         5_000,
            behind_tolerance:      5,
            background:            BackgroundPolicy::AllRed,
        }
    }
}

impl ControllerParams {
    pub fn smart() -> Self {
        Self { mode: PreemptionMode::Smart, ..Self::default() }
    }

    pub fn normal() -> Self {
        Self { mode: PreemptionMode::Normal, ..Self::default() }
    }

    pub fn with_background(mut self, background: BackgroundPolicy) -> Self {
        self.background = background;
        self
    }

    /// Human-readable description of the first invalid field, if any.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.route_threshold_m > 0.0) {
            return Err(format!("route_threshold_m must be > 0, got {}", self.route_threshold_m));
        }
        if !(self.proximity_threshold_m > 0.0) {
            return Err(format!("proximity_threshold_m must be > 0, got {}", self.proximity_threshold_m));
        }
        if let BackgroundPolicy::Cycle { green_ms, yellow_ms, red_ms } = self.background {
            if green_ms == 0 || yellow_ms == 0 || red_ms == 0 {
                return Err("background cycle durations must be > 0".into());
            }
        }
        Ok(())
    }
}
