//! Ambulance mission phase and dispatch status.

/// Which leg of its mission an ambulance is driving.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AmbulancePhase {
    /// Not on a mission (initial state, after delivery, or when unroutable).
    #[default]
    Idle,
    /// Driving from the station to the patient.
    ToPatient,
    /// Driving the patient to the hospital.
    ToHospital,
}

impl AmbulancePhase {
    /// `true` while the ambulance is driving a mission leg.
    #[inline]
    pub fn is_driving(self) -> bool {
        !matches!(self, AmbulancePhase::Idle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AmbulancePhase::Idle       => "idle",
            AmbulancePhase::ToPatient  => "to_patient",
            AmbulancePhase::ToHospital => "to_hospital",
        }
    }
}

impl std::fmt::Display for AmbulancePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dispatch status as shown to the outside world.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AmbulanceStatus {
    #[default]
    Idle,
    /// Heading to the patient.
    Responding,
    /// Carrying the patient to hospital.
    Transporting,
}

impl AmbulanceStatus {
    /// `true` for statuses that make the ambulance eligible for preemption.
    #[inline]
    pub fn is_active(self) -> bool {
        !matches!(self, AmbulanceStatus::Idle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AmbulanceStatus::Idle         => "idle",
            AmbulanceStatus::Responding   => "responding",
            AmbulanceStatus::Transporting => "transporting",
        }
    }
}

impl std::fmt::Display for AmbulanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
