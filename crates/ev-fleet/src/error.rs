use ev_core::AmbulanceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("ambulance {0} not found")]
    AmbulanceNotFound(AmbulanceId),

    #[error("ambulance {0} is already on a mission")]
    AlreadyDispatched(AmbulanceId),

    #[error("invalid speed {0} m/tick: must be positive and finite")]
    InvalidSpeed(f64),
}

pub type FleetResult<T> = Result<T, FleetError>;
