use ev_core::EvError;
use ev_fleet::FleetError;
use ev_signal::SignalError;
use ev_spatial::SpatialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] EvError),

    #[error(transparent)]
    Spatial(#[from] SpatialError),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error(transparent)]
    Fleet(#[from] FleetError),
}

pub type SimResult<T> = Result<T, SimError>;
