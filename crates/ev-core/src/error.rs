//! Errors raised by the core types themselves.
//!
//! Sub-crates keep their own error enums; `ev-sim` wraps `EvError` for
//! configuration that fails [`SimConfig::validate`](crate::SimConfig::validate).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvError {
    #[error("tick_duration_ms must be in 1..={max}, got {got}")]
    TickDurationOutOfRange { got: u32, max: u32 },

    #[error("invalid approach {0:?}")]
    UnknownApproach(String),
}

pub type EvResult<T> = Result<T, EvError>;
