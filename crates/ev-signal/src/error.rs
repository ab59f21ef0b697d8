use thiserror::Error;

use ev_core::{IntersectionId, SignalId};

#[derive(Debug, Error)]
pub enum SignalError {
    /// A signal references an intersection that is not in the road graph.
    #[error("signal {signal} references missing intersection {intersection}")]
    MissingGeometry { signal: SignalId, intersection: IntersectionId },

    /// Signal ids must be dense from 0 and unique.
    #[error("signal id {found} out of sequence: expected {expected}")]
    IdOutOfSequence { expected: SignalId, found: SignalId },

    #[error("signal parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SignalResult<T> = Result<T, SignalError>;
