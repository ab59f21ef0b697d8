//! The `OutputWriter` trait implemented by backend writers.

use crate::{AmbulanceTrackRow, EventRow, OutputResult, SignalStateRow};

/// Sink for snapshot and event rows.
///
/// Errors are returned to [`SimOutputObserver`](crate::SimOutputObserver),
/// which keeps the first one for [`take_error`](crate::SimOutputObserver::take_error).
pub trait OutputWriter {
    /// Write every signal of one snapshot.
    fn write_signal_states(&mut self, rows: &[SignalStateRow]) -> OutputResult<()>;

    /// Write every ambulance of one snapshot.
    fn write_tracks(&mut self, rows: &[AmbulanceTrackRow]) -> OutputResult<()>;

    fn write_event(&mut self, row: &EventRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent: safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}
