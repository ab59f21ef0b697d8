//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use ev_core::Tick;
use ev_fleet::Fleet;
use ev_signal::SignalBoard;
use ev_sim::{SimEvent, SimObserver};

use crate::row::{AmbulanceTrackRow, EventRow, SignalStateRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes signal states, ambulance tracks and the
/// event log to any [`OutputWriter`] backend.
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After the run returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:     W,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, last_error: None }
    }

    /// Take the stored write error (if any) after the run returns.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer (e.g. to inspect files after the sim).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                log::error!("output write failed: {e}");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_event(&mut self, event: &SimEvent) {
        let row = EventRow {
            tick:         event.tick().0,
            kind:         event.kind(),
            ambulance_id: event.ambulance().map_or(u32::MAX, |a| a.0),
            signal_id:    event.signal().map_or(u32::MAX, |s| s.0),
            message:      event.to_string(),
        };
        let result = self.writer.write_event(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, tick: Tick, board: &SignalBoard, fleet: &Fleet) {
        let signals: Vec<SignalStateRow> = board
            .iter()
            .map(|s| SignalStateRow {
                tick:            tick.0,
                signal_id:       s.id.0,
                intersection_id: s.intersection.0,
                phase:           s.phase.as_str(),
                mode:            s.mode.as_str(),
                preempted_by:    s.preempted_by.map_or(u32::MAX, |a| a.0),
                countdown_secs:  s.countdown_secs,
            })
            .collect();
        if !signals.is_empty() {
            let result = self.writer.write_signal_states(&signals);
            self.store_err(result);
        }

        let tracks: Vec<AmbulanceTrackRow> = fleet
            .iter()
            .map(|a| AmbulanceTrackRow {
                tick:           tick.0,
                ambulance_id:   a.id.0,
                lat:            a.position.lat,
                lon:            a.position.lon,
                phase:          a.phase.as_str(),
                status:         a.status.as_str(),
                waypoint_index: a.waypoint_index as u32,
            })
            .collect();
        if !tracks.is_empty() {
            let result = self.writer.write_tracks(&tracks);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
