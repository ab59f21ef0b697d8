//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `signal_states.csv`
//! - `ambulance_tracks.csv`
//! - `events.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::{AmbulanceTrackRow, EventRow, OutputResult, SignalStateRow};
use crate::writer::OutputWriter;

pub const SIGNAL_STATES_FILE: &str = "signal_states.csv";
pub const AMBULANCE_TRACKS_FILE: &str = "ambulance_tracks.csv";
pub const EVENTS_FILE: &str = "events.csv";

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    signals:  Writer<File>,
    tracks:   Writer<File>,
    events:   Writer<File>,
    finished: bool,
}

impl CsvWriter {
    /// Open (or create) the CSV files in `dir` and write the header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut signals = Writer::from_path(dir.join(SIGNAL_STATES_FILE))?;
        signals.write_record([
            "tick", "signal_id", "intersection_id", "phase", "mode", "preempted_by", "countdown_secs",
        ])?;

        let mut tracks = Writer::from_path(dir.join(AMBULANCE_TRACKS_FILE))?;
        tracks.write_record(["tick", "ambulance_id", "lat", "lon", "phase", "status", "waypoint_index"])?;

        let mut events = Writer::from_path(dir.join(EVENTS_FILE))?;
        events.write_record(["tick", "kind", "ambulance_id", "signal_id", "message"])?;

        log::debug!("CSV output opened in {}", dir.display());
        Ok(Self { signals, tracks, events, finished: false })
    }
}

/// Blank for the `u32::MAX` "none" marker.
fn opt_id(id: u32) -> String {
    if id == u32::MAX { String::new() } else { id.to_string() }
}

impl OutputWriter for CsvWriter {
    fn write_signal_states(&mut self, rows: &[SignalStateRow]) -> OutputResult<()> {
        for row in rows {
            self.signals.write_record(&[
                row.tick.to_string(),
                row.signal_id.to_string(),
                row.intersection_id.to_string(),
                row.phase.to_owned(),
                row.mode.to_owned(),
                opt_id(row.preempted_by),
                row.countdown_secs.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tracks(&mut self, rows: &[AmbulanceTrackRow]) -> OutputResult<()> {
        for row in rows {
            self.tracks.write_record(&[
                row.tick.to_string(),
                row.ambulance_id.to_string(),
                format!("{:.6}", row.lat),
                format!("{:.6}", row.lon),
                row.phase.to_owned(),
                row.status.to_owned(),
                row.waypoint_index.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_event(&mut self, row: &EventRow) -> OutputResult<()> {
        self.events.write_record(&[
            row.tick.to_string(),
            row.kind.to_owned(),
            opt_id(row.ambulance_id),
            opt_id(row.signal_id),
            row.message.clone(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.signals.flush()?;
        self.tracks.flush()?;
        self.events.flush()?;
        Ok(())
    }
}
