//! `ev-output`: simulation output writers.
//!
//! | Backend | Files created                                               |
//! |---------|-------------------------------------------------------------|
//! | CSV     | `signal_states.csv`, `ambulance_tracks.csv`, `events.csv`   |
//!
//! Backends implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `ev_sim::SimObserver`.
//! Snapshot rows follow `config.output_interval_ticks`; every event is
//! written.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ev_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer);
//! sim.run(&mut obs);
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{AmbulanceTrackRow, EventRow, SignalStateRow};
pub use writer::OutputWriter;
