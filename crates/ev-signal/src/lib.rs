//! `ev-signal`: traffic-signal state and the preemption controller.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`signal`]     | `Signal`, `LightPhase`, `SignalMode`: per-signal state machine |
//! | [`cycle`]      | `BackgroundPolicy`, `IntersectionCycle`                    |
//! | [`board`]      | `SignalBoard`: every signal plus per-intersection rules    |
//! | [`timer`]      | `TimerQueue`, `TimerEvent`, `TimerKind`, `TimerKey`        |
//! | [`params`]     | `ControllerParams`, `PreemptionMode`                       |
//! | [`controller`] | `SignalController`: transitions with deferred timers       |
//! | [`loader`]     | `load_signals_csv`, `signals_at`, `signals_per_approach`   |
//! | [`error`]      | `SignalError`, `SignalResult<T>`                           |
//!
//! # Timers
//!
//! Every deferred transition (clearance, normal-mode wait, green hold) is a
//! [`TimerEvent`] in a tick-keyed queue, tagged with the controller epoch and
//! the generation of the signal it was scheduled against.  A reset bumps the
//! epoch; every preempt/hold/grant/release bumps the signal's generation.
//! Events whose tags no longer match are reported as stale and never applied.

pub mod board;
pub mod controller;
pub mod cycle;
pub mod error;
pub mod loader;
pub mod params;
pub mod signal;
pub mod timer;


pub use board::SignalBoard;
pub use controller::{FireOutcome, SignalController, StaleReason};
pub use cycle::{BackgroundPolicy, IntersectionCycle};
pub use error::{SignalError, SignalResult};
pub use loader::{load_signals_csv, load_signals_reader, signals_at, signals_per_approach};
pub use params::{ControllerParams, PreemptionMode};
pub use signal::{LightPhase, Signal, SignalMode};
pub use timer::{TimerEvent, TimerKey, TimerKind, TimerQueue};
