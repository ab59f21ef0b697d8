//! `ev-sim`: tick loop and traffic coordination for emergency preemption.
//!
//! # Tick loop
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   ① Timers      deliver clearance, green-hold and wait timers due now.
//!                 Timers from before a reset come back stale and are
//!                 discarded.
//!   ② Dispatch    plan station → patient → hospital for ambulances due
//!                 now and resolve the signals along both legs.
//!   ③ Preemption  plan intents per ambulance (parallel with `parallel`),
//!                 resolve contention per intersection (nearest wins),
//!                 then apply in ascending ambulance id order.
//!   ④ Background  advance the cycle of idle intersections.
//!   ⑤ Ambulances  move everything active and not held at a signal.
//!   ⑥ Civilians   pull over, stop at RED, or drive on.
//!   ⑦ Observers   events, then a snapshot every output interval.
//! ```
//!
//! # Modes
//!
//! | Mode     | Behaviour                                                   |
//! |----------|-------------------------------------------------------------|
//! | `Smart`  | Green wave: the next signal on route turns GREEN, passed    |
//! |          | signals clear back to RED, nothing ahead is held.           |
//! | `Normal` | Stop and wait: the ambulance halts near a signal, holds it  |
//! |          | GREEN for the wait, then drives on.                         |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the planning phase on Rayon's thread pool.        |
//! | `fx-hash`  | Uses `FxHashMap`/`FxHashSet` for coordinator state.    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ev_core::{SimConfig, Tick};
//! use ev_fleet::Mission;
//! use ev_signal::ControllerParams;
//! use ev_sim::{EventLog, SimBuilder};
//! use ev_spatial::AStarPlanner;
//!
//! let mut sim = SimBuilder::new(SimConfig::default(), graph, AStarPlanner)
//!     .params(ControllerParams::smart())
//!     .signals(signals)
//!     .ambulance(Mission { station, patient, hospital, dispatch_tick: Tick(0) }, 15.0)
//!     .build()?;
//! let mut log = EventLog::new();
//! sim.run_until_idle(10_000, &mut log);
//! ```

pub mod builder;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod intent;
pub mod observer;
mod policy;
pub mod sim;


pub use builder::SimBuilder;
pub use coordinator::{RouteKey, RouteSignalTable, TrafficCoordinator, WaitRecord};
pub use error::{SimError, SimResult};
pub use event::SimEvent;
pub use intent::SignalIntent;
pub use observer::{EventLog, NoopObserver, SimObserver};
pub use sim::Sim;
