//! Simulation observer trait for progress reporting and data collection.

use ev_core::Tick;
use ev_fleet::Fleet;
use ev_signal::SignalBoard;

use crate::event::SimEvent;

/// Callbacks invoked by [`Sim`](crate::Sim) at key points in the tick loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: print the event log
///
/// ```rust,ignore
/// struct Printer;
///
/// impl SimObserver for Printer {
///     fn on_event(&mut self, event: &SimEvent) {
///         println!("{event}");
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called once per event, in the order the events happened, after every
    /// signal write of the tick.
    fn on_event(&mut self, _event: &SimEvent) {}

    /// Called at the end of each tick with the number of events it produced.
    fn on_tick_end(&mut self, _tick: Tick, _events: usize) {}

    /// Called every `config.output_interval_ticks` ticks with read-only
    /// access to every signal and ambulance.
    fn on_snapshot(&mut self, _tick: Tick, _board: &SignalBoard, _fleet: &Fleet) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

/// Collects every event.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Human-readable lines, one per event.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(ToString::to_string).collect()
    }

    /// Events whose [`SimEvent::kind`] is `kind`.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a SimEvent> + 'a {
        self.events.iter().filter(move |e| e.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl SimObserver for EventLog {
    fn on_event(&mut self, event: &SimEvent) {
        self.events.push(event.clone());
    }
}
