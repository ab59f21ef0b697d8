//! `TimerQueue`: deferred signal transitions keyed by due tick.
//!
//! Timers are plain data.  Nothing captures signal state; when an event is
//! delivered the controller re-reads the signal and compares the event's
//! epoch and generation tags before applying anything.

use std::collections::BTreeMap;

use ev_core::{AmbulanceId, SignalId, Tick};

/// Which deferred transition a timer drives.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum TimerKind {
    /// Smart mode: clearance interval after passing ended, release to RED.
    ClearanceElapsed,
    /// Normal mode: stop finished, held RED → GREEN.
    WaitElapsed,
    /// Normal mode: green hold finished, release to RED.
    GreenHoldElapsed,
}

impl TimerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TimerKind::ClearanceElapsed => "clearance_elapsed",
            TimerKind::WaitElapsed      => "wait_elapsed",
            TimerKind::GreenHoldElapsed => "green_hold_elapsed",
        }
    }
}

/// Cancellation key for pending timers.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct TimerKey {
    pub ambulance: AmbulanceId,
    pub signal: SignalId,
}

impl TimerKey {
    pub fn new(ambulance: AmbulanceId, signal: SignalId) -> Self {
        Self { ambulance, signal }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct TimerEvent {
    pub due: Tick,
    pub key: TimerKey,
    pub kind: TimerKind,
    /// Controller epoch at scheduling time.
    pub epoch: u64,
    /// Signal generation right after the transition that scheduled it.
    pub generation: u64,
}

/// Pending timers grouped by due tick.
#[derive(Default)]
pub struct TimerQueue {
    inner: BTreeMap<Tick, Vec<TimerEvent>>,
    total: usize,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TimerEvent) {
        self.inner.entry(event.due).or_default().push(event);
        self.total += 1;
    }

    /// Remove and return every event due at or before `now`, earliest first.
    /// Events due on the same tick keep their scheduling order.
    pub fn drain_due(&mut self, now: Tick) -> Vec<TimerEvent> {
        let later = self.inner.split_off(&(now + 1));
        let due = std::mem::replace(&mut self.inner, later);
        let out: Vec<TimerEvent> = due.into_values().flatten().collect();
        self.total -= out.len();
        out
    }

    /// Drop pending events for `key`.  Returns how many were dropped.
    pub fn cancel(&mut self, key: TimerKey) -> usize {
        let mut dropped = 0;
        self.inner.retain(|_, events| {
            let before = events.len();
            events.retain(|e| e.key != key);
            dropped += before - events.len();
            !events.is_empty()
        });
        self.total -= dropped;
        dropped
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.inner.clear();
        self.total = 0;
    }

    /// Pending events in due order.
    pub fn iter(&self) -> impl Iterator<Item = &TimerEvent> {
        self.inner.values().flatten()
    }

    /// The earliest tick with a pending event.
    pub fn next_tick(&self) -> Option<Tick> {
        self.inner.keys().next().copied()
    }

    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
