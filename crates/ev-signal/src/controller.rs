//! `SignalController`: the preemption state machine applied to the board,
//! with its deferred transitions.
//!
//! The controller never decides *which* signal an ambulance should act on;
//! that is the coordinator's job.  It applies one transition at a time,
//! enforces ownership, and schedules the self-release timers that follow.
//!
//! | Transition        | From                       | To                              | Timer scheduled        |
//! |-------------------|----------------------------|---------------------------------|------------------------|
//! | `preempt`         | any                        | GREEN, EMERGENCY                | none                   |
//! | `begin_clearance` | GREEN, EMERGENCY (owner)   | GREEN, ENDING_EMERGENCY         | `ClearanceElapsed`     |
//! | `hold`            | not owned by another       | RED, EMERGENCY                  | `WaitElapsed`          |
//! | *WaitElapsed*     | RED, EMERGENCY (owner)     | GREEN, EMERGENCY                | `GreenHoldElapsed`     |
//! | `release` / *ClearanceElapsed* / *GreenHoldElapsed* | owned | RED, NORMAL          | none                   |

use ev_core::{AmbulanceId, SignalId, SimClock, Tick};

use crate::board::SignalBoard;
use crate::params::{ControllerParams, PreemptionMode};
use crate::signal::Signal;
use crate::timer::{TimerEvent, TimerKey, TimerKind, TimerQueue};
use crate::SignalResult;

// ── Fire outcomes ─────────────────────────────────────────────────────────────

/// Why a delivered timer was not applied.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum StaleReason {
    /// Scheduled before the last reset.
    Epoch,
    /// The signal changed hands or state after scheduling.
    Generation,
    UnknownSignal,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FireOutcome {
    Applied(TimerEvent),
    Stale { event: TimerEvent, reason: StaleReason },
}

impl FireOutcome {
    pub fn event(&self) -> &TimerEvent {
        match self {
            FireOutcome::Applied(e) | FireOutcome::Stale { event: e, .. } => e,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, FireOutcome::Applied(_))
    }
}

// ── SignalController ──────────────────────────────────────────────────────────

pub struct SignalController {
    params: ControllerParams,
    board: SignalBoard,
    timers: TimerQueue,
    epoch: u64,
}

impl SignalController {
    /// Build a controller over `signals` (ids dense from 0) at the background
    /// baseline as of `clock`.
    pub fn new(signals: Vec<Signal>, params: ControllerParams, clock: &SimClock) -> SignalResult<Self> {
        let mut board = SignalBoard::new(signals, params.background)?;
        board.reset(clock);
        Ok(Self { params, board, timers: TimerQueue::new(), epoch: 0 })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn params(&self) -> &ControllerParams {
        &self.params
    }

    pub fn mode(&self) -> PreemptionMode {
        self.params.mode
    }

    pub fn board(&self) -> &SignalBoard {
        &self.board
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Incremented by every [`reset`](Self::reset).
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Turn `signal` GREEN for `ambulance`, taking it from any previous
    /// owner.  Returns `false` if it was already GREEN for this ambulance.
    pub fn preempt(&mut self, ambulance: AmbulanceId, signal: SignalId) -> bool {
        match self.board.get(signal) {
            None => return false,
            Some(s) if s.is_preempted_green_for(ambulance) => return false,
            Some(s) => {
                if let Some(prev) = s.preempted_by.filter(|&p| p != ambulance) {
                    log::info!("{signal} preemption moves from {prev} to {ambulance}");
                }
            }
        }
        self.timers.cancel(TimerKey::new(ambulance, signal));
        self.board.preempt(signal, ambulance);
        log::debug!("{signal} GREEN for {ambulance}");
        true
    }

    /// Start the clearance interval on a signal `ambulance` has passed.
    pub fn begin_clearance(&mut self, ambulance: AmbulanceId, signal: SignalId, clock: &SimClock) -> bool {
        if !self.board.get(signal).is_some_and(|s| s.is_preempted_green_for(ambulance)) {
            return false;
        }
        let due = self.due(self.params.clearance_delay_ms, clock);
        self.board.begin_clearance(signal, due);
        self.schedule(ambulance, signal, TimerKind::ClearanceElapsed, due);
        log::debug!("{signal} clearance for {ambulance} until {due}");
        true
    }

    /// Normal-mode stop: hold `signal` RED while `ambulance` waits.  Fails if
    /// another ambulance owns it or this ambulance already does.
    pub fn hold(&mut self, ambulance: AmbulanceId, signal: SignalId, clock: &SimClock) -> bool {
        if !self.board.get(signal).is_some_and(|s| s.preempted_by.is_none()) {
            return false;
        }
        let due = self.due(self.params.wait_delay_ms, clock);
        self.board.hold(signal, ambulance, due);
        self.schedule(ambulance, signal, TimerKind::WaitElapsed, due);
        log::debug!("{signal} held RED for {ambulance} until {due}");
        true
    }

    /// Release a signal owned by `ambulance` immediately and drop its timers.
    pub fn release(&mut self, ambulance: AmbulanceId, signal: SignalId) -> bool {
        if !self.board.get(signal).is_some_and(|s| s.is_owned_by(ambulance)) {
            return false;
        }
        self.timers.cancel(TimerKey::new(ambulance, signal));
        self.board.release(signal);
        log::debug!("{signal} released by {ambulance}");
        true
    }

    // ── Timers ────────────────────────────────────────────────────────────

    fn due(&self, delay_ms: u64, clock: &SimClock) -> Tick {
        clock.current_tick + clock.ticks_for_ms(delay_ms).max(1)
    }

    fn schedule(&mut self, ambulance: AmbulanceId, signal: SignalId, kind: TimerKind, due: Tick) {
        let generation = self.board.get(signal).map_or(0, |s| s.generation);
        self.timers.push(TimerEvent {
            due,
            key: TimerKey::new(ambulance, signal),
            kind,
            epoch: self.epoch,
            generation,
        });
    }

    /// Deliver one timer event.  Stale events are logged and leave every
    /// signal untouched.
    pub fn fire(&mut self, event: TimerEvent, clock: &SimClock) -> FireOutcome {
        let TimerKey { ambulance, signal } = event.key;
        let stale = |reason: StaleReason| {
            log::debug!("stale {} for {signal}/{ambulance} ignored: {reason:?}", event.kind.as_str());
            FireOutcome::Stale { event, reason }
        };

        if event.epoch != self.epoch {
            return stale(StaleReason::Epoch);
        }
        let Some(s) = self.board.get(signal) else {
            return stale(StaleReason::UnknownSignal);
        };
        if s.generation != event.generation || !s.is_owned_by(ambulance) {
            return stale(StaleReason::Generation);
        }

        match event.kind {
            TimerKind::ClearanceElapsed | TimerKind::GreenHoldElapsed => {
                self.board.release(signal);
                log::debug!("{signal} back to RED after {}", event.kind.as_str());
            }
            TimerKind::WaitElapsed => {
                let due = self.due(self.params.green_hold_ms, clock);
                self.board.grant(signal, due);
                self.schedule(ambulance, signal, TimerKind::GreenHoldElapsed, due);
                log::debug!("{signal} GREEN for waiting {ambulance} until {due}");
            }
        }
        FireOutcome::Applied(event)
    }

    /// Deliver every timer due at or before the current tick.
    pub fn fire_due(&mut self, clock: &SimClock) -> Vec<FireOutcome> {
        let mut out = Vec::new();
        // A timer fired now may schedule another; delays are at least one
        // tick, so a single drain suffices.
        for event in self.timers.drain_due(clock.current_tick) {
            out.push(self.fire(event, clock));
        }
        out
    }

    // ── Per-tick housekeeping ─────────────────────────────────────────────

    pub fn step_background(&mut self, clock: &SimClock) {
        self.board.step_background(clock);
    }

    pub fn refresh_countdowns(&mut self, clock: &SimClock) {
        self.board.refresh_countdowns(clock);
    }

    /// Cancel every pending timer, start a new epoch, and return all signals
    /// to the background baseline.
    pub fn reset(&mut self, clock: &SimClock) {
        let dropped = self.timers.len();
        self.timers.clear();
        self.epoch += 1;
        self.board.reset(clock);
        log::info!("signal controller reset: epoch {}, {dropped} pending timers cancelled", self.epoch);
    }
}
