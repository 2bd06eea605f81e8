//! Cancellation controller for the single in-flight chat turn.
//!
//! A chat surface has at most one turn in flight. Starting a turn cancels
//! whatever was running, and `stop()` cancels without starting anything.
//! Each turn gets a generation number so a superseded turn settling late
//! cannot clear the handle of the turn that replaced it.

use std::sync::{Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::domain::foundation::StateMachine;

/// Lifecycle of the relay's in-flight slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayPhase {
    /// No turn running.
    Idle,
    /// A turn owns the slot.
    Streaming,
    /// A cancelled turn has not settled yet and nothing replaced it.
    Cancelling,
}

impl StateMachine for RelayPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use RelayPhase::*;
        matches!(
            (self, target),
            (Idle, Streaming)
                | (Streaming, Idle)
                | (Streaming, Cancelling)
                | (Cancelling, Streaming)
                | (Cancelling, Idle)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use RelayPhase::*;
        match self {
            Idle => vec![Streaming],
            Streaming => vec![Idle, Cancelling],
            Cancelling => vec![Streaming, Idle],
        }
    }
}

/// Token and identity of one turn.
#[derive(Debug, Clone)]
pub struct TurnHandle {
    generation: u64,
    token: CancellationToken,
}

impl TurnHandle {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token raced against every suspension point of the turn.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[derive(Debug)]
struct ControllerState {
    phase: RelayPhase,
    in_flight: Option<TurnHandle>,
    /// Cancelled turns that have not called `finish` yet.
    draining: usize,
    next_generation: u64,
}

impl ControllerState {
    fn cancel_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(turn) => {
                turn.token.cancel();
                self.draining += 1;
                tracing::debug!(generation = turn.generation, "Cancelled in-flight turn");
                true
            }
            None => false,
        }
    }

    fn sync_phase(&mut self) {
        let next = if self.in_flight.is_some() {
            RelayPhase::Streaming
        } else if self.draining > 0 {
            RelayPhase::Cancelling
        } else {
            RelayPhase::Idle
        };
        if next == self.phase {
            return;
        }
        match self.phase.transition_to(next) {
            Ok(phase) => self.phase = phase,
            Err(e) => {
                tracing::error!(error = %e, "Relay phase out of sync");
                self.phase = next;
            }
        }
    }
}

/// Owns the in-flight handle of one chat surface.
#[derive(Debug)]
pub struct CancellationController {
    state: Mutex<ControllerState>,
}

impl Default for CancellationController {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ControllerState {
                phase: RelayPhase::Idle,
                in_flight: None,
                draining: 0,
                next_generation: 1,
            }),
        }
    }

    /// Cancels any running turn and installs a fresh one.
    ///
    /// Both happen under one lock, so two concurrent `begin` calls can never
    /// leave two live turns.
    pub fn begin(&self) -> TurnHandle {
        let mut state = self.lock();
        state.cancel_in_flight();

        let turn = TurnHandle {
            generation: state.next_generation,
            token: CancellationToken::new(),
        };
        state.next_generation += 1;
        state.in_flight = Some(turn.clone());
        state.sync_phase();
        turn
    }

    /// Cancels the running turn, if any. Idempotent.
    ///
    /// Returns true if a turn was cancelled.
    pub fn stop(&self) -> bool {
        let mut state = self.lock();
        let cancelled = state.cancel_in_flight();
        state.sync_phase();
        cancelled
    }

    /// Marks a turn as settled.
    ///
    /// Clears the handle only if it still belongs to `turn`.
    pub fn finish(&self, turn: &TurnHandle) {
        let mut state = self.lock();
        let owns_slot = state
            .in_flight
            .as_ref()
            .is_some_and(|current| current.generation == turn.generation);
        if owns_slot {
            state.in_flight = None;
        } else {
            state.draining = state.draining.saturating_sub(1);
        }
        state.sync_phase();
    }

    /// True while a turn owns the slot.
    pub fn is_streaming(&self) -> bool {
        self.lock().in_flight.is_some()
    }

    pub fn phase(&self) -> RelayPhase {
        self.lock().phase
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
