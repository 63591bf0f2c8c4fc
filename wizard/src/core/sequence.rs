//! Step sequencing state machine.

use crate::core::types::{NavState, StepStatus};

/// Ordered steps `1..=step_count` plus the visitor's position in them.
///
/// Every transition is total: out-of-range requests leave the state
/// untouched and report `false`. A sequence always has at least one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepSequence {
    step_count: u32,
    state: NavState,
}

impl StepSequence {
    /// Build a sequence from persisted state, clamping it into range.
    ///
    /// `current` is capped at `step_count` and `max_reached` is raised to at
    /// least `current`, so the invariants hold even for tampered sessions.
    pub fn new(step_count: u32, state: NavState) -> Self {
        let step_count = step_count.max(1);
        let current = state.current.min(step_count);
        let max_reached = state.max_reached.min(step_count).max(current);
        Self {
            step_count,
            state: NavState {
                current,
                max_reached,
            },
        }
    }

    /// A sequence nobody has started yet.
    pub fn not_started(step_count: u32) -> Self {
        Self::new(step_count, NavState::default())
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Current step, 1 when the sequence has not started.
    pub fn current_step(&self) -> u32 {
        self.state.current.max(1)
    }

    pub fn max_reached(&self) -> u32 {
        self.state.max_reached
    }

    /// True iff there is no step `n + 1`.
    pub fn is_last_step(&self, n: u32) -> bool {
        n >= self.step_count
    }

    /// Advance one step unless already on the last one.
    pub fn next(&mut self) -> bool {
        let current = self.current_step();
        if self.is_last_step(current) {
            return false;
        }
        self.set_current(current + 1);
        true
    }

    /// Go back one step. No-op at step 1 or before the form is started.
    pub fn previous(&mut self) -> bool {
        if self.state.current <= 1 {
            return false;
        }
        self.set_current(self.state.current - 1);
        true
    }

    /// Jump to an already reached step.
    pub fn goto(&mut self, n: u32) -> bool {
        if n < 1 || n > self.state.max_reached {
            return false;
        }
        self.set_current(n);
        true
    }

    /// Resolve a step requested by the visitor (e.g. a `step` query value).
    ///
    /// The request wins over the session only when it points at a step the
    /// visitor may already see: `1..=max(max_reached, 1)`.
    pub fn resolve_requested(&self, requested: Option<u32>) -> u32 {
        let allowed = self.state.max_reached.max(1);
        match requested {
            Some(n) if n >= 1 && n <= allowed => n,
            _ => self.current_step(),
        }
    }

    /// Highest step the visitor may navigate to (at least the current one).
    pub fn reachable(&self) -> u32 {
        self.state.max_reached.max(self.current_step())
    }

    pub fn status_of(&self, n: u32) -> StepStatus {
        let current = self.current_step();
        if n < current {
            StepStatus::Completed
        } else if n == current {
            StepStatus::Current
        } else {
            StepStatus::NotCompleted
        }
    }

    fn set_current(&mut self, n: u32) {
        self.state.current = n;
        if n > self.state.max_reached {
            self.state.max_reached = n;
        }
    }
}
