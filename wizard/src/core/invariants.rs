//! Invariants of persisted navigation state.
//!
//! Session contents are untrusted: they may be stale (the form lost a step)
//! or tampered with. [`StepSequence::new`](crate::core::sequence::StepSequence::new)
//! repairs violations; this module reports them so callers can log.

use crate::core::types::NavState;

/// Check navigation state against a form with `step_count` steps:
/// - `current <= step_count`
/// - `max_reached <= step_count`
/// - `max_reached >= current`
pub fn validate_nav_state(state: &NavState, step_count: u32) -> Vec<String> {
    let mut errors = Vec::new();
    if state.current > step_count {
        errors.push(format!(
            "current step {} exceeds step count {}",
            state.current, step_count
        ));
    }
    if state.max_reached > step_count {
        errors.push(format!(
            "max step {} exceeds step count {}",
            state.max_reached, step_count
        ));
    }
    if state.max_reached < state.current {
        errors.push(format!(
            "max step {} is below current step {}",
            state.max_reached, state.current
        ));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_states_report_nothing() {
        assert!(validate_nav_state(&NavState::default(), 3).is_empty());
        assert!(validate_nav_state(&NavState::new(2, 3), 3).is_empty());
    }

    #[test]
    fn reports_every_violation() {
        let errors = validate_nav_state(&NavState::new(5, 4), 3);
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.contains("below current")));
    }
}
