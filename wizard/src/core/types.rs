//! Shared deterministic types for form core logic.
//!
//! These types define stable contracts between core components and the
//! session layer. They must not depend on external state or I/O.

use serde::{Deserialize, Serialize};

use crate::core::fields::FieldData;

/// Persisted navigation state for one form in one session.
///
/// `current == 0` means the visitor has not started the form yet; the
/// effective step in that case is 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavState {
    /// Step the visitor is on (0 = not started).
    pub current: u32,
    /// Highest step the visitor has reached (0 = not started).
    pub max_reached: u32,
}

impl NavState {
    pub fn new(current: u32, max_reached: u32) -> Self {
        Self {
            current,
            max_reached,
        }
    }
}

/// Position of a step relative to the visitor's current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Before the current step.
    Completed,
    /// The current step.
    Current,
    /// After the current step.
    NotCompleted,
}

/// Validated data submitted for a single step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-indexed step number.
    pub step: u32,
    pub fields: FieldData,
}

/// The most recent submission that failed validation.
///
/// Only one exists per form and session. It is kept so the step can be
/// redisplayed with what the visitor typed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingSubmission {
    /// Step the submission was made on.
    pub step: u32,
    pub fields: FieldData,
}
