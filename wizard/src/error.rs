//! Errors surfaced by form operations.

use thiserror::Error;

/// A submission was rejected. The message is meant for the visitor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
    /// Fields the message refers to, if any.
    pub fields: Vec<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn for_fields(message: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            message: message.into(),
            fields,
        }
    }
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form definition is invalid: {0}")]
    InvalidDefinition(String),
    #[error("step {step} does not exist (form has {step_count} steps)")]
    UnknownStep { step: u32, step_count: u32 },
    #[error("form '{form}' reached its last step but has no completion handler")]
    MissingCompletionHandler { form: String },
    #[error("session persistence failed: {0:#}")]
    Persistence(#[source] anyhow::Error),
    #[error("completion handler failed: {0:#}")]
    Completion(#[source] anyhow::Error),
}
