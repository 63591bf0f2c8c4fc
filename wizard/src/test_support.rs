//! Test-only fixtures: sample steps, forms and sessions.

use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use serde_json::{Value, json};

use crate::core::fields::{Field, FieldData, FieldKind};
use crate::error::ValidationError;
use crate::form::{CompletionHandler, FormStep, MultiStepForm, Submission};
use crate::io::config::WizardConfig;
use crate::io::session::{MemorySession, SessionStore};

/// Step 1 of the sample signup form: a required name.
pub struct NameStep;

impl FormStep for NameStep {
    fn title(&self) -> &str {
        "About you"
    }

    fn build_fields(&self) -> Vec<Field> {
        vec![Field::text("name", "Name").required()]
    }
}

/// Step 2: an email checked by JSON Schema.
pub struct ContactStep;

impl FormStep for ContactStep {
    fn title(&self) -> &str {
        "Contact"
    }

    fn build_fields(&self) -> Vec<Field> {
        vec![Field::email("email", "Email").required()]
    }

    fn schema(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "email": { "type": "string", "pattern": "^[^@\\s]+@[^@\\s]+$" }
            }
        }))
    }
}

/// Step 3: terms must be accepted.
pub struct ConfirmStep;

impl FormStep for ConfirmStep {
    fn title(&self) -> &str {
        "Confirm"
    }

    fn build_fields(&self) -> Vec<Field> {
        vec![Field::new("accept", "I accept the terms", FieldKind::Checkbox).required()]
    }

    fn validate_data(&self, data: &FieldData) -> Result<(), ValidationError> {
        if data.get("accept") == Some(&Value::Bool(true)) {
            return Ok(());
        }
        Err(ValidationError::for_fields(
            "You must accept the terms",
            vec!["accept".to_string()],
        ))
    }
}

/// Uppercases every string value it stores.
pub struct UppercaseStep;

impl FormStep for UppercaseStep {
    fn title(&self) -> &str {
        "Shout"
    }

    fn build_fields(&self) -> Vec<Field> {
        vec![Field::text("word", "Word").required()]
    }

    fn process_data(&self, data: FieldData) -> FieldData {
        data.into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => (key, Value::String(s.to_uppercase())),
                other => (key, other),
            })
            .collect()
    }
}

/// Three-step signup form without completion handler.
pub fn signup_form() -> MultiStepForm {
    MultiStepForm::builder("Signup")
        .step(NameStep)
        .step(ContactStep)
        .step(ConfirmStep)
        .build()
        .expect("signup form should build")
}

/// Three-step signup form recording completed submissions.
pub fn signup_form_with_handler(config: WizardConfig) -> (RecordingHandler, MultiStepForm) {
    let handler = RecordingHandler::default();
    let form = MultiStepForm::builder("Signup")
        .step(NameStep)
        .step(ContactStep)
        .step(ConfirmStep)
        .config(config)
        .on_complete(handler.clone())
        .build()
        .expect("signup form should build");
    (handler, form)
}

/// Completion handler that remembers every submission it saw.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    submissions: Arc<Mutex<Vec<Submission>>>,
}

impl RecordingHandler {
    pub fn calls(&self) -> usize {
        self.submissions.lock().expect("lock").len()
    }

    pub fn last(&self) -> Option<Submission> {
        self.submissions.lock().expect("lock").last().cloned()
    }
}

impl CompletionHandler for RecordingHandler {
    fn complete(&self, submission: &Submission) -> Result<()> {
        self.submissions
            .lock()
            .map_err(|_| anyhow!("poisoned"))?
            .push(submission.clone());
        Ok(())
    }
}

/// In-memory session whose writes to one key always fail.
pub struct FailingSession {
    inner: MemorySession,
    failing_key: String,
}

impl FailingSession {
    pub fn failing_on(key: &str) -> Self {
        Self {
            inner: MemorySession::new(),
            failing_key: key.to_string(),
        }
    }
}

impl SessionStore for FailingSession {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        if key == self.failing_key {
            return Err(anyhow!("session backend unavailable"));
        }
        self.inner.set(key, value)
    }

    fn clear(&mut self, key: &str) -> Result<()> {
        self.inner.clear(key)
    }
}
