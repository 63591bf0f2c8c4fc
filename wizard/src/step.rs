//! Submission handling for a single step: next, previous and goto.

use serde::Serialize;
use tracing::{info, warn};

use crate::core::fields::FieldData;
use crate::error::{FormError, ValidationError};
use crate::form::{MultiStepForm, Submission};
use crate::io::session::SessionStore;

/// Result of submitting a step with [`MultiStepForm::do_next`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Data was stored and the visitor moved on.
    Advanced { from: u32, to: u32 },
    /// Validation failed. The data is kept as the pending submission and the
    /// visitor stays on `step`.
    Rejected {
        step: u32,
        #[serde(serialize_with = "serialize_message")]
        error: ValidationError,
    },
    /// The last step validated and the completion handler succeeded.
    Completed { submission: Submission },
}

fn serialize_message<S: serde::Serializer>(
    error: &ValidationError,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.message)
}

impl MultiStepForm {
    /// Submit `data` for the current step (or the requested one, when the
    /// visitor may see it).
    ///
    /// Order of effects on success: clear the pending submission, run the
    /// step's transform, store the record, then advance. A failed write
    /// returns `FormError::Persistence` before navigation state changes.
    pub fn do_next(
        &self,
        session: &mut dyn SessionStore,
        requested: Option<u32>,
        data: FieldData,
    ) -> Result<StepOutcome, FormError> {
        let mut seq = self.sequence(session)?;
        let n = seq.resolve_requested(requested);
        let step = self.step(n)?;

        if let Err(error) = self.validate_submission(n, &data)? {
            warn!(form = self.name(), step = n, error = %error, "step submission rejected");
            self.store()
                .save_temp(session, n, &data)
                .map_err(FormError::Persistence)?;
            return Ok(StepOutcome::Rejected { step: n, error });
        }

        let is_last = seq.is_last_step(n);
        if is_last && !self.has_completion_handler() {
            return Err(FormError::MissingCompletionHandler {
                form: self.name().to_string(),
            });
        }

        self.store()
            .clear_temp(session)
            .map_err(FormError::Persistence)?;
        let processed = step.process_data(data);
        self.store()
            .save_step(session, n, &processed)
            .map_err(FormError::Persistence)?;

        if is_last {
            return self.complete(session);
        }

        seq.goto(n);
        seq.next();
        self.store()
            .save_nav(session, seq.state())
            .map_err(FormError::Persistence)?;
        let to = seq.current_step();
        info!(form = self.name(), from = n, to, "step completed");
        Ok(StepOutcome::Advanced { from: n, to })
    }

    /// Go back one step from the current step (or the requested one, when
    /// the visitor may see it). No validation and no data changes.
    pub fn do_prev(
        &self,
        session: &mut dyn SessionStore,
        requested: Option<u32>,
    ) -> Result<u32, FormError> {
        let mut seq = self.sequence(session)?;
        let before = seq.state();
        let n = seq.resolve_requested(requested);
        seq.goto(n);
        seq.previous();
        if seq.state() != before {
            self.store()
                .save_nav(session, seq.state())
                .map_err(FormError::Persistence)?;
        }
        Ok(seq.current_step())
    }

    /// Jump to step `n` if it was already reached; otherwise nothing happens.
    pub fn goto_step(&self, session: &mut dyn SessionStore, n: u32) -> Result<bool, FormError> {
        let moved = self.goto(session, n)?;
        if !moved {
            warn!(form = self.name(), step = n, "ignored navigation to unreached step");
        }
        Ok(moved)
    }

    fn complete(&self, session: &mut dyn SessionStore) -> Result<StepOutcome, FormError> {
        let handler = self
            .completion_handler()
            .ok_or_else(|| FormError::MissingCompletionHandler {
                form: self.name().to_string(),
            })?;
        let by_step = self.data_by_step(session)?;
        let submission = Submission {
            form: self.name().to_string(),
            data: crate::core::merge::merge_records(&by_step),
            by_step,
        };
        handler
            .complete(&submission)
            .map_err(FormError::Completion)?;
        info!(form = self.name(), "form completed");

        if self.config().clear_on_complete {
            self.clear_all(session)?;
        }
        Ok(StepOutcome::Completed { submission })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::WizardConfig;
    use crate::io::session::MemorySession;
    use crate::test_support::{
        FailingSession, NameStep, UppercaseStep, signup_form, signup_form_with_handler,
    };
    use serde_json::{Value, json};

    fn data(value: Value) -> FieldData {
        value.as_object().cloned().expect("object")
    }

    /// Three steps: name, then email, then the last step which completes.
    #[test]
    fn three_step_scenario_merges_all_steps() {
        let (handler, form) = signup_form_with_handler(WizardConfig::default());
        let mut session = MemorySession::new();

        let out = form
            .do_next(&mut session, None, data(json!({"name": "a"})))
            .expect("step 1");
        assert_eq!(out, StepOutcome::Advanced { from: 1, to: 2 });

        let out = form
            .do_next(&mut session, None, data(json!({"email": "b@example.com"})))
            .expect("step 2");
        assert_eq!(out, StepOutcome::Advanced { from: 2, to: 3 });
        assert_eq!(
            Value::Object(form.merged_data(&session).expect("merge")),
            json!({"name": "a", "email": "b@example.com"})
        );

        let out = form
            .do_next(&mut session, None, data(json!({"accept": true})))
            .expect("step 3");
        let StepOutcome::Completed { submission } = out else {
            panic!("expected completion");
        };
        assert_eq!(
            Value::Object(submission.data),
            json!({"name": "a", "email": "b@example.com", "accept": true})
        );
        assert_eq!(handler.calls(), 1);
        assert_eq!(handler.last().map(|s| s.form), Some("Signup".to_string()));
        assert!(session.is_empty(), "session should be cleared after completion");
    }

    #[test]
    fn rejected_submission_is_kept_and_step_unchanged() {
        let form = signup_form();
        let mut session = MemorySession::new();
        let submitted = data(json!({"name": ""}));

        let out = form
            .do_next(&mut session, None, submitted.clone())
            .expect("submit");
        let StepOutcome::Rejected { step, error } = out else {
            panic!("expected rejection");
        };
        assert_eq!(step, 1);
        assert!(error.message.contains("name"));
        assert_eq!(form.store().load_temp(&session).expect("temp"), submitted);
        assert_eq!(form.current_step(&session, None).expect("current"), 1);
        assert!(form.store().load_step(&session, 1).expect("record").is_empty());
    }

    #[test]
    fn success_clears_pending_and_stores_transformed_data() {
        let form = MultiStepForm::builder("Shout")
            .step(UppercaseStep)
            .step(NameStep)
            .build()
            .expect("form");
        let mut session = MemorySession::new();

        form.store()
            .save_temp(&mut session, 1, &data(json!({"word": ""})))
            .expect("temp");
        form.do_next(&mut session, None, data(json!({"word": "hi"})))
            .expect("submit");

        assert!(form.store().load_temp(&session).expect("temp").is_empty());
        assert_eq!(
            Value::Object(form.store().load_step(&session, 1).expect("record")),
            json!({"word": "HI"})
        );
    }

    #[test]
    fn last_step_without_handler_is_a_configuration_error() {
        let form = signup_form();
        let mut session = MemorySession::new();
        form.do_next(&mut session, None, data(json!({"name": "a"})))
            .expect("1");
        form.do_next(&mut session, None, data(json!({"email": "a@b.c"})))
            .expect("2");

        let err = form
            .do_next(&mut session, None, data(json!({"accept": true})))
            .expect_err("no handler");
        assert!(matches!(err, FormError::MissingCompletionHandler { .. }));
        assert!(form.store().load_step(&session, 3).expect("record").is_empty());
    }

    #[test]
    fn completion_keeps_data_when_configured() {
        let config = WizardConfig {
            clear_on_complete: false,
            ..WizardConfig::default()
        };
        let (_, form) = signup_form_with_handler(config);
        let mut session = MemorySession::new();
        for payload in [json!({"name": "a"}), json!({"email": "a@b.c"}), json!({"accept": true})] {
            form.do_next(&mut session, None, data(payload)).expect("submit");
        }
        assert_eq!(form.merged_data(&session).expect("merge").len(), 3);
        assert_eq!(form.current_step(&session, None).expect("current"), 3);
    }

    #[test]
    fn failed_save_does_not_move_navigation() {
        let form = signup_form();
        let mut session = FailingSession::failing_on("Signup.step_1");

        let err = form
            .do_next(&mut session, None, data(json!({"name": "a"})))
            .expect_err("save fails");
        assert!(matches!(err, FormError::Persistence(_)));
        assert_eq!(form.current_step(&session, None).expect("current"), 1);
        assert_eq!(form.sequence(&session).expect("seq").max_reached(), 0);
    }

    #[test]
    fn requested_step_resubmits_an_earlier_step() {
        let form = signup_form();
        let mut session = MemorySession::new();
        form.do_next(&mut session, None, data(json!({"name": "a"})))
            .expect("1");
        form.do_next(&mut session, None, data(json!({"email": "a@b.c"})))
            .expect("2");

        let out = form
            .do_next(&mut session, Some(1), data(json!({"name": "b"})))
            .expect("resubmit");
        assert_eq!(out, StepOutcome::Advanced { from: 1, to: 2 });
        assert_eq!(
            form.store().load_step(&session, 1).expect("record").get("name"),
            Some(&json!("b"))
        );
        assert_eq!(form.sequence(&session).expect("seq").max_reached(), 3);
    }

    #[test]
    fn prev_and_goto_ignore_out_of_range_requests() {
        let form = signup_form();
        let mut session = MemorySession::new();
        assert_eq!(form.do_prev(&mut session, None).expect("prev"), 1);
        assert!(!form.goto_step(&mut session, 2).expect("goto"));

        form.do_next(&mut session, None, data(json!({"name": "a"})))
            .expect("1");
        assert_eq!(form.do_prev(&mut session, None).expect("prev"), 1);
        assert!(form.goto_step(&mut session, 2).expect("goto"));
        assert!(!form.goto_step(&mut session, 3).expect("goto"));
        assert_eq!(form.current_step(&session, None).expect("current"), 2);
    }

    #[test]
    fn prev_steps_back_from_the_displayed_step() {
        let (_, form) = signup_form_with_handler(WizardConfig {
            clear_on_complete: false,
            ..WizardConfig::default()
        });
        let mut session = MemorySession::new();
        form.do_next(&mut session, None, data(json!({"name": "a"})))
            .expect("1");
        form.do_next(&mut session, None, data(json!({"email": "a@b.c"})))
            .expect("2");
        assert!(form.goto_step(&mut session, 1).expect("goto"));

        assert_eq!(form.do_prev(&mut session, Some(3)).expect("prev"), 2);
        let seq = form.sequence(&session).expect("seq");
        assert_eq!((seq.current_step(), seq.max_reached()), (2, 3));

        // An unreached step falls back to the session's own step.
        let mut fresh = MemorySession::new();
        assert_eq!(form.do_prev(&mut fresh, Some(3)).expect("prev"), 1);
        assert!(fresh.is_empty(), "no-op prev writes nothing");
    }

    #[test]
    fn outcome_serializes_with_message() {
        let out = StepOutcome::Rejected {
            step: 2,
            error: ValidationError::new("bad"),
        };
        let value = serde_json::to_value(&out).expect("serialize");
        assert_eq!(value, json!({"outcome": "rejected", "step": 2, "error": "bad"}));
    }
}
