//! Multi-step form definition: ordered steps composed over a session.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::core::actions::{FormAction, build_actions};
use crate::core::descriptors::{self, StepDescriptor, describe_steps};
use crate::core::fields::{Field, FieldData, ReadonlyField, missing_required, readonly_fields};
use crate::core::sequence::StepSequence;
use crate::error::{FormError, ValidationError};
use crate::io::config::WizardConfig;
use crate::io::session::SessionStore;
use crate::io::store::StepDataStore;

/// One step of a multi-step form.
///
/// Implementations are stateless templates: submitted data lives in the
/// session, never in the step.
pub trait FormStep: Send + Sync {
    /// Title shown in the step navigation.
    fn title(&self) -> &str;

    /// Fields displayed on this step.
    fn build_fields(&self) -> Vec<Field>;

    /// Optional JSON Schema the submitted data must satisfy.
    fn schema(&self) -> Option<Value> {
        None
    }

    /// Step-specific validation, run after required fields and schema.
    fn validate_data(&self, _data: &FieldData) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Transform validated data before it is stored.
    fn process_data(&self, data: FieldData) -> FieldData {
        data
    }
}

/// Everything a visitor submitted, handed over once the last step validates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub form: String,
    /// All steps merged; later steps win on key collisions.
    pub data: FieldData,
    pub by_step: Vec<(u32, FieldData)>,
}

/// Terminal handler run when the last step is submitted (store the
/// submission, send mail, ...). Forms without one fail on their last step.
pub trait CompletionHandler: Send + Sync {
    fn complete(&self, submission: &Submission) -> anyhow::Result<()>;
}

impl<F> CompletionHandler for F
where
    F: Fn(&Submission) -> anyhow::Result<()> + Send + Sync,
{
    fn complete(&self, submission: &Submission) -> anyhow::Result<()> {
        self(submission)
    }
}

/// A step rendered read-only for back-office display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepTab {
    /// Tab path, `Root.Step<n>`.
    pub tab: String,
    pub number: u32,
    pub title: String,
    pub fields: Vec<ReadonlyField>,
}

pub struct MultiStepForm {
    name: String,
    base_action: String,
    steps: Vec<Box<dyn FormStep>>,
    schemas: Vec<Option<jsonschema::Validator>>,
    completion: Option<Box<dyn CompletionHandler>>,
    config: WizardConfig,
    store: StepDataStore,
}

pub struct MultiStepFormBuilder {
    name: String,
    base_action: String,
    steps: Vec<Box<dyn FormStep>>,
    completion: Option<Box<dyn CompletionHandler>>,
    config: WizardConfig,
}

impl MultiStepFormBuilder {
    /// URL the form posts to; defaults to `/<name>`.
    pub fn base_action(mut self, base_action: &str) -> Self {
        self.base_action = base_action.to_string();
        self
    }

    /// Append the next step. Registration order is step order.
    pub fn step<S: FormStep + 'static>(mut self, step: S) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    pub fn on_complete<H: CompletionHandler + 'static>(mut self, handler: H) -> Self {
        self.completion = Some(Box::new(handler));
        self
    }

    pub fn config(mut self, config: WizardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<MultiStepForm, FormError> {
        if self.name.trim().is_empty() {
            return Err(FormError::InvalidDefinition("form name must not be empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(FormError::InvalidDefinition(format!(
                "form '{}' needs at least one step",
                self.name
            )));
        }
        let step_count = u32::try_from(self.steps.len())
            .map_err(|_| FormError::InvalidDefinition("too many steps".to_string()))?;
        let schemas = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| match step.schema() {
                Some(schema) => jsonschema::validator_for(&schema).map(Some).map_err(|err| {
                    FormError::InvalidDefinition(format!("step {} schema: {err}", i + 1))
                }),
                None => Ok(None),
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(form = %self.name, steps = step_count, "built multi-step form");
        Ok(MultiStepForm {
            store: StepDataStore::new(&self.name, step_count),
            name: self.name,
            base_action: self.base_action,
            steps: self.steps,
            schemas,
            completion: self.completion,
            config: self.config,
        })
    }
}

impl MultiStepForm {
    pub fn builder(name: &str) -> MultiStepFormBuilder {
        MultiStepFormBuilder {
            name: name.to_string(),
            base_action: format!("/{}", name.to_lowercase()),
            steps: Vec::new(),
            completion: None,
            config: WizardConfig::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_action(&self) -> &str {
        &self.base_action
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn store(&self) -> &StepDataStore {
        &self.store
    }

    pub fn has_completion_handler(&self) -> bool {
        self.completion.is_some()
    }

    pub fn step_count(&self) -> u32 {
        self.store.step_count()
    }

    /// Step `n` (1-indexed).
    pub fn step(&self, n: u32) -> Result<&dyn FormStep, FormError> {
        n.checked_sub(1)
            .and_then(|i| self.steps.get(i as usize))
            .map(|step| step.as_ref())
            .ok_or(FormError::UnknownStep {
                step: n,
                step_count: self.step_count(),
            })
    }

    pub fn titles(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.title()).collect()
    }

    pub fn is_last_step(&self, n: u32) -> bool {
        n >= self.step_count()
    }

    /// Navigation state loaded from the session.
    pub fn sequence(&self, session: &dyn SessionStore) -> Result<StepSequence, FormError> {
        let state = self.store.load_nav(session).map_err(FormError::Persistence)?;
        Ok(StepSequence::new(self.step_count(), state))
    }

    /// Step to display, honouring a `step` request parameter when it points
    /// at an already reached step.
    pub fn current_step(
        &self,
        session: &dyn SessionStore,
        requested: Option<u32>,
    ) -> Result<u32, FormError> {
        Ok(self.sequence(session)?.resolve_requested(requested))
    }

    pub fn next(&self, session: &mut dyn SessionStore) -> Result<bool, FormError> {
        self.transition(session, StepSequence::next)
    }

    pub fn previous(&self, session: &mut dyn SessionStore) -> Result<bool, FormError> {
        self.transition(session, StepSequence::previous)
    }

    pub fn goto(&self, session: &mut dyn SessionStore, n: u32) -> Result<bool, FormError> {
        self.transition(session, |seq| seq.goto(n))
    }

    /// Apply `change` to the persisted sequence; writes only if it moved.
    pub(crate) fn transition<F>(
        &self,
        session: &mut dyn SessionStore,
        change: F,
    ) -> Result<bool, FormError>
    where
        F: FnOnce(&mut StepSequence) -> bool,
    {
        let mut seq = self.sequence(session)?;
        if !change(&mut seq) {
            return Ok(false);
        }
        self.store
            .save_nav(session, seq.state())
            .map_err(FormError::Persistence)?;
        Ok(true)
    }

    /// Navigation descriptors for every step.
    pub fn all_steps(&self, session: &dyn SessionStore) -> Result<Vec<StepDescriptor>, FormError> {
        let seq = self.sequence(session)?;
        Ok(describe_steps(
            &seq,
            &self.titles(),
            &self.base_action,
            &self.config.classes,
        ))
    }

    pub fn actions(&self, n: u32) -> Vec<FormAction> {
        build_actions(n, self.is_last_step(n), &self.config.labels)
    }

    /// URL step `n` posts to.
    pub fn form_action(&self, n: u32) -> String {
        descriptors::form_action(&self.base_action, n)
    }

    pub fn fields(&self, n: u32) -> Result<Vec<Field>, FormError> {
        Ok(self.step(n)?.build_fields())
    }

    /// Data to pre-fill step `n` with: the rejected submission when it was
    /// made on this step, otherwise the saved record.
    pub fn form_data(&self, session: &dyn SessionStore, n: u32) -> Result<FieldData, FormError> {
        let pending = self
            .store
            .load_pending(session)
            .map_err(FormError::Persistence)?;
        if let Some(pending) = pending.filter(|p| p.step == n && !p.fields.is_empty()) {
            return Ok(pending.fields);
        }
        self.store
            .load_step(session, n)
            .map_err(FormError::Persistence)
    }

    pub fn merged_data(&self, session: &dyn SessionStore) -> Result<FieldData, FormError> {
        self.store.merge_all(session).map_err(FormError::Persistence)
    }

    pub fn data_by_step(
        &self,
        session: &dyn SessionStore,
    ) -> Result<Vec<(u32, FieldData)>, FormError> {
        self.store.all_by_step(session).map_err(FormError::Persistence)
    }

    pub fn clear_all(&self, session: &mut dyn SessionStore) -> Result<(), FormError> {
        self.store.clear_all(session).map_err(FormError::Persistence)
    }

    /// Every step's fields, read-only, filled from `data` (usually the
    /// merged data of a stored submission).
    pub fn tabbed_fields(&self, data: &FieldData) -> Vec<StepTab> {
        self.steps
            .iter()
            .zip(1u32..)
            .map(|(step, n)| StepTab {
                tab: format!("Root.Step{n}"),
                number: n,
                title: step.title().to_string(),
                fields: readonly_fields(&step.build_fields(), data),
            })
            .collect()
    }

    /// Run required-field, schema and step validation for step `n`.
    ///
    /// Outer error: unknown step. Inner error: the visitor's data is invalid.
    pub fn validate_submission(
        &self,
        n: u32,
        data: &FieldData,
    ) -> Result<Result<(), ValidationError>, FormError> {
        let step = self.step(n)?;

        let missing = missing_required(&step.build_fields(), data);
        if !missing.is_empty() {
            return Ok(Err(ValidationError::for_fields(
                format!("Please fill in: {}", missing.join(", ")),
                missing,
            )));
        }

        if let Some(Some(validator)) = self.schemas.get(n as usize - 1) {
            let instance = Value::Object(data.clone());
            let messages: Vec<String> = validator
                .iter_errors(&instance)
                .map(|err| err.to_string())
                .collect();
            if !messages.is_empty() {
                return Ok(Err(ValidationError::new(messages.join("; "))));
            }
        }

        Ok(step.validate_data(data))
    }

    pub(crate) fn completion_handler(&self) -> Option<&dyn CompletionHandler> {
        self.completion.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::session::MemorySession;
    use crate::test_support::{NameStep, signup_form};
    use serde_json::json;

    fn data(value: Value) -> FieldData {
        value.as_object().cloned().expect("object")
    }

    #[test]
    fn builder_rejects_empty_forms() {
        let err = MultiStepForm::builder("Empty").build().err().expect("error");
        assert!(matches!(err, FormError::InvalidDefinition(_)));

        let err = MultiStepForm::builder(" ").step(NameStep).build().err().expect("error");
        assert!(matches!(err, FormError::InvalidDefinition(_)));
    }

    #[test]
    fn unknown_step_is_reported() {
        let form = signup_form();
        assert!(form.step(1).is_ok());
        assert!(matches!(
            form.step(0),
            Err(FormError::UnknownStep { step: 0, step_count: 3 })
        ));
        assert!(form.step(4).is_err());
    }

    #[test]
    fn navigation_persists_and_gates_goto() {
        let form = signup_form();
        let mut session = MemorySession::new();

        assert_eq!(form.current_step(&session, None).expect("current"), 1);
        assert!(!form.goto(&mut session, 2).expect("goto"));
        assert!(form.next(&mut session).expect("next"));
        assert!(form.next(&mut session).expect("next"));
        assert!(!form.next(&mut session).expect("next on last"));
        assert!(form.previous(&mut session).expect("prev"));
        assert_eq!(form.current_step(&session, None).expect("current"), 2);
        assert!(form.goto(&mut session, 3).expect("goto reached"));
        assert!(form.goto(&mut session, 1).expect("goto first"));
        assert_eq!(form.current_step(&session, Some(3)).expect("current"), 3);
        assert_eq!(form.current_step(&session, Some(9)).expect("current"), 1);
    }

    #[test]
    fn form_data_prefers_pending_submission_of_same_step() {
        let form = signup_form();
        let mut session = MemorySession::new();
        form.store()
            .save_step(&mut session, 1, &data(json!({"name": "saved"})))
            .expect("save");
        form.store()
            .save_temp(&mut session, 1, &data(json!({"name": "typed"})))
            .expect("temp");

        assert_eq!(
            Value::Object(form.form_data(&session, 1).expect("data")),
            json!({"name": "typed"})
        );

        form.store()
            .save_temp(&mut session, 2, &data(json!({"email": "x"})))
            .expect("temp");
        assert_eq!(
            Value::Object(form.form_data(&session, 1).expect("data")),
            json!({"name": "saved"})
        );
    }

    #[test]
    fn required_and_schema_checks_reject_bad_data() {
        let form = signup_form();

        let missing = form.validate_submission(1, &FieldData::new()).expect("step");
        let err = missing.expect_err("missing name");
        assert_eq!(err.fields, vec!["name"]);

        let bad_email = form
            .validate_submission(2, &data(json!({"email": "not-an-email"})))
            .expect("step");
        assert!(bad_email.is_err());

        let ok = form
            .validate_submission(2, &data(json!({"email": "ada@example.com"})))
            .expect("step");
        assert!(ok.is_ok());
    }

    #[test]
    fn tabbed_fields_cover_every_step() {
        let form = signup_form();
        let tabs = form.tabbed_fields(&data(json!({"name": "Ada", "email": "ada@example.com"})));
        let paths: Vec<&str> = tabs.iter().map(|t| t.tab.as_str()).collect();
        assert_eq!(paths, vec!["Root.Step1", "Root.Step2", "Root.Step3"]);
        assert_eq!(tabs[0].fields[0].value, Some(json!("Ada")));
        assert_eq!(tabs[1].title, "Contact");
    }

    #[test]
    fn actions_and_form_action_follow_position() {
        let form = signup_form();
        assert_eq!(form.actions(1).len(), 1);
        assert_eq!(form.actions(3)[0].title, "Finish");
        assert_eq!(form.form_action(2), "/signup?step=2");
    }
}
