//! Declarative forms loaded from `.wizard/form.toml`.
//!
//! Lets the CLI and the demo server run a form without writing Rust steps.
//! Each `[[steps]]` table becomes one [`FormStep`]; order in the file is step
//! order.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::fields::{Field, FieldKind};
use crate::error::FormError;
use crate::form::{FormStep, MultiStepFormBuilder, MultiStepForm};
use crate::io::config::write_atomic;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FormDefinition {
    /// Form name; prefixes every session key.
    pub name: String,
    /// URL the form posts to. Defaults to `/<name>` in lowercase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_action: Option<String>,
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StepDefinition {
    pub title: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    /// JSON Schema for the step's data, written as a TOML table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl FormStep for StepDefinition {
    fn title(&self) -> &str {
        &self.title
    }

    fn build_fields(&self) -> Vec<Field> {
        self.fields.clone()
    }

    fn schema(&self) -> Option<Value> {
        self.schema.clone()
    }
}

impl FormDefinition {
    /// Builder with every declared step registered in order.
    pub fn builder(&self) -> MultiStepFormBuilder {
        let mut builder = MultiStepForm::builder(&self.name);
        if let Some(base_action) = &self.base_action {
            builder = builder.base_action(base_action);
        }
        for step in &self.steps {
            builder = builder.step(step.clone());
        }
        builder
    }

    /// Build the form without completion handler.
    pub fn build(&self) -> Result<MultiStepForm, FormError> {
        self.builder().build()
    }
}

/// Sample three-step signup form written by `wizard init`.
pub fn default_definition() -> FormDefinition {
    FormDefinition {
        name: "Signup".to_string(),
        base_action: None,
        steps: vec![
            StepDefinition {
                title: "Account".to_string(),
                fields: vec![
                    Field::text("name", "Full name").required(),
                    Field::email("email", "Email").required(),
                ],
                schema: Some(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "email": { "type": "string", "pattern": "^[^@\\s]+@[^@\\s]+$" }
                    }
                })),
            },
            StepDefinition {
                title: "Address".to_string(),
                fields: vec![Field::group(
                    "address",
                    "Address",
                    vec![
                        Field::text("street", "Street"),
                        Field::text("city", "City").required(),
                    ],
                )],
                schema: None,
            },
            StepDefinition {
                title: "Confirm".to_string(),
                fields: vec![Field::new(
                    "accept",
                    "I accept the terms",
                    FieldKind::Checkbox,
                )
                .required()],
                schema: None,
            },
        ],
    }
}

/// Load a form definition from TOML.
pub fn load_definition(path: &Path) -> Result<FormDefinition> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))
}

/// Atomically write a form definition as TOML.
pub fn write_definition(path: &Path, definition: &FormDefinition) -> Result<()> {
    let mut buf = toml::to_string_pretty(definition).context("serialize form definition")?;
    buf.push('\n');
    write_atomic(path, &buf)
}
