//! HTML pages served under `/form`.

use anyhow::Result;
use minijinja::{Environment, context};
use serde::Serialize;
use serde_json::Value;
use wizard::core::actions::{FORM_CLASS, FormAction};
use wizard::core::descriptors::StepDescriptor;
use wizard::io::render::StepsRenderer;
use wizard::{Field, FieldData, FieldKind};

const PAGE_TEMPLATE: &str = include_str!("templates/page.html");
const DONE_TEMPLATE: &str = include_str!("templates/done.html");

/// A field prepared for the page template, value already stringified.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
    pub checked: bool,
    pub children: Vec<FieldView>,
}

/// Build views of `fields` pre-filled from `values`.
pub fn field_views(fields: &[Field], values: &FieldData) -> Vec<FieldView> {
    fields
        .iter()
        .map(|field| {
            let value = values.get(&field.name);
            FieldView {
                name: field.name.clone(),
                label: field.display_label().to_string(),
                kind: field.kind,
                required: field.required,
                value: match value {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    _ => String::new(),
                },
                checked: matches!(value, Some(Value::Bool(true))),
                children: field_views(&field.children, values),
            }
        })
        .collect()
}

/// Everything the form page shows for one step.
#[derive(Debug, Serialize)]
pub struct FormPage<'a> {
    pub form_name: &'a str,
    pub title: &'a str,
    pub step: u32,
    pub step_count: u32,
    pub steps: &'a [StepDescriptor],
    pub message: Option<String>,
    pub action: String,
    pub fields: Vec<FieldView>,
    pub actions: Vec<FormAction>,
}

pub struct PageRenderer {
    env: Environment<'static>,
    steps: StepsRenderer,
}

impl PageRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("page.html", PAGE_TEMPLATE)
            .expect("page template should be valid");
        env.add_template("done.html", DONE_TEMPLATE)
            .expect("done template should be valid");
        Self {
            env,
            steps: StepsRenderer::new(),
        }
    }

    pub fn form_page(&self, page: &FormPage<'_>) -> Result<String> {
        let steps_html = self.steps.render(page.steps)?;
        let template = self.env.get_template("page.html")?;
        Ok(template.render(context! {
            form_name => page.form_name,
            title => page.title,
            step => page.step,
            step_count => page.step_count,
            steps_html => steps_html,
            message => page.message,
            action => page.action,
            form_class => FORM_CLASS,
            fields => page.fields,
            actions => page.actions,
        })?)
    }

    pub fn done_page(&self, form_name: &str, restart: &str) -> Result<String> {
        let template = self.env.get_template("done.html")?;
        Ok(template.render(context! { form_name => form_name, restart => restart })?)
    }
}

impl Default for PageRenderer {
    fn default() -> Self {
        Self::new()
    }
}
