//! HTML rendering of the step navigation list.

use anyhow::Result;
use minijinja::{Environment, context};

use crate::core::descriptors::StepDescriptor;

const STEPS_TEMPLATE: &str = include_str!("../templates/steps.html");

/// Template engine wrapper around minijinja.
///
/// Templates named `*.html` are auto-escaped, so step titles are safe to
/// interpolate.
pub struct StepsRenderer {
    env: Environment<'static>,
}

impl StepsRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("steps.html", STEPS_TEMPLATE)
            .expect("steps template should be valid");
        Self { env }
    }

    pub fn render(&self, steps: &[StepDescriptor]) -> Result<String> {
        let template = self.env.get_template("steps.html")?;
        Ok(template.render(context! { steps => steps })?)
    }
}

impl Default for StepsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render the navigation list with a throwaway renderer.
pub fn render_steps(steps: &[StepDescriptor]) -> Result<String> {
    StepsRenderer::new().render(steps)
}
