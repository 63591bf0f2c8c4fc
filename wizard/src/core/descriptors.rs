//! Step descriptors for navigation UIs.

use serde::{Deserialize, Serialize};

use crate::core::sequence::StepSequence;
use crate::core::types::StepStatus;

/// CSS class strings applied to step descriptors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StepClasses {
    /// The current step.
    pub active: String,
    /// Every other step.
    pub inactive: String,
    /// Steps before the current one.
    pub completed: String,
    /// Steps after the current one.
    pub not_completed: String,
}

impl Default for StepClasses {
    fn default() -> Self {
        Self {
            active: "current bg-primary text-white".to_string(),
            inactive: "link".to_string(),
            completed: "msf-completed bg-primary text-white".to_string(),
            not_completed: "msf-not-completed bg-light text-muted".to_string(),
        }
    }
}

/// One entry of the step navigation list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepDescriptor {
    pub title: String,
    pub number: u32,
    /// Only set for steps the visitor has reached.
    pub link: Option<String>,
    pub class: String,
    pub is_current: bool,
    pub is_completed: bool,
    pub is_not_completed: bool,
}

/// URL that jumps to step `n` through the `gotoStep` action.
pub fn goto_link(base_action: &str, n: u32) -> String {
    format!("{}/gotoStep/?step={}", base_action.trim_end_matches('/'), n)
}

/// URL a step's form posts to.
pub fn form_action(base_action: &str, n: u32) -> String {
    format!("{base_action}?step={n}")
}

/// Describe every step of `seq` in order. `titles` must hold one title per
/// step; missing titles render as `Step <n>`.
pub fn describe_steps<S: AsRef<str>>(
    seq: &StepSequence,
    titles: &[S],
    base_action: &str,
    classes: &StepClasses,
) -> Vec<StepDescriptor> {
    let reachable = seq.reachable();
    (1..=seq.step_count())
        .map(|n| {
            let status = seq.status_of(n);
            let mut class = if status == StepStatus::Current {
                classes.active.clone()
            } else {
                classes.inactive.clone()
            };
            if n == 1 {
                class.push_str(" first");
            }
            if seq.is_last_step(n) {
                class.push_str(" last");
            }
            match status {
                StepStatus::Completed => push_class(&mut class, &classes.completed),
                StepStatus::NotCompleted => push_class(&mut class, &classes.not_completed),
                StepStatus::Current => {}
            }
            let title = titles
                .get(n as usize - 1)
                .map(|t| t.as_ref().to_string())
                .unwrap_or_else(|| format!("Step {n}"));
            StepDescriptor {
                title,
                number: n,
                link: (n <= reachable).then(|| goto_link(base_action, n)),
                class,
                is_current: status == StepStatus::Current,
                is_completed: status == StepStatus::Completed,
                is_not_completed: status == StepStatus::NotCompleted,
            }
        })
        .collect()
}

fn push_class(class: &mut String, extra: &str) {
    if extra.is_empty() {
        return;
    }
    class.push(' ');
    class.push_str(extra);
}
