//! Previous/Next/Finish actions attached to each step.

use serde::{Deserialize, Serialize};

/// Class added to every multi-step form root element.
pub const FORM_CLASS: &str = "msf";

/// Button labels, configurable for translation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ActionLabels {
    pub prev: String,
    pub next: String,
    pub finish: String,
}

impl Default for ActionLabels {
    fn default() -> Self {
        Self {
            prev: "Previous".to_string(),
            next: "Next".to_string(),
            finish: "Finish".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Prev,
    Next,
}

impl ActionKind {
    /// Action name as submitted by the browser.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Prev => "prev",
            ActionKind::Next => "next",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "prev" | "doPrev" => Some(ActionKind::Prev),
            "next" | "doNext" => Some(ActionKind::Next),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormAction {
    pub kind: ActionKind,
    pub name: &'static str,
    pub title: String,
    pub classes: Vec<&'static str>,
    /// Submitting this action must not run validation.
    pub skips_validation: bool,
}

impl FormAction {
    pub fn class_attr(&self) -> String {
        self.classes.join(" ")
    }
}

/// Build the actions for step `n`, in display order: next first, then
/// previous (steps after the first only).
pub fn build_actions(n: u32, is_last: bool, labels: &ActionLabels) -> Vec<FormAction> {
    let has_prev = n > 1;

    let mut next_classes = vec!["msf-step-next"];
    if !has_prev {
        next_classes.push("msf-step-next-single");
    }
    let next_title = if is_last {
        next_classes.push("msf-step-last");
        labels.finish.clone()
    } else {
        labels.next.clone()
    };

    let mut actions = vec![FormAction {
        kind: ActionKind::Next,
        name: ActionKind::Next.as_str(),
        title: next_title,
        classes: next_classes,
        skips_validation: false,
    }];
    if has_prev {
        actions.push(FormAction {
            kind: ActionKind::Prev,
            name: ActionKind::Prev.as_str(),
            title: labels.prev.clone(),
            classes: vec!["ignore-validation", "msf-step-prev"],
            skips_validation: true,
        });
    }
    actions
}
