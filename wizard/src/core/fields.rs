//! Field declarations and the flat data maps submitted for them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Submitted field data: field name to value.
pub type FieldData = serde_json::Map<String, Value>;

/// Input kind of a declared field. Rendering is up to the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Number,
    Textarea,
    Checkbox,
    /// Container for `children`; carries no value of its own.
    Group,
}

/// A field declared by a form step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Display label. Falls back to `name` when empty.
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Field>,
}

impl Field {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            children: Vec::new(),
        }
    }

    pub fn text(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn email(name: &str, label: &str) -> Self {
        Self::new(name, label, FieldKind::Email)
    }

    pub fn group(name: &str, label: &str, children: Vec<Field>) -> Self {
        Self {
            children,
            ..Self::new(name, label, FieldKind::Group)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

/// A field shown read-only with the value taken from aggregated data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadonlyField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// `None` when the data holds no non-empty value for this field.
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ReadonlyField>,
}

/// True for values a visitor effectively left blank.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Number(_) => false,
    }
}

/// Names of required fields (including group children) that are missing or
/// empty in `data`, in declaration order.
pub fn missing_required(fields: &[Field], data: &FieldData) -> Vec<String> {
    let mut missing = Vec::new();
    collect_missing(fields, data, &mut missing);
    missing
}

fn collect_missing(fields: &[Field], data: &FieldData, missing: &mut Vec<String>) {
    for field in fields {
        if field.kind == FieldKind::Group {
            collect_missing(&field.children, data, missing);
            continue;
        }
        if field.required && data.get(&field.name).is_none_or(is_empty_value) {
            missing.push(field.name.clone());
        }
    }
}

/// Make every field read-only and attach its value from `data`.
pub fn readonly_fields(fields: &[Field], data: &FieldData) -> Vec<ReadonlyField> {
    fields
        .iter()
        .map(|field| ReadonlyField {
            name: field.name.clone(),
            label: field.display_label().to_string(),
            kind: field.kind,
            value: data
                .get(&field.name)
                .filter(|value| !is_empty_value(value))
                .cloned(),
            children: readonly_fields(&field.children, data),
        })
        .collect()
}

/// Parse `key=value` pairs into field data. Values that parse as JSON
/// scalars (numbers, booleans) keep that type; everything else is a string.
pub fn parse_assignments<S: AsRef<str>>(pairs: &[S]) -> Result<FieldData, String> {
    let mut data = FieldData::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{pair}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("empty field name in '{pair}'"));
        }
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
            _ => Value::String(raw.to_string()),
        };
        data.insert(key.to_string(), value);
    }
    Ok(data)
}
