//! Session storage abstraction and key layout.

use std::collections::BTreeMap;

use anyhow::Result;
use serde_json::Value;

/// Key-value session storage owned by the host (cookie session, file, etc.).
///
/// Implementations are scoped to one visitor. Writes are last-write-wins.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
    fn clear(&mut self, key: &str) -> Result<()>;
}

/// Session kept in memory, e.g. one entry of a server-side session map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySession {
    values: BTreeMap<String, Value>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn clear(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Session keys used by one form, all prefixed with the form name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    base: String,
}

impl SessionKeys {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.to_string(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Current step.
    pub fn step(&self) -> String {
        format!("{}.step", self.base)
    }

    /// Highest reached step.
    pub fn max_step(&self) -> String {
        format!("{}.maxStep", self.base)
    }

    /// Validated record for step `n`.
    pub fn record(&self, n: u32) -> String {
        format!("{}.step_{}", self.base, n)
    }

    /// Pending (rejected) submission.
    pub fn temp(&self) -> String {
        format!("{}.temp", self.base)
    }
}
