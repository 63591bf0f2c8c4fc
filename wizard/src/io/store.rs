//! Per-form step data and navigation state kept in a session.

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::fields::FieldData;
use crate::core::invariants::validate_nav_state;
use crate::core::merge::merge_records;
use crate::core::types::{NavState, PendingSubmission};
use crate::io::session::{SessionKeys, SessionStore};

/// Step records, the pending submission slot and navigation state of one
/// form. Holds no data itself; the session is passed to every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDataStore {
    keys: SessionKeys,
    step_count: u32,
}

impl StepDataStore {
    pub fn new(base: &str, step_count: u32) -> Self {
        Self {
            keys: SessionKeys::new(base),
            step_count,
        }
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    pub fn step_count(&self) -> u32 {
        self.step_count
    }

    /// Load current/max step. Unset or unreadable values count as 0.
    pub fn load_nav(&self, session: &dyn SessionStore) -> Result<NavState> {
        let current = read_step_number(session, &self.keys.step())?;
        let max_reached = read_step_number(session, &self.keys.max_step())?;
        let state = NavState::new(current, max_reached);
        let violations = validate_nav_state(&state, self.step_count);
        if !violations.is_empty() {
            warn!(
                form = self.keys.base(),
                violations = %violations.join("; "),
                "repairing navigation state from session"
            );
        }
        Ok(state)
    }

    /// Persist navigation state. `maxStep` is written before `step`, so a
    /// failed second write leaves the old current step under the new max and
    /// `max_reached >= current` still holds.
    pub fn save_nav(&self, session: &mut dyn SessionStore, state: NavState) -> Result<()> {
        debug!(form = self.keys.base(), current = state.current, max = state.max_reached, "saving navigation state");
        session.set(&self.keys.max_step(), Value::from(state.max_reached))?;
        session.set(&self.keys.step(), Value::from(state.current))?;
        Ok(())
    }

    pub fn clear_nav(&self, session: &mut dyn SessionStore) -> Result<()> {
        session.clear(&self.keys.step())?;
        session.clear(&self.keys.max_step())?;
        Ok(())
    }

    /// Overwrite the record for step `n`.
    pub fn save_step(&self, session: &mut dyn SessionStore, n: u32, data: &FieldData) -> Result<()> {
        debug!(form = self.keys.base(), step = n, fields = data.len(), "saving step record");
        session
            .set(&self.keys.record(n), Value::Object(data.clone()))
            .with_context(|| format!("save step {n} of {}", self.keys.base()))
    }

    /// Record for step `n`, empty when nothing was saved.
    pub fn load_step(&self, session: &dyn SessionStore, n: u32) -> Result<FieldData> {
        match session.get(&self.keys.record(n))? {
            Some(Value::Object(map)) => Ok(map),
            Some(other) => {
                warn!(form = self.keys.base(), step = n, value = %other, "ignoring non-object step record");
                Ok(FieldData::new())
            }
            None => Ok(FieldData::new()),
        }
    }

    pub fn clear_step(&self, session: &mut dyn SessionStore, n: u32) -> Result<()> {
        session.clear(&self.keys.record(n))
    }

    /// Replace the pending submission with data rejected on step `n`.
    pub fn save_temp(&self, session: &mut dyn SessionStore, n: u32, data: &FieldData) -> Result<()> {
        let pending = PendingSubmission {
            step: n,
            fields: data.clone(),
        };
        debug!(form = self.keys.base(), step = n, "saving pending submission");
        session
            .set(&self.keys.temp(), serde_json::to_value(&pending)?)
            .with_context(|| format!("save pending submission of {}", self.keys.base()))
    }

    pub fn load_pending(&self, session: &dyn SessionStore) -> Result<Option<PendingSubmission>> {
        let Some(raw) = session.get(&self.keys.temp())? else {
            return Ok(None);
        };
        match serde_json::from_value::<PendingSubmission>(raw) {
            Ok(pending) => Ok(Some(pending)),
            Err(err) => {
                warn!(form = self.keys.base(), error = %err, "ignoring malformed pending submission");
                Ok(None)
            }
        }
    }

    /// Fields of the pending submission, empty when there is none.
    pub fn load_temp(&self, session: &dyn SessionStore) -> Result<FieldData> {
        Ok(self
            .load_pending(session)?
            .map(|pending| pending.fields)
            .unwrap_or_default())
    }

    pub fn clear_temp(&self, session: &mut dyn SessionStore) -> Result<()> {
        session.clear(&self.keys.temp())
    }

    /// Every step's record in step order, empty maps for unsaved steps.
    pub fn all_by_step(&self, session: &dyn SessionStore) -> Result<Vec<(u32, FieldData)>> {
        (1..=self.step_count)
            .map(|n| Ok((n, self.load_step(session, n)?)))
            .collect()
    }

    /// All records merged into one map; later steps win on collisions.
    pub fn merge_all(&self, session: &dyn SessionStore) -> Result<FieldData> {
        Ok(merge_records(&self.all_by_step(session)?))
    }

    /// Remove every record, the pending submission and navigation state.
    pub fn clear_all(&self, session: &mut dyn SessionStore) -> Result<()> {
        debug!(form = self.keys.base(), "clearing all form data");
        for n in 1..=self.step_count {
            self.clear_step(session, n)?;
        }
        self.clear_temp(session)?;
        self.clear_nav(session)
    }
}

fn read_step_number(session: &dyn SessionStore, key: &str) -> Result<u32> {
    let parsed = match session.get(key)? {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        Some(_) => None,
    };
    Ok(parsed.unwrap_or_else(|| {
        warn!(key, "unreadable step number in session, treating as not started");
        0
    }))
}
