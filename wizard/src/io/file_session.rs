//! Session persisted as a JSON object on disk (`.wizard/session.json`).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::debug;

use crate::io::config::write_atomic;
use crate::io::session::SessionStore;

/// File-backed session. Every write replaces the file atomically.
#[derive(Debug)]
pub struct FileSession {
    path: PathBuf,
    values: BTreeMap<String, Value>,
}

impl FileSession {
    /// Open the session at `path`. A missing file is an empty session.
    pub fn open(path: &Path) -> Result<Self> {
        let values = if path.exists() {
            debug!(path = %path.display(), "loading session");
            let contents = fs::read_to_string(path)
                .with_context(|| format!("read session {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parse session {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    fn persist(&self) -> Result<()> {
        debug!(path = %self.path.display(), keys = self.values.len(), "writing session");
        let mut buf = serde_json::to_string_pretty(&self.values)?;
        buf.push('\n');
        write_atomic(&self.path, &buf)
            .with_context(|| format!("write session {}", self.path.display()))
    }
}

impl SessionStore for FileSession {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.values.insert(key.to_string(), value);
        self.persist()
    }

    fn clear(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_none() {
            return Ok(());
        }
        self.persist()
    }
}
