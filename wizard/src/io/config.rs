//! Form presentation configuration stored under `.wizard/config.toml`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::actions::ActionLabels;
use crate::core::descriptors::StepClasses;

/// Wizard configuration (TOML).
///
/// Meant to be edited by humans. Missing fields default to the stock
/// Bootstrap-flavoured classes and English labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WizardConfig {
    /// Clear every record and the navigation state once the completion
    /// handler succeeded.
    pub clear_on_complete: bool,

    pub classes: StepClasses,

    pub labels: ActionLabels,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            clear_on_complete: true,
            classes: StepClasses::default(),
            labels: ActionLabels::default(),
        }
    }
}

impl WizardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.classes.active.trim().is_empty() {
            return Err(anyhow!("classes.active must not be empty"));
        }
        for (name, label) in [
            ("labels.prev", &self.labels.prev),
            ("labels.next", &self.labels.next),
            ("labels.finish", &self.labels.finish),
        ] {
            if label.trim().is_empty() {
                return Err(anyhow!("{name} must not be empty"));
            }
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `WizardConfig::default()`.
pub fn load_config(path: &Path) -> Result<WizardConfig> {
    if !path.exists() {
        let cfg = WizardConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: WizardConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &WizardConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

/// Write `contents` to `<file name>.tmp` next to `path` and rename it into
/// place.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("path missing parent {}", path.display()))?;
    let mut tmp_name = path
        .file_name()
        .with_context(|| format!("path missing file name {}", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, WizardConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        let mut cfg = WizardConfig::default();
        cfg.labels.finish = "Submit".to_string();
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "clear_on_complete = false\n[labels]\nnext = \"Suivant\"\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert!(!cfg.clear_on_complete);
        assert_eq!(cfg.labels.next, "Suivant");
        assert_eq!(cfg.labels.prev, "Previous");
        assert_eq!(cfg.classes, StepClasses::default());
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("nested");
        write_atomic(&dir.join("session.json"), "{}\n").expect("write json");
        write_atomic(&dir.join("config.toml"), "").expect("write toml");
        let mut names: Vec<String> = fs::read_dir(&dir)
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["config.toml", "session.json"]);
    }

    #[test]
    fn empty_label_is_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[labels]\nfinish = \" \"\n").expect("write");
        let err = load_config(&path).expect_err("invalid");
        assert!(err.to_string().contains("labels.finish"));
    }
}
