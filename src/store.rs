//! JSON persistence for the working set.
//!
//! The whole state (contacts plus the four decoration lists) lives in one
//! document under the platform data directory and is replaced wholesale on
//! every save. No history is kept.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

use crate::contact::WorkingSet;

const STATE_FILE_NAME: &str = "state.json";
const APP_NAME: &str = "vdeck";

/// Handle on the state file location.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    /// Resolve the state file path, honoring an explicit override for tests
    /// and scripting. The default is `<data_dir>/vdeck/state.json`.
    pub fn open(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => path.to_path_buf(),
            None => {
                let base = BaseDirs::new().context("unable to determine data directories")?;
                base.data_dir().join(APP_NAME).join(STATE_FILE_NAME)
            }
        };
        Ok(Store { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the working set; a missing state file yields an empty one.
    pub fn load(&self) -> Result<WorkingSet> {
        if !self.path.exists() {
            return Ok(WorkingSet::default());
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read state file at {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("state file {} is not valid JSON", self.path.display()))
    }

    /// Persist the working set atomically: write a temporary file next to
    /// the target and rename it into place.
    pub fn save(&self, set: &WorkingSet) -> Result<()> {
        let data =
            serde_json::to_string_pretty(set).context("failed to serialize working set")?;
        write_atomic(&self.path, data.as_bytes())
    }

    /// Delete all persisted state.
    pub fn reset(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).with_context(|| {
                format!("failed to remove state file at {}", self.path.display())
            })?;
        }
        Ok(())
    }
}

fn write_atomic(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| anyhow!("target path has no parent: {}", target.display()))?;
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create parent dir {}", parent.display()))?;

    let temp_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| format!(".{name}.tmp"))
        .unwrap_or_else(|| format!(".{APP_NAME}.tmp"));
    let temp_path = parent.join(temp_name);

    fs::write(&temp_path, data)
        .with_context(|| format!("failed to write temporary file {}", temp_path.display()))?;
    fs::rename(&temp_path, target)
        .with_context(|| format!("failed to move state into place at {}", target.display()))?;
    Ok(())
}
