//! Persisted project data.
//!
//! Currently only the build counter lives here. Mutation happens under the
//! store's lock and is flushed to disk before the lock is released, so the
//! on-disk value can never lag behind a concurrent reader.

use crate::constants::PROJECT_DATA_FILENAME;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectData {
    pub build_number: u64,
}

/// Lock-guarded access to the project data file.
#[derive(Debug)]
pub struct ProjectStore {
    path: PathBuf,
    data: Mutex<ProjectData>,
}

impl ProjectStore {
    /// Loads `.bolt/data.toml`. A missing file yields zeroed data.
    pub fn load(script_dir: &Path) -> Result<Self> {
        let path = script_dir.join(PROJECT_DATA_FILENAME);
        let data = if path.is_file() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("failed to read '{}'", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("failed to parse '{}'", path.display()))?
        } else {
            ProjectData::default()
        };

        Ok(ProjectStore {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn build_number(&self) -> u64 {
        self.data.lock().unwrap().build_number
    }

    /// Increments the build counter and persists it, returning the new value.
    pub fn increment_build_number(&self) -> Result<u64> {
        let mut data = self.data.lock().unwrap();
        data.build_number += 1;
        let serialized =
            toml::to_string_pretty(&*data).context("failed to serialize project data")?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("failed to write '{}'", self.path.display()))?;
        Ok(data.build_number)
    }
}
