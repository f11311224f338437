//! Runner configuration loading.

use crate::constants::CONFIG_FILENAME;
use crate::models::RunnerConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Loads `.bolt/config.toml`. A missing file yields the defaults; a malformed
/// file is an error.
pub fn load(script_dir: &Path) -> Result<RunnerConfig> {
    let path = script_dir.join(CONFIG_FILENAME);
    if !path.is_file() {
        log::debug!("no config file at '{}', using defaults", path.display());
        return Ok(RunnerConfig::default());
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    toml::from_str(&contents).with_context(|| format!("failed to parse '{}'", path.display()))
}
