//! Boltfile loading.
//!
//! A `Boltfile` declares commands inline, without a backing script file per
//! command. It is TOML: a `[commands.<name>]` table per command, carrying the
//! same metadata fields as a script header plus the `run` body.

use crate::constants::BOLTFILE_NAME;
use crate::models::Boltfile;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Loads the Boltfile under `script_dir`, if one exists.
pub fn load(script_dir: &Path) -> Result<Option<Boltfile>> {
    let path = script_dir.join(BOLTFILE_NAME);
    if !path.is_file() {
        return Ok(None);
    }

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let boltfile: Boltfile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;

    log::debug!(
        "loaded Boltfile with {} inline command(s)",
        boltfile.commands.len()
    );
    Ok(Some(boltfile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_missing_boltfile_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_loads_commands() {
        // --- Setup ---
        let dir = TempDir::new().unwrap();
        let mut file = fs::File::create(dir.path().join(BOLTFILE_NAME)).unwrap();
        writeln!(
            file,
            r#"
[commands.greet]
help = "say hello"
args = "name:string?=world"
run = "echo hello $name"

[commands.release]
chain = "greet"
build_number = true
async = true
run = "echo releasing"
"#
        )
        .unwrap();

        // --- Execute ---
        let boltfile = load(dir.path()).unwrap().unwrap();

        // --- Assert ---
        assert_eq!(boltfile.commands.len(), 2);
        let greet = &boltfile.commands["greet"];
        assert_eq!(greet.help, "say hello");
        assert_eq!(greet.run, "echo hello $name");

        let release = &boltfile.commands["release"];
        assert_eq!(release.chain, "greet");
        assert!(release.build_number);
        assert!(release.async_run);

        let meta = release.to_meta();
        assert_eq!(meta.run.as_deref(), Some("echo releasing"));
        assert!(meta.async_run);
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(BOLTFILE_NAME),
            "[commands.x]\nrun = \"echo\"\ntypo_key = true\n",
        )
        .unwrap();
        assert!(load(dir.path()).is_err());
    }
}
