//! Script discovery.
//!
//! Walks the script directory (non-recursively), loads the globals prelude,
//! registers every Boltfile command, and dispatches one parse per script. When
//! enough scripts are present the parse work is split into two halves running
//! in parallel. Per-script errors are collected and reported in bulk; they do
//! not abort discovery.

use crate::constants::{BUILTIN_NAMES, GLOBALS_PREFIX, PARALLEL_PARSE_THRESHOLD, SCRIPT_EXTENSION};
use crate::core::boltfile;
use crate::core::resolver;
use crate::core::workspace::Workspace;
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// The outcome of one discovery pass.
#[derive(Debug)]
pub struct DiscoverySummary {
    /// Number of commands now in the registry.
    pub commands: usize,
    /// Per-source parse failures, keyed by script path or Boltfile entry name.
    pub errors: Vec<(String, anyhow::Error)>,
    pub elapsed: Duration,
}

/// Walks the script directory and populates the registry.
pub fn find_commands(ws: &Workspace) -> Result<DiscoverySummary> {
    let start = Instant::now();
    let mut scripts: Vec<PathBuf> = Vec::new();

    for entry in WalkDir::new(&ws.script_dir).min_depth(1).max_depth(1) {
        let entry = entry.context("failed to walk script directory")?;
        if !entry.file_type().is_file() {
            // Subdirectories are ignored.
            continue;
        }

        let path = entry.into_path();
        let file_name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => continue,
        };
        if !file_name.ends_with(SCRIPT_EXTENSION) {
            continue;
        }

        if file_name.starts_with(GLOBALS_PREFIX) {
            // The globals script carries no metadata header; its bytes are
            // prepended verbatim to every generated script.
            let mut bytes = fs::read(&path)
                .with_context(|| format!("failed to read globals script '{}'", path.display()))?;
            bytes.extend_from_slice(b"\n\n");
            ws.set_globals(bytes);
            continue;
        }

        scripts.push(path);
    }

    let errors = Mutex::new(Vec::new());

    let parse_half = |half: &[PathBuf]| {
        for path in half {
            if let Err(e) = resolver::add_command(ws, path, false) {
                log::debug!("failed to add command '{}': {:#}", path.display(), e);
                errors
                    .lock()
                    .unwrap()
                    .push((path.display().to_string(), e));
            }
        }
    };

    if scripts.len() > PARALLEL_PARSE_THRESHOLD {
        log::debug!("parsing {} scripts in parallel", scripts.len());
        let (first, second) = scripts.split_at(scripts.len() / 2);
        rayon::join(|| parse_half(first), || parse_half(second));
    } else {
        log::debug!("parsing {} scripts sequentially", scripts.len());
        parse_half(&scripts);
    }

    let mut errors = errors.into_inner().unwrap();

    // Inline commands come last so scripts win name collisions.
    if let Some(boltfile) = boltfile::load(&ws.script_dir)? {
        for (name, e) in resolver::register_boltfile(ws, &boltfile) {
            errors.push((format!("Boltfile command '{}'", name), e));
        }
    }

    for (source, e) in &errors {
        log::error!("failed to parse {}: {:#}", source, e);
    }

    for name in BUILTIN_NAMES {
        if ws.registry.conflicts(name) {
            log::warn!(
                "command '{}' conflicts with a builtin name, please choose a different one",
                name
            );
        }
    }

    Ok(DiscoverySummary {
        commands: ws.registry.len(),
        errors,
        elapsed: start.elapsed(),
    })
}
