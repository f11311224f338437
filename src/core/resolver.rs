//! Chain resolution and script parsing.
//!
//! The resolver turns tokenized chain specs into executable command sequences.
//! Resolving a name may trigger parsing of its backing script, which in turn
//! resolves that script's own chain; this recursion is how transitive
//! discovery happens. Every invocation seen along one resolution path is
//! recorded on the enclosing `ParseJob`, and a name recurring more often than
//! the configured recursion depth is a cycle: the process logs, tears down and
//! exits non-zero.

use crate::constants::BOLTFILE_NAME;
use crate::core::arguments;
use crate::core::chain_parser;
use crate::core::header;
use crate::core::jobs::ParseJob;
use crate::core::workspace::Workspace;
use crate::models::{Boltfile, Command, CommandChain};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    #[error("invalid command: script name is empty")]
    InvalidCommand,
    #[error("invalid command in command chain: '{0}'")]
    InvalidChainCommand(String),
    #[error("command '{0}' was not available after waiting for its parse")]
    CommandUnavailable(String),
}

/// Whether `name` has exceeded its occurrence budget along one resolution path.
pub fn cycle_exceeded(recorded: &[Vec<String>], name: &str, recursion_depth: usize) -> bool {
    let count = recorded
        .iter()
        .filter(|invocation| invocation.first().map(String::as_str) == Some(name))
        .count();
    count > recursion_depth
}

/// Parses the script at `path` and registers the resulting command.
///
/// Callers racing on the same path are deduplicated through the job table: the
/// loser blocks until the winner's parse completes, then returns without
/// error. With `force` set the script is re-parsed even when the registry
/// already holds its name.
pub fn add_command(ws: &Workspace, path: &Path, force: bool) -> Result<()> {
    if ws.jobs.job_exists(path) {
        log::warn!("parse already in flight for '{}', waiting", path.display());
        ws.jobs.wait_for_job(path);
        return Ok(());
    }

    let job = match ws.jobs.try_add_job(path, false) {
        Some(job) => job,
        None => {
            // Lost the claim between the check and the insert.
            ws.jobs.wait_for_job(path);
            return Ok(());
        }
    };

    if !force {
        if let Some(name) = ws.command_name_for(path) {
            if ws.registry.contains(&name) {
                ws.jobs.remove_job(&job);
                return Ok(());
            }
        }
    }

    // Waiters must wake whether the parse succeeded or not.
    let result = new_command(ws, &job, path);
    ws.jobs.remove_job(&job);
    let command = result?;

    if !force {
        ws.completer.add_command(&command);
    }
    ws.registry.add(command.clone());
    log::debug!("added '{}' to the command registry", command.name);

    Ok(())
}

/// Creates a command from the script at `path`, resolving its chain through
/// the enclosing parse job so cycle state is shared along the whole frontier.
fn new_command(ws: &Workspace, job: &Arc<ParseJob>, path: &Path) -> Result<Arc<Command>> {
    let meta = header::parse_script(path).map_err(|e| {
        if !job.silent {
            log::debug!("parse error for '{}': {}", path.display(), e);
        }
        e
    })?;

    let args = arguments::parse_arg_defs(&meta.args)
        .with_context(|| format!("invalid argument schema in '{}'", path.display()))?;

    let parsed_chain = chain_parser::parse_chain(&meta.chain)
        .with_context(|| format!("invalid chain in '{}'", path.display()))?;
    let command_chain = get_command_chain(ws, job, &parsed_chain, None)?;

    let name = ws
        .command_name_for(path)
        .ok_or(ChainError::InvalidCommand)?;

    Ok(Arc::new(Command {
        name,
        path: Some(path.to_path_buf()),
        args,
        params: Vec::new(),
        help: meta.help,
        manual: meta.manual,
        command_chain,
        dependencies: meta.dependencies,
        outputs: meta.outputs.into_iter().map(PathBuf::from).collect(),
        async_run: meta.async_run,
        build_number: meta.build_number,
        run_command: None,
    }))
}

/// Materializes a tokenized chain into an ordered sequence of commands.
///
/// Names are looked up in the registry first; otherwise the backing script is
/// parsed (or, with a Boltfile in play, the command is synthesized from its
/// inline entry) and registered. A link carrying positional arguments yields a
/// per-invocation copy with `params` set, leaving the registry entry untouched.
pub fn get_command_chain(
    ws: &Workspace,
    job: &Arc<ParseJob>,
    parsed: &[Vec<String>],
    boltfile: Option<&Boltfile>,
) -> Result<CommandChain> {
    let mut chain: CommandChain = Vec::new();

    for link in parsed {
        let name = match link.first() {
            Some(name) => name.as_str(),
            None => continue,
        };

        if cycle_exceeded(&job.recorded(), name, ws.config.recursion_depth) {
            log::error!(
                "cycle detected: '{}' appeared more than {} time(s) along the resolution path {:?}",
                name,
                ws.config.recursion_depth,
                job.recorded()
            );
            ws.cleanup();
            std::process::exit(1);
        }
        job.record(link.clone());

        let job_path = if boltfile.is_some() {
            PathBuf::from(format!("boltfile.{}", name))
        } else {
            ws.script_path(name)
        };

        let mut command = ws.registry.lookup(name);
        if command.is_none() {
            // Waiting on the enclosing job's own path would be a self-deadlock;
            // re-parsing instead lets the cycle bound terminate the recursion.
            if ws.jobs.job_exists(&job_path) && job_path != job.path {
                log::warn!("parse already in flight for '{}', waiting", job_path.display());
                ws.jobs.wait_for_job(&job_path);
                command = ws.registry.lookup(name);
                if command.is_none() {
                    return Err(ChainError::CommandUnavailable(name.to_string()).into());
                }
            } else {
                let fresh = match boltfile {
                    Some(boltfile) => synthesize_command(ws, job, boltfile, name)?,
                    None => new_command(ws, job, &job_path)?,
                };
                ws.completer.add_command(&fresh);
                ws.registry.add(fresh.clone());
                log::debug!("added '{}' to the command registry", fresh.name);
                command = Some(fresh);
            }
        }

        let mut command = command.expect("command must be resolved at this point");
        if link.len() > 1 {
            log::debug!("setting params {:?} on '{}'", &link[1..], name);
            command = Arc::new(command.with_params(link[1..].to_vec()));
        }

        chain.push(command);
    }

    Ok(chain)
}

/// Builds a command from its Boltfile entry. The entry's own chain is resolved
/// through the same job, so the cycle bound covers inline commands too.
fn synthesize_command(
    ws: &Workspace,
    job: &Arc<ParseJob>,
    boltfile: &Boltfile,
    name: &str,
) -> Result<Arc<Command>> {
    let entry = boltfile
        .commands
        .get(name)
        .ok_or_else(|| ChainError::InvalidChainCommand(name.to_string()))?;
    let meta = entry.to_meta();

    let args = arguments::parse_arg_defs(&meta.args)
        .with_context(|| format!("invalid argument schema for Boltfile command '{}'", name))?;

    let parsed_chain = chain_parser::parse_chain(&meta.chain)
        .with_context(|| format!("invalid chain for Boltfile command '{}'", name))?;
    let command_chain = get_command_chain(ws, job, &parsed_chain, Some(boltfile))?;

    Ok(Arc::new(Command {
        name: name.to_string(),
        path: None,
        args,
        params: Vec::new(),
        help: meta.help,
        manual: meta.manual,
        command_chain,
        dependencies: meta.dependencies,
        outputs: meta.outputs.into_iter().map(PathBuf::from).collect(),
        async_run: meta.async_run,
        build_number: meta.build_number,
        run_command: meta.run,
    }))
}

/// Registers every Boltfile command that does not already exist in the
/// registry. Per-command failures are collected, not fatal.
pub fn register_boltfile(ws: &Workspace, boltfile: &Boltfile) -> Vec<(String, anyhow::Error)> {
    let mut errors = Vec::new();

    let mut names: Vec<&String> = boltfile.commands.keys().collect();
    names.sort();

    for name in names {
        if ws.registry.contains(name) {
            continue;
        }

        // A fresh job per command keeps unrelated commands out of each
        // other's cycle counts.
        let job = ws.jobs.add_job(&ws.script_dir.join(BOLTFILE_NAME), false);
        let result = get_command_chain(ws, &job, &[vec![name.clone()]], Some(boltfile));
        ws.jobs.remove_job(&job);

        if let Err(e) = result {
            errors.push((name.clone(), e));
        }
    }

    errors
}
