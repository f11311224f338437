// src/cli/handlers/run.rs

use crate::cli::args::RunArgs;
use crate::core::{driver, workspace::Workspace};
use anyhow::{bail, Result};
use clap::Parser;
use colored::*;
use std::sync::Arc;

/// Entry point for the `run` command: executes a chain spec.
pub fn handle(args: Vec<String>, ws: &Arc<Workspace>) -> Result<()> {
    let run_args = RunArgs::try_parse_from(&args)?;
    let chain = run_args.chain.join(" ");
    if chain.trim().is_empty() {
        bail!("no command chain given");
    }

    println!("\n{} {}", "⚡ Running".yellow().bold(), chain.cyan());

    let failures = driver::execute_chain(ws, &chain)?;
    if failures > 0 {
        bail!("{} chain link(s) failed", failures);
    }

    println!(
        "\n{} chain '{}' completed.",
        "Success:".green().bold(),
        chain.cyan()
    );
    Ok(())
}
