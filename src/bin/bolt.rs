// src/bin/bolt.rs

use anyhow::{Context, Result};
use bolt::{
    cli::{dispatcher, Cli},
    core::{discovery, workspace::Workspace},
};
use clap::Parser;
use colored::*;

/// The main entry point of the `bolt` application.
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(e) = run_cli(Cli::parse()) {
        // --- Graceful handling for clap's informational exits (`--help`, `--version`) ---
        if let Some(clap_err) = e.downcast_ref::<clap::Error>() {
            // `use_stderr()` distinguishes informational exits (--help, print to
            // stdout, exit 0) from actual parsing errors.
            if !clap_err.use_stderr() {
                clap_err.print().expect("Failed to print clap help/version");
                std::process::exit(0);
            }
        }

        eprintln!("\n{}: {}", "Error".red().bold(), e);
        let mut causes = e.chain().skip(1);
        if let Some(cause) = causes.next() {
            eprintln!("\nCaused by:");
            eprintln!("   0: {}", cause);
            for (i, cause) in causes.enumerate() {
                eprintln!("   {}: {}", i + 1, cause);
            }
        }
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<()> {
    let root = std::env::current_dir().context("failed to determine the current directory")?;
    let ws = Workspace::open(&root)?;

    let summary = discovery::find_commands(&ws)?;
    log::debug!(
        "initialized {} command(s) in {:?}",
        summary.commands,
        summary.elapsed
    );
    if !summary.errors.is_empty() {
        eprintln!(
            "{}: {} script(s) failed to parse, see the log for details",
            "Warning".yellow().bold(),
            summary.errors.len()
        );
    }

    dispatcher::dispatch(cli.args, &ws)
}
