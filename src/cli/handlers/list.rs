// src/cli/handlers/list.rs

use crate::cli::args::ListArgs;
use crate::core::workspace::Workspace;
use anyhow::Result;
use clap::Parser;
use colored::*;
use std::sync::Arc;

/// Entry point for the `list` command: prints every discovered command.
pub fn handle(args: Vec<String>, ws: &Arc<Workspace>) -> Result<()> {
    let list_args = ListArgs::try_parse_from(&args)?;

    let commands = ws.registry.sorted();
    if commands.is_empty() {
        println!("{}", "No commands found.".yellow());
        return Ok(());
    }

    println!("\n{} command(s):", commands.len());
    for command in &commands {
        let mut line = format!("  {}", command.name.cyan().bold());
        if command.async_run {
            line.push_str(&format!(" {}", "[async]".magenta()));
        }
        if !command.help.is_empty() {
            line.push_str(&format!("  {}", command.help.dimmed()));
        }
        println!("{}", line);
    }

    if list_args.labels {
        println!();
        for entry in ws.completer.entries() {
            if !entry.labels.is_empty() {
                println!(
                    "  {}  {}",
                    entry.name.cyan(),
                    entry.labels.join(" ").dimmed()
                );
            }
        }
    }

    Ok(())
}
