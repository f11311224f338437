// src/cli/handlers/info.rs

use crate::cli::args::InfoArgs;
use crate::core::workspace::Workspace;
use anyhow::{anyhow, Result};
use clap::Parser;
use colored::*;
use std::sync::Arc;

/// Entry point for the `info` command: dumps one command's metadata.
pub fn handle(args: Vec<String>, ws: &Arc<Workspace>) -> Result<()> {
    let info_args = InfoArgs::try_parse_from(&args)?;

    let command = ws
        .registry
        .lookup(&info_args.command)
        .ok_or_else(|| anyhow!("unknown command: '{}'", info_args.command))?;

    println!("\n{}", command.name.cyan().bold());
    if let Some(path) = &command.path {
        println!("  {} {}", "path:".dimmed(), path.display());
    } else {
        println!("  {} inline (Boltfile)", "path:".dimmed());
    }
    if !command.help.is_empty() {
        println!("  {} {}", "help:".dimmed(), command.help);
    }

    if !command.args.is_empty() {
        println!("  {}", "arguments:".dimmed());
        let mut specs: Vec<_> = command.args.values().collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        for spec in specs {
            let mut line = format!("    {} ~> {}", spec.name.green(), spec.arg_type);
            if spec.optional {
                line.push_str(" (optional");
                if let Some(default) = &spec.default_value {
                    line.push_str(&format!(", default: {}", default.trim()));
                }
                line.push(')');
            }
            println!("{}", line);
        }
    }

    if !command.command_chain.is_empty() {
        let names: Vec<&str> = command
            .command_chain
            .iter()
            .map(|link| link.name.as_str())
            .collect();
        println!("  {} {}", "chain:".dimmed(), names.join(" -> "));
    }
    if !command.dependencies.is_empty() {
        println!(
            "  {} {}",
            "dependencies:".dimmed(),
            command.dependencies.join(", ")
        );
    }
    if !command.outputs.is_empty() {
        let outputs: Vec<String> = command
            .outputs
            .iter()
            .map(|output| output.display().to_string())
            .collect();
        println!("  {} {}", "outputs:".dimmed(), outputs.join(", "));
    }

    println!("  {} {}", "async:".dimmed(), command.async_run);
    println!("  {} {}", "build number:".dimmed(), command.build_number);

    if !command.manual.is_empty() {
        println!("\n{}\n{}", "manual:".dimmed(), command.manual);
    }

    Ok(())
}
