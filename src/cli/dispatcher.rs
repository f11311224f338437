//! # Command Dispatcher
//!
//! Routes the raw argument sequence to a builtin handler. The rules, in order
//! of precedence:
//!
//! 1.  **Builtin action**: `bolt <action> [args...]` when `<action>` is a
//!     registered builtin (`run`, `list`, `info`).
//! 2.  **Implicit chain**: anything else is treated as a chain spec and handed
//!     to the `run` handler, so `bolt build -> package` just works.

use crate::cli::handlers;
use crate::core::workspace::Workspace;
use anyhow::Result;
use std::sync::Arc;

/// Defines a builtin command, its aliases, and its handler.
struct CommandDefinition {
    name: &'static str,
    aliases: &'static [&'static str],
    handler: fn(Vec<String>, &Arc<Workspace>) -> Result<()>,
}

/// The single source of truth for all builtin commands.
static COMMAND_REGISTRY: &[CommandDefinition] = &[
    CommandDefinition {
        name: "run",
        aliases: &[],
        handler: handlers::run::handle,
    },
    CommandDefinition {
        name: "list",
        aliases: &["ls"],
        handler: handlers::list::handle,
    },
    CommandDefinition {
        name: "info",
        aliases: &[],
        handler: handlers::info::handle,
    },
];

/// Finds a builtin definition by its name or alias.
fn find_command(name: &str) -> Option<&'static CommandDefinition> {
    COMMAND_REGISTRY
        .iter()
        .find(|command| command.name == name || command.aliases.contains(&name))
}

/// Routes the argument sequence to the matching handler.
pub fn dispatch(all_args: Vec<String>, ws: &Arc<Workspace>) -> Result<()> {
    log::debug!("dispatching args: {:?}", all_args);

    if all_args.is_empty() {
        // No arguments: show what the project offers.
        return handlers::list::handle(vec![], ws);
    }

    if let Some(command) = find_command(&all_args[0]) {
        let handler_args = all_args.into_iter().skip(1).collect();
        return (command.handler)(handler_args, ws);
    }

    // Implicit chain: hand everything to `run`.
    handlers::run::handle(all_args, ws)
}
