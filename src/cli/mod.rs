//! # Command-Line Interface
//!
//! The top-level `Cli` struct captures the entire argument sequence and hands
//! it to the `dispatcher`, which routes to a builtin handler or falls back to
//! treating the input as a command chain. Handlers live one file per builtin
//! under `handlers/`.

use clap::Parser;

pub mod args;
pub mod dispatcher;
pub mod handlers;

/// The root of the command-line interface.
///
/// No subcommands are declared at this level: the raw arguments are passed to
/// the dispatcher, which implements a small implicit grammar (`bolt build`
/// runs the chain `build` unless `build` is a builtin name).
#[derive(Parser, Debug)]
#[command(version, about, disable_help_subcommand = true)]
pub struct Cli {
    /// The full argument sequence, interpreted by the dispatcher.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
