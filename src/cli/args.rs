// src/cli/args.rs
use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Executes a command chain.")]
pub struct RunArgs {
    /// The chain to execute, e.g. `clean -> build target=release`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub chain: Vec<String>,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Lists the discovered commands.")]
pub struct ListArgs {
    /// Also show the argument completion stubs for each command.
    #[arg(long, short)]
    pub labels: bool,
}

#[derive(Parser, Debug, Default)]
#[command(no_binary_name = true, about = "Shows everything known about one command.")]
pub struct InfoArgs {
    /// The name of the command to inspect.
    pub command: String,
}
