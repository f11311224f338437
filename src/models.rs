//! # Data Models
//!
//! This module defines the core data structures used throughout the application,
//! organized into three main categories:
//!
//! 1.  **Runtime Command Models**: `Command` and its argument schema (`ArgSpec`,
//!     `ArgType`) are the resolved, executable representation of a script. They are
//!     produced by the chain resolver and consumed by the executor.
//!
//! 2.  **Script Metadata Models**: `ScriptMeta` is the decoded form of a script's
//!     comment header (or of one `Boltfile` entry). It is the raw material the
//!     resolver turns into a `Command`.
//!
//! 3.  **User-Facing TOML Models**: `RunnerConfig` and the `Boltfile` structs map
//!     directly to the TOML files a user can write under `.bolt/`. They use
//!     `deny_unknown_fields` so typos in keys are caught as errors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// An ordered sequence of commands executed before a command's own body.
pub type CommandChain = Vec<Arc<Command>>;

// =========================================================================
// === 1. RUNTIME COMMAND MODELS
// =========================================================================

/// The primitive type an argument value must lexically parse as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    Bool,
    Int,
    Float,
    String,
}

impl ArgType {
    /// Maps a declared type keyword to its `ArgType`.
    pub fn from_keyword(keyword: &str) -> Option<ArgType> {
        match keyword {
            "bool" => Some(ArgType::Bool),
            "int" => Some(ArgType::Int),
            "float" => Some(ArgType::Float),
            "string" => Some(ArgType::String),
            _ => None,
        }
    }

    /// The textual zero emitted for an unbound optional argument without a default.
    pub fn zero_value(&self) -> &'static str {
        match self {
            ArgType::Bool => "false",
            ArgType::Int => "0",
            ArgType::Float => "0.0",
            ArgType::String => "",
        }
    }

    /// Checks whether `value` lexically parses as this type.
    pub fn validates(&self, value: &str) -> bool {
        match self {
            ArgType::Bool => value.parse::<bool>().is_ok(),
            ArgType::Int => value.parse::<i64>().is_ok(),
            ArgType::Float => value.parse::<f64>().is_ok(),
            ArgType::String => true,
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            ArgType::Bool => "bool",
            ArgType::Int => "int",
            ArgType::Float => "float",
            ArgType::String => "string",
        };
        write!(f, "{}", keyword)
    }
}

/// One entry of a command's declared argument schema.
///
/// The schema is a pure template: call-site bindings are never stored here, they
/// live in a map local to one binding pass. This keeps a command reusable across
/// invocations without any reset step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    /// The argument label.
    pub name: String,
    /// The primitive type the value must parse as.
    pub arg_type: ArgType,
    /// Optional arguments may be omitted at the call site.
    pub optional: bool,
    /// Textual default, permitted only on optional arguments.
    pub default_value: Option<String>,
}

/// A resolved, executable command backed by a script file or an inline body.
#[derive(Debug, Clone, Default)]
pub struct Command {
    /// The command name (script basename minus extension, or Boltfile key).
    pub name: String,
    /// Path of the backing script. `None` for Boltfile-origin commands, whose
    /// body lives in `run_command`.
    pub path: Option<PathBuf>,
    /// Declared argument schema, keyed by label.
    pub args: HashMap<String, ArgSpec>,
    /// Positional arguments pre-bound when this command appears as a chain link.
    /// Non-empty params take precedence over call-site arguments.
    pub params: Vec<String>,
    /// Short help text.
    pub help: String,
    /// Manual text.
    pub manual: String,
    /// Commands executed before this command's own body.
    pub command_chain: CommandChain,
    /// Dependency specs of the form `"name [arg ...]"`. A dependency runs only
    /// if any of its declared outputs is missing.
    pub dependencies: Vec<String>,
    /// Output paths. If one already exists the command is skipped.
    pub outputs: Vec<PathBuf>,
    /// Detach into a terminal-multiplexer session instead of running inline.
    pub async_run: bool,
    /// Increment the persisted build counter on every run.
    pub build_number: bool,
    /// Inline script body (Boltfile origin), empty otherwise.
    pub run_command: Option<String>,
}

impl Command {
    /// Produces the per-invocation copy used when a chain link carries positional
    /// parameters, so the shared registry entry is never mutated.
    ///
    /// Only name, path, schema, help, manual, chain and the build-number flag are
    /// carried; `async_run`, `dependencies`, `outputs` and the inline body reset
    /// to their zero values on the copy.
    pub fn with_params(&self, params: Vec<String>) -> Command {
        Command {
            name: self.name.clone(),
            path: self.path.clone(),
            args: self.args.clone(),
            params,
            help: self.help.clone(),
            manual: self.manual.clone(),
            command_chain: self.command_chain.clone(),
            build_number: self.build_number,
            ..Command::default()
        }
    }
}

// =========================================================================
// === 2. SCRIPT METADATA MODELS
// =========================================================================

/// The decoded metadata record of one script header or Boltfile entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptMeta {
    /// Argument schema string, e.g. `"target:string, release:bool?"`.
    pub args: String,
    /// Chain spec string, e.g. `"clean -> generate"`.
    pub chain: String,
    /// Short help text.
    pub help: String,
    /// Manual text.
    pub manual: String,
    /// Increment the persisted build counter on every run.
    pub build_number: bool,
    /// Dependency specs, each `"name [arg ...]"`.
    pub dependencies: Vec<String>,
    /// Declared output paths.
    pub outputs: Vec<String>,
    /// Detach into a terminal-multiplexer session.
    pub async_run: bool,
    /// Inline script body (Boltfile entries only).
    pub run: Option<String>,
}

// =========================================================================
// === 3. USER-FACING TOML MODELS
// =========================================================================

/// The `.bolt/config.toml` configuration record.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    /// Pass the interpreter's stop-on-first-failure flag (`-e`).
    pub stop_on_error: bool,
    /// Print the assembled script with line numbers when it fails.
    pub dump_script_on_error: bool,
    /// Print every assembled script before running it.
    pub debug: bool,
    /// Maximum number of times a single command name may appear along one
    /// chain-resolution path before it is treated as a cycle.
    pub recursion_depth: usize,
    /// The shell interpreter used to run generated scripts.
    pub interpreter: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            stop_on_error: false,
            dump_script_on_error: true,
            debug: false,
            recursion_depth: 1,
            interpreter: "sh".to_string(),
        }
    }
}

/// Represents the top-level structure of a `Boltfile`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Boltfile {
    /// A map from command name to its inline definition.
    #[serde(default)]
    pub commands: HashMap<String, BoltfileCommand>,
}

/// One inline command definition inside a `Boltfile`.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default, deny_unknown_fields)]
pub struct BoltfileCommand {
    /// Argument schema string.
    pub args: String,
    /// Chain spec string.
    pub chain: String,
    /// Short help text.
    pub help: String,
    /// Manual text.
    pub manual: String,
    /// Increment the persisted build counter on every run.
    pub build_number: bool,
    /// Dependency specs.
    pub dependencies: Vec<String>,
    /// Declared output paths.
    pub outputs: Vec<String>,
    /// Detach into a terminal-multiplexer session.
    #[serde(rename = "async")]
    pub async_run: bool,
    /// The inline script body.
    pub run: String,
}

impl BoltfileCommand {
    /// Lowers a Boltfile entry to the common metadata record.
    pub fn to_meta(&self) -> ScriptMeta {
        ScriptMeta {
            args: self.args.clone(),
            chain: self.chain.clone(),
            help: self.help.clone(),
            manual: self.manual.clone(),
            build_number: self.build_number,
            dependencies: self.dependencies.clone(),
            outputs: self.outputs.clone(),
            async_run: self.async_run,
            run: Some(self.run.clone()),
        }
    }
}
