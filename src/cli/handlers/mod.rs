//! # Command Handlers
//!
//! One module per builtin command. Each file contains the `handle` entry point
//! for that command along with its `clap` argument struct.

pub mod info;
pub mod list;
pub mod run;
