//! # System Interaction Layer
//!
//! This module is the boundary between the core orchestration logic and the
//! operating system.
//!
//! ## Modules
//!
//! - **`executor`**: Runs one command end to end: freshness check, dependency
//!   recursion, chain execution, argument materialization, script assembly,
//!   sub-shell spawning and process bookkeeping.
//! - **`process`**: Tracks live sub-processes for teardown and probes the
//!   liveness of detached terminal-multiplexer sessions.

pub mod executor;
pub mod process;
