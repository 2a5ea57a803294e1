//! Command-line interface for recovery-sorter.
//!
//! Takes a recovery tree and a profile directory, sorts everything into the
//! profile and then cleans the result.

mod commands;

pub use commands::{Cli, run_command, run_passes};
