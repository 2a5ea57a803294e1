//! Recovery Sorter - triage for photorec-style file recovery output.
//!
//! Sorts a tree of recovered files into a categorized profile, routes
//! thumbnails, unusable images and untagged music into quarantine folders,
//! then removes blank images and exact duplicates.

pub mod category;
pub mod classifier;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod error;
pub mod imaging;
pub mod metadata;
pub mod model;
pub mod music;
pub mod organizer;
pub mod report;
pub mod sanitize;
#[cfg(test)]
pub mod test_utils;

use clap::{CommandFactory, Parser};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Targets used by the `target:` log calls across the crate.
const LOG_TARGETS: &[&str] = &["cli", "config", "sort", "cleanup", "music"];

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let mut filter = EnvFilter::new("recovery_sorter=info");
            for target in LOG_TARGETS {
                filter = filter.add_directive(format!("{target}=info").parse()?);
            }
            filter
        }
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();

    if let Err(e) = cli::run_command(&args) {
        if let Some(err) = e.downcast_ref::<error::Error>()
            && matches!(err, error::Error::NotADirectory(_))
        {
            eprintln!("{err}\n");
            let _ = cli::Cli::command().print_help();
            std::process::exit(1);
        }
        return Err(e);
    }
    Ok(())
}
