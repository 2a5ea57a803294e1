//! CLI argument definitions and dispatch.
//!
//! The tool has a single job and no subcommands: the sort pass itself lives
//! in `sort`.

mod sort;

use clap::Parser;
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::classifier::CancelFlag;
use crate::config;

pub use sort::{cmd_sort, run_passes};

/// Sort a photorec-style recovery tree into a categorized profile.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Recovery tree to sort (e.g. the parent of the recup_dir.N folders)
    pub source: PathBuf,
    /// Profile directory receiving the sorted files
    pub profile: PathBuf,
}

/// Run both passes for the parsed arguments.
///
/// Ctrl-C is caught on the runtime and turned into a cooperative stop, so
/// the current file finishes and the report is still written.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let config = config::load();

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    rt.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(target: "cli", "Interrupt received, finishing current file");
            on_interrupt.cancel();
        }
    });

    cmd_sort(&cli.source, &cli.profile, &config, cancel)
}
