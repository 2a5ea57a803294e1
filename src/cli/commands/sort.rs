//! The sort command: sort pass, cleanup pass, report.

use std::path::Path;

use crate::classifier::{CancelFlag, FileClassifier, SortContext};
use crate::cleanup::DuplicateAndBlankFilter;
use crate::config::Config;
use crate::error::{Result, ResultExt};
use crate::imaging::{ImageCrateDecoder, PixelDecoder};
use crate::metadata::{LoftyTagReader, TagReader};
use crate::organizer;
use crate::report::{REPORT_FILE_NAME, RunReport};

/// Sort `source` into `profile`, clean it, then print and save the report.
pub fn cmd_sort(source: &Path, profile: &Path, config: &Config, cancel: CancelFlag) -> anyhow::Result<()> {
    println!("Sorting {} into {}", source.display(), profile.display());

    let mut report = run_passes(
        source,
        profile,
        config,
        ImageCrateDecoder,
        LoftyTagReader,
        cancel,
    )?;
    report.finish();

    let report_path = profile.join(REPORT_FILE_NAME);
    if let Err(e) = report.save(&report_path) {
        tracing::error!(target: "cli", "Failed to save report: {}", e);
    }

    println!("\n{}", report.render());
    Ok(())
}

/// Run the sort pass and, unless interrupted, the cleanup pass.
pub fn run_passes<D, T>(
    source: &Path,
    profile: &Path,
    config: &Config,
    decoder: D,
    tags: T,
    cancel: CancelFlag,
) -> Result<RunReport>
where
    D: PixelDecoder + Clone,
    T: TagReader,
{
    if !source.is_dir() {
        return Err(crate::error::Error::not_a_directory(source));
    }
    std::fs::create_dir_all(profile)
        .with_context(format!("Failed to create profile {}", profile.display()))?;
    // Both passes and the report must agree on one spelling of the profile
    let profile = &organizer::canonical(profile)?;

    let mut ctx = SortContext::new(cancel);
    let large_size = config.sizes.show_large.then_some(config.sizes.large_size);

    tracing::info!(target: "cli", "Sort pass: {}", source.display());
    let classifier = FileClassifier::new(config, decoder.clone(), tags);
    organizer::sort_tree(source, profile, &classifier, &mut ctx, large_size)?;

    if !ctx.should_stop() {
        tracing::info!(target: "cli", "Cleanup pass: {}", profile.display());
        DuplicateAndBlankFilter::new(config, decoder).run(profile, &mut ctx)?;
    }

    Ok(ctx.report)
}
