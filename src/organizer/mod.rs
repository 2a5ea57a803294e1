//! File placement and the sort pass.
//!
//! Moves recovered files into the profile according to the classifier's
//! decisions. No file is ever overwritten: every destination goes through
//! [`resolve_collision`] first.
//!
//! The existence check and the move are two steps, so two movers racing
//! onto the same directory could still collide. The traversal here is
//! single threaded.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::classifier::{FileClassifier, SortContext};
use crate::error::{Error, Result, ResultExt};
use crate::imaging::PixelDecoder;
use crate::metadata::TagReader;
use crate::model::{Classification, ClassificationDecision, RecoveredFile};

/// Return `desired` if nothing exists there, otherwise the first free
/// `<stem> [n].<ext>` sibling.
pub fn resolve_collision(desired: &Path) -> PathBuf {
    if !exists(desired) {
        return desired.to_path_buf();
    }

    let parent = desired.parent().unwrap_or_else(|| Path::new(""));
    let stem = desired
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = desired.extension().map(|e| e.to_string_lossy().into_owned());

    let mut try_num = 1u32;
    loop {
        let name = match &ext {
            Some(ext) => format!("{stem} [{try_num}].{ext}"),
            None => format!("{stem} [{try_num}]"),
        };
        let candidate = parent.join(name);
        if !exists(&candidate) {
            return candidate;
        }
        try_num += 1;
    }
}

fn exists(path: &Path) -> bool {
    // Broken symlinks count as taken
    path.symlink_metadata().is_ok()
}

/// Move a file, creating parent directories as needed.
///
/// Falls back to copy + delete when a rename crosses devices.
pub fn move_file(source: &Path, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(format!("Failed to create directory: {:?}", parent))?;
    }

    if let Err(_e) = fs::rename(source, destination) {
        fs::copy(source, destination)
            .with_context(format!("Failed to copy file to: {:?}", destination))?;
        fs::remove_file(source)
            .with_context(format!("Failed to remove source file: {:?}", source))?;
    }
    Ok(())
}

/// Move a classified file to its final, collision-free destination.
pub fn commit(
    file: &RecoveredFile,
    decision: &ClassificationDecision,
    profile: &Path,
    ctx: &mut SortContext,
    large_size: Option<u64>,
) -> Result<PathBuf> {
    let destination = resolve_collision(&decision.destination(profile));
    tracing::info!(target: "sort", from = %file.path.display(), to = %destination.display(), "Moving");
    move_file(&file.path, &destination)?;

    if large_size.is_some_and(|limit| file.size > limit) {
        tracing::info!(
            target: "sort",
            "{:.3}MB: {}",
            file.size as f64 / 1024.0 / 1024.0,
            destination.display()
        );
    }
    ctx.report
        .record_moved(decision.category, &file.extension, file.size, &destination);
    Ok(destination)
}

/// Resolve a path that must exist to its absolute, symlink-free form.
pub fn canonical(path: &Path) -> Result<PathBuf> {
    path.canonicalize()
        .with_context(format!("Failed to resolve {}", path.display()))
}

/// Walk the recovery tree depth first and sort every file into `profile`.
///
/// Stops between files once the context's cancel flag is raised. A profile
/// nested inside the source tree is never descended into.
pub fn sort_tree<D: PixelDecoder, T: TagReader>(
    source: &Path,
    profile: &Path,
    classifier: &FileClassifier<D, T>,
    ctx: &mut SortContext,
    large_size: Option<u64>,
) -> Result<()> {
    if !source.is_dir() {
        return Err(Error::not_a_directory(source));
    }
    fs::create_dir_all(profile)
        .with_context(format!("Failed to create profile {}", profile.display()))?;
    // Compare canonical forms so "." or ".." in either path can't hide the profile
    let source = canonical(source)?;
    let profile = canonical(profile)?;

    let walker = WalkDir::new(&source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.path().starts_with(&profile));

    for entry in walker {
        if ctx.should_stop() {
            tracing::warn!(target: "sort", "Interrupted, stopping sort pass");
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(target: "sort", "Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let file = match RecoveredFile::from_path(entry.path()) {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(target: "sort", "{}", e);
                continue;
            }
        };

        match classifier.classify(&file, ctx) {
            Classification::Skip(reason) => {
                tracing::debug!(target: "sort", path = %file.path.display(), ?reason, "Leaving in place");
                ctx.report.skipped += 1;
            }
            Classification::Sort(decision) => {
                if let Err(e) = commit(&file, &decision, &profile, ctx, large_size) {
                    tracing::error!(target: "sort", "Failed to move {}: {}", file.path.display(), e);
                    ctx.report.errors += 1;
                }
            }
        }
    }
    Ok(())
}
