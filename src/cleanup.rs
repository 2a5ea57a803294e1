//! Second pass over the sorted profile: blank and duplicate removal.
//!
//! Each directory is processed on its own, files in ascending size order
//! (name breaks ties) so that equal-size candidates sit next to each other.
//! Every file is compared only with the previously kept file of the same
//! directory, the baseline. Duplicates are deleted and never become the
//! baseline; blanks go to `Backup/blank` and do.
//!
//! Within one directory the pass is strictly sequential.

use image::RgbaImage;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::category::category_for;
use crate::classifier::SortContext;
use crate::config::{Config, SizeConfig};
use crate::error::{Result, ResultExt};
use crate::imaging::{BlankDetector, PixelDecoder, pixels_identical};
use crate::model::{Category, DiscardReason, Disposition, QuarantineReason, lower_extension};
use crate::organizer::{move_file, resolve_collision};
use crate::sanitize::{is_clean, sanitize};

/// Previously kept file of the directory being cleaned.
struct Baseline {
    path: PathBuf,
    size: u64,
    pixels: Option<RgbaImage>,
}

/// Per-file verdict plus the decoded pixels, kept for the next comparison.
struct Verdict {
    disposition: Disposition,
    pixels: Option<RgbaImage>,
}

/// Removes blanks and exact duplicates from a sorted profile.
pub struct DuplicateAndBlankFilter<D> {
    blank: BlankDetector,
    sizes: SizeConfig,
    done_names: Vec<String>,
    decoder: D,
}

impl<D: PixelDecoder> DuplicateAndBlankFilter<D> {
    pub fn new(config: &Config, decoder: D) -> Self {
        Self {
            blank: BlankDetector::new(&config.images),
            sizes: config.sizes.clone(),
            done_names: config.cleanup.done_names.clone(),
            decoder,
        }
    }

    /// Clean every directory under `profile`, skipping the pass's own
    /// output folders.
    pub fn run(&self, profile: &Path, ctx: &mut SortContext) -> Result<()> {
        let directories: Vec<PathBuf> = WalkDir::new(profile)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_done_dir(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.into_path())
            .collect();

        for dir in directories {
            if ctx.should_stop() {
                tracing::warn!(target: "cleanup", "Interrupted, stopping cleanup pass");
                break;
            }
            if let Err(e) = self.clean_dir(&dir, profile, ctx) {
                tracing::error!(target: "cleanup", "Failed to clean {}: {}", dir.display(), e);
                ctx.report.errors += 1;
            }
        }
        Ok(())
    }

    fn is_done_dir(&self, entry: &walkdir::DirEntry) -> bool {
        entry.file_type().is_dir()
            && self
                .done_names
                .iter()
                .any(|name| entry.file_name() == name.as_str())
    }

    /// Clean the files directly inside one directory.
    pub fn clean_dir(&self, dir: &Path, profile: &Path, ctx: &mut SortContext) -> Result<()> {
        tracing::info!(target: "cleanup", "Checking for blanks in: {}", dir.display());

        let mut files: Vec<(u64, PathBuf)> = Vec::new();
        for entry in std::fs::read_dir(dir).with_context(format!("Failed to list {}", dir.display()))? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            if metadata.is_file() {
                files.push((metadata.len(), entry.path()));
            }
        }
        files.sort();

        let blank_dir = profile.join(Category::Backup.folder_path()).join(QuarantineReason::Blank.folder_name());
        let mut baseline: Option<Baseline> = None;

        for (size, path) in files {
            if ctx.should_stop() {
                return Ok(());
            }

            let verdict = self.inspect(&path, size, baseline.as_ref());
            let kept_at = match verdict.disposition {
                Disposition::Discard(DiscardReason::Duplicate) => {
                    tracing::info!(target: "cleanup", path = %path.display(), "Removing duplicate");
                    std::fs::remove_file(&path)
                        .with_context(format!("Failed to remove {}", path.display()))?;
                    ctx.report.duplicates_deleted += 1;
                    ctx.report.record_deleted(&path);
                    continue;
                }
                Disposition::Quarantine(_) => {
                    let destination = resolve_collision(&blank_dir.join(sanitized_name(&path)));
                    tracing::info!(target: "cleanup", from = %path.display(), to = %destination.display(), "Quarantining blank");
                    move_file(&path, &destination)?;
                    ctx.report.blanks_quarantined += 1;
                    ctx.report.record_relocated(&path, &destination);
                    destination
                }
                Disposition::Keep => self.rename_if_dirty(&path, ctx)?,
            };

            baseline = Some(Baseline {
                path: kept_at,
                size,
                pixels: verdict.pixels,
            });
        }
        Ok(())
    }

    /// Decide blank / duplicate / keep for one file against the baseline.
    fn inspect(&self, path: &Path, size: u64, baseline: Option<&Baseline>) -> Verdict {
        let category = category_for(&lower_extension(path));
        if category == Some(Category::Pictures) {
            tracing::debug!(
                target: "cleanup",
                "Checking pixels in {:.2} MB '{}'...",
                size as f64 / 1024.0 / 1024.0,
                path.display()
            );
            match self.decoder.decode(path) {
                Ok(image) => {
                    let duplicate = baseline
                        .and_then(|b| b.pixels.as_ref())
                        .is_some_and(|prev| pixels_identical(prev, &image));
                    let disposition = if duplicate {
                        Disposition::Discard(DiscardReason::Duplicate)
                    } else if self.blank.is_blank(&image) {
                        Disposition::Quarantine(QuarantineReason::Blank)
                    } else {
                        Disposition::Keep
                    };
                    return Verdict {
                        disposition,
                        pixels: Some(image),
                    };
                }
                Err(e) => {
                    // Possibly a valid format the decoder lacks; compare bytes instead
                    tracing::debug!(target: "cleanup", "{}", e);
                }
            }
        }

        let undersized = category
            .and_then(|c| self.sizes.min_valid_size(c))
            .is_some_and(|min| size < min);
        let disposition = match baseline {
            Some(prev) if self.same_bytes_candidate(prev, size) && files_identical(&prev.path, path) => {
                Disposition::Discard(DiscardReason::Duplicate)
            }
            _ if undersized => Disposition::Quarantine(QuarantineReason::Blank),
            _ => Disposition::Keep,
        };
        Verdict {
            disposition,
            pixels: None,
        }
    }

    fn same_bytes_candidate(&self, prev: &Baseline, size: u64) -> bool {
        prev.size == size && size <= self.sizes.max_comparison_size
    }

    /// Rename a kept file in place when its name is not filesystem-safe.
    fn rename_if_dirty(&self, path: &Path, ctx: &mut SortContext) -> Result<PathBuf> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if is_clean(&name) {
            return Ok(path.to_path_buf());
        }
        let destination = resolve_collision(&path.with_file_name(sanitize(&name)));
        move_file(path, &destination)?;
        ctx.report.record_relocated(path, &destination);
        Ok(destination)
    }
}

fn sanitized_name(path: &Path) -> String {
    path.file_name()
        .map(|n| sanitize(&n.to_string_lossy()))
        .unwrap_or_default()
}

/// Full byte-for-byte comparison. Read errors count as "different".
pub fn files_identical(a: &Path, b: &Path) -> bool {
    match compare_files(a, b) {
        Ok(same) => same,
        Err(e) => {
            tracing::warn!(target: "cleanup", "Could not compare {} and {}: {}", a.display(), b.display(), e);
            false
        }
    }
}

fn compare_files(a: &Path, b: &Path) -> io::Result<bool> {
    let file_a = File::open(a)?;
    let file_b = File::open(b)?;
    if file_a.metadata()?.len() != file_b.metadata()?.len() {
        return Ok(false);
    }

    let mut reader_a = BufReader::new(file_a);
    let mut reader_b = BufReader::new(file_b);
    let mut buf_a = vec![0u8; 64 * 1024];
    let mut buf_b = vec![0u8; 64 * 1024];
    loop {
        let read = read_full(&mut reader_a, &mut buf_a)?;
        if read_full(&mut reader_b, &mut buf_b[..read])? != read || buf_a[..read] != buf_b[..read] {
            return Ok(false);
        }
        if read == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the reader allows, returning the byte count.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
