//! End-of-run summary.
//!
//! Collects running statistics while both passes execute: the largest file
//! kept per category, every unrecognized extension with one example path,
//! per-extension counts, and how the run ended.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::category::describe_extension;
use crate::error::{Result, ResultExt};
use crate::model::Category;

/// File name of the persisted report inside the profile root.
pub const REPORT_FILE_NAME: &str = "recovery-report.json";

/// How the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Completed,
    Cancelled,
}

/// Largest file kept in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LargestFile {
    pub size: u64,
    pub path: PathBuf,
}

/// An extension no category claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnknownType {
    pub extension: String,
    pub example: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
}

/// Running statistics and final summary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub largest: BTreeMap<Category, LargestFile>,
    pub unknown_types: Vec<UnknownType>,
    pub type_counts: BTreeMap<String, u64>,
    pub moved: u64,
    pub skipped: u64,
    pub duplicates_deleted: u64,
    pub blanks_quarantined: u64,
    pub errors: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    /// Every kept file by path, with its category and size
    #[serde(skip)]
    kept: HashMap<PathBuf, (Category, u64)>,
    /// Kept files per category ordered by size, so the runner-up is at hand
    /// when the largest one is deleted
    #[serde(skip)]
    by_size: BTreeMap<Category, BTreeSet<(u64, PathBuf)>>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember an unknown extension once, with its first example path.
    pub fn record_unknown(&mut self, extension: &str, source: &Path) {
        if self.unknown_types.iter().any(|u| u.extension == extension) {
            return;
        }
        self.unknown_types.push(UnknownType {
            extension: extension.to_string(),
            example: source.to_path_buf(),
            description: describe_extension(extension),
        });
    }

    /// Account for a file that was moved into the profile.
    pub fn record_moved(&mut self, category: Category, extension: &str, size: u64, destination: &Path) {
        self.moved += 1;
        *self.type_counts.entry(extension.to_string()).or_insert(0) += 1;
        self.keep(category, size, destination.to_path_buf());
    }

    /// Follow a kept file that the cleanup pass moved elsewhere.
    pub fn record_relocated(&mut self, from: &Path, to: &Path) {
        if let Some((category, size)) = self.forget(from) {
            self.keep(category, size, to.to_path_buf());
        }
    }

    /// Forget a file deleted by the cleanup pass.
    pub fn record_deleted(&mut self, path: &Path) {
        self.forget(path);
    }

    fn keep(&mut self, category: Category, size: u64, path: PathBuf) {
        self.kept.insert(path.clone(), (category, size));
        self.by_size.entry(category).or_default().insert((size, path));
        self.refresh_largest(category);
    }

    fn forget(&mut self, path: &Path) -> Option<(Category, u64)> {
        let (category, size) = self.kept.remove(path)?;
        if let Some(files) = self.by_size.get_mut(&category) {
            files.remove(&(size, path.to_path_buf()));
        }
        self.refresh_largest(category);
        Some((category, size))
    }

    fn refresh_largest(&mut self, category: Category) {
        match self.by_size.get(&category).and_then(|files| files.last()) {
            Some((size, path)) => {
                self.largest.insert(
                    category,
                    LargestFile {
                        size: *size,
                        path: path.clone(),
                    },
                );
            }
            None => {
                self.largest.remove(&category);
            }
        }
    }

    pub fn mark_cancelled(&mut self) {
        self.status = RunStatus::Cancelled;
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == RunStatus::Cancelled
    }

    /// Stamp the finish time.
    pub fn finish(&mut self) {
        self.finished_at = Some(chrono::Utc::now().to_rfc3339());
    }

    /// Human-readable summary for stdout.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Maximums:");
        for (category, largest) in &self.largest {
            let _ = writeln!(
                out,
                "  Largest in {} ({:.3} MB): {}",
                category,
                largest.size as f64 / 1024.0 / 1024.0,
                largest.path.display()
            );
        }
        let extensions: Vec<&str> = self.unknown_types.iter().map(|u| u.extension.as_str()).collect();
        let _ = writeln!(out, "unknownTypes: {:?}", extensions);
        let _ = writeln!(out, "unknownPathExamples:");
        for unknown in &self.unknown_types {
            match unknown.description {
                Some(desc) => {
                    let _ = writeln!(out, "  - {} ({})", unknown.example.display(), desc);
                }
                None => {
                    let _ = writeln!(out, "  - {}", unknown.example.display());
                }
            }
        }
        let _ = writeln!(
            out,
            "Moved {} files, skipped {}, deleted {} duplicates, quarantined {} blanks.",
            self.moved, self.skipped, self.duplicates_deleted, self.blanks_quarantined
        );
        if self.errors > 0 {
            let _ = writeln!(out, "{} files could not be moved (see log).", self.errors);
        }
        let _ = write!(
            out,
            "{}",
            match self.status {
                RunStatus::Completed => "Done.",
                RunStatus::Cancelled => "Cancelled.",
            }
        );
        out
    }

    /// Write the report as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
