//! Core data models for recovery sorting.
//!
//! Defines [`RecoveredFile`], the [`Category`] buckets, and the per-file
//! [`ClassificationDecision`] handed from the classifier to the mover.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt};

/// A file produced by a data-carving tool.
///
/// Read once from the filesystem and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveredFile {
    /// Absolute source path (identity)
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Lowercased extension without the dot, may be empty
    pub extension: String,
    /// Raw file name as found on disk
    pub file_name: String,
}

impl RecoveredFile {
    /// Stat a file and capture its identity.
    pub fn from_path(path: &Path) -> Result<Self> {
        let size = std::fs::metadata(path)
            .with_context(format!("Failed to stat {}", path.display()))?
            .len();
        Ok(Self::with_size(path, size))
    }

    /// Build a record with a known size (no filesystem access).
    pub fn with_size(path: &Path, size: u64) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            size,
            extension: lower_extension(path),
            file_name,
        }
    }
}

/// Lowercased extension of a path, or an empty string.
pub fn lower_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Coarse content-type bucket driving destination folder choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Backup,
    Documents,
    PlainText,
    Downloads,
    Torrents,
    #[serde(rename = "eBooks")]
    EBooks,
    Links,
    Meshes,
    Music,
    Pictures,
    Playlists,
    Shortcuts,
    Videos,
    Unknown,
}

impl Category {
    /// Destination folder segments relative to the profile root.
    ///
    /// Several categories share a root (Playlists live with Music).
    pub fn folder(&self) -> &'static [&'static str] {
        match self {
            Category::Backup => &["Backup"],
            Category::Documents => &["Documents"],
            Category::PlainText => &["Documents", "plaintext"],
            Category::Downloads => &["Downloads"],
            Category::Torrents => &["Downloads", "torrents"],
            Category::EBooks => &["Documents", "eBooks"],
            Category::Links => &["Favorites"],
            Category::Meshes => &["Meshes"],
            Category::Music | Category::Playlists => &["Music"],
            Category::Pictures => &["Pictures"],
            Category::Shortcuts => &["Shortcuts"],
            Category::Videos => &["Videos"],
            Category::Unknown => &["Backup", "unknown"],
        }
    }

    /// Destination folder as a relative path.
    pub fn folder_path(&self) -> PathBuf {
        self.folder().iter().collect()
    }

    /// Configuration key for this category.
    pub fn name(&self) -> &'static str {
        match self {
            Category::Backup => "Backup",
            Category::Documents => "Documents",
            Category::PlainText => "PlainText",
            Category::Downloads => "Downloads",
            Category::Torrents => "Torrents",
            Category::EBooks => "eBooks",
            Category::Links => "Links",
            Category::Meshes => "Meshes",
            Category::Music => "Music",
            Category::Pictures => "Pictures",
            Category::Playlists => "Playlists",
            Category::Shortcuts => "Shortcuts",
            Category::Videos => "Videos",
            Category::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Low-confidence bucket a file is parked in instead of its main folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuarantineReason {
    /// Known thumbnail dimensions, too few pixels, or undersized for the category
    Thumbnail,
    /// Image header could not be decoded
    Unusable,
    /// Uniform or mostly transparent image
    Blank,
    /// Music file without usable tags
    Untagged,
}

impl QuarantineReason {
    /// Subfolder name of the bucket.
    pub fn folder_name(&self) -> &'static str {
        match self {
            QuarantineReason::Thumbnail => "thumbnails",
            QuarantineReason::Unusable => "unusable",
            QuarantineReason::Blank => "blank",
            QuarantineReason::Untagged => "misc",
        }
    }
}

/// Why a file is deleted outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscardReason {
    /// Exact content duplicate of the previous kept sibling
    Duplicate,
}

/// What happens to a classified file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Keep,
    Quarantine(QuarantineReason),
    Discard(DiscardReason),
}

/// Why a file is left where it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoExtension,
    IgnoredExtension(String),
    IgnoredName(String),
}

/// Output of the classifier for one file.
///
/// Produced fresh per file, consumed immediately by the mover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationDecision {
    pub category: Category,
    /// Destination directory relative to the profile root
    pub subpath: PathBuf,
    /// Final sanitized file name
    pub file_name: String,
    pub disposition: Disposition,
}

impl ClassificationDecision {
    /// Destination path under the given profile root.
    pub fn destination(&self, profile: &Path) -> PathBuf {
        profile.join(&self.subpath).join(&self.file_name)
    }
}

/// Result of classifying one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Leave the file untouched
    Skip(SkipReason),
    /// Move the file according to the decision
    Sort(ClassificationDecision),
}
