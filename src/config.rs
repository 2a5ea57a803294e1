//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\recovery-sorter\config.toml
//! - macOS: ~/Library/Application Support/recovery-sorter/config.toml
//! - Linux: ~/.config/recovery-sorter/config.toml
//!
//! Every threshold used by the classifiers lives here. A missing or broken
//! file is never fatal: defaults reproduce the stock heuristics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::model::Category;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which files are left untouched
    pub filters: FilterConfig,

    /// Image heuristics
    pub images: ImageConfig,

    /// Size thresholds
    pub sizes: SizeConfig,

    /// Cleanup pass settings
    pub cleanup: CleanupConfig,
}

/// Skip rules applied before categorization
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Leave files without an extension in place
    pub skip_extensionless: bool,

    /// Extensions skipped in addition to the built-in system types
    pub extra_ignored_extensions: Vec<String>,

    /// Whole file names that are skipped
    pub ignored_names: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            skip_extensionless: true,
            extra_ignored_extensions: ["zip", "gz", "html", "htm", "mmw", "php"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ignored_names: vec!["user".to_string()],
        }
    }
}

/// Image heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Images with at most this many pixels are thumbnails
    pub min_non_thumbnail_pixels: u64,

    /// Exact (width, height) pairs produced by thumbnail generators
    pub known_thumbnail_sizes: Vec<(u32, u32)>,

    /// Pixels with alpha below this count as clear
    pub clear_alpha_threshold: u8,

    /// Fraction of clear pixels above which an image is blank
    pub clear_ratio_max: f64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            // 170x330 is an HP setup image and must survive
            min_non_thumbnail_pixels: 150 * 199 + 1,
            known_thumbnail_sizes: vec![
                (160, 120),
                (200, 200),
                (264, 318),
                (218, 145),
                (100, 100),
                (158, 158),
                (53, 53),
            ],
            clear_alpha_threshold: 128,
            clear_ratio_max: 0.9,
        }
    }
}

/// Size thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeConfig {
    /// Minimum plausible size per category name; smaller files are thumbnails
    pub min_valid_sizes: BTreeMap<String, u64>,

    /// Byte-for-byte duplicate comparison is skipped above this size
    pub max_comparison_size: u64,

    /// Files above this size are listed when `show_large` is set
    pub large_size: u64,

    /// Log every moved file larger than `large_size`
    pub show_large: bool,
}

impl Default for SizeConfig {
    fn default() -> Self {
        let mut min_valid_sizes = BTreeMap::new();
        min_valid_sizes.insert(Category::Videos.name().to_string(), 40 * 1024);
        min_valid_sizes.insert(Category::Music.name().to_string(), 1_024_000);
        Self {
            min_valid_sizes,
            max_comparison_size: 2 * 1024 * 1024,
            large_size: 1_024_000,
            show_large: false,
        }
    }
}

impl SizeConfig {
    /// Minimum valid size configured for a category, if any.
    pub fn min_valid_size(&self, category: Category) -> Option<u64> {
        self.min_valid_sizes.get(category.name()).copied()
    }
}

/// Cleanup pass settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Directory names produced by the passes themselves; never descended into
    pub done_names: Vec<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            done_names: ["blank", "duplicates", "thumbnails", "unusable"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("recovery-sorter"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the OS config directory
///
/// Returns default config if the file doesn't exist or can't be parsed.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!(target: "config", "Could not determine config directory, using defaults");
        return Config::default();
    };
    load_from(&path)
}

/// Load configuration from an explicit path, falling back to defaults
pub fn load_from(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!(target: "config", "No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => {
                tracing::info!(target: "config", "Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                tracing::error!(target: "config", "Failed to parse config file {:?}: {}", path, e);
                tracing::warn!(target: "config", "Using default configuration");
                Config::default()
            }
        },
        Err(e) => {
            tracing::error!(target: "config", "Failed to read config file {:?}: {}", path, e);
            Config::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
