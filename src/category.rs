//! Extension-to-category resolution.
//!
//! The extension tables are disjoint by construction; a test guards that.
//! Extensions in the ignore set (system binaries, fonts, web fragments) are
//! skipped entirely, which is different from [`Category::Unknown`]: unknown
//! files are still moved into `Backup/unknown`.

use std::collections::HashSet;

use crate::config::FilterConfig;
use crate::model::{Category, RecoveredFile, SkipReason};

/// Extensions recognized per category.
const CATEGORY_TABLE: &[(Category, &[&str])] = &[
    (
        Category::Backup,
        &["7z", "accdb", "dbx", "idx", "mbox", "mdb", "pst", "sqlite", "tar", "wab", "zip"],
    ),
    (
        Category::Documents,
        &[
            "ai", "csv", "doc", "docx", "mpp", "pdf", "ppt", "pptx", "ps", "rtf", "wpd", "wps",
            "xls", "xlsx", "xlr",
        ],
    ),
    (Category::PlainText, &["txt"]),
    (Category::Downloads, &["bin", "cue", "iso"]),
    (Category::Torrents, &["torrent"]),
    (Category::EBooks, &["prc", "lit"]),
    (Category::Links, &["url", "website"]),
    (Category::Meshes, &["x3d"]),
    (
        Category::Music,
        &["ape", "flac", "m4a", "mid", "mp3", "ogg", "wav", "wma"],
    ),
    (
        Category::Pictures,
        &["bmp", "gif", "ico", "jpe", "jpeg", "jpg", "png", "psd", "svg", "wmf"],
    ),
    (
        Category::Playlists,
        &[
            "asx", "bpl", "feed", "itpc", "m3u", "m3u8", "opml", "pcast", "pls", "podcast", "rm",
            "rmj", "rmm", "rmx", "rp", "smi", "smil", "upf", "vlc", "wpl", "xspf", "zpl",
        ],
    ),
    (Category::Shortcuts, &["lnk"]),
    (
        Category::Videos,
        &[
            "asf", "avi", "mp2", "mp4", "mpe", "mpeg", "mpg", "mov", "swf", "wmv", "webm", "wm",
        ],
    ),
];

/// System and binary types that are never worth sorting.
const IGNORED_EXTENSIONS: &[&str] = &[
    "ani", "api", "asp", "ax", "bat", "cnv", "cp_", "cpl", "class", "dat", "db", "dll", "cab",
    "chm", "edb", "elf", "emf", "exe", "f", "h", "icc", "ime", "ini", "jar", "java", "js", "jsp",
    "lib", "loc", "mui", "ocx", "olb", "reg", "rll", "sam", "scr", "sports", "sqm", "swc", "sys",
    "sys_place_holder_for_2k_and_xp_(see_pxhelp)", "tlb", "ttf", "vdm", "woff", "xml",
];

/// Human descriptions for extensions that tend to puzzle people.
const EXTENSION_DESCRIPTIONS: &[(&str, &str)] = &[
    (
        "mmw",
        "AceMoney Money File, MechCAD Software LLC financial file, or misnamed dangerous executable",
    ),
    ("mpp", "Microsoft Project"),
    ("mui", "MultiLanguage Windows Resource"),
    ("olb", "Microsoft Office Library"),
    ("rll", "Microsoft Windows Resource"),
    ("swc", "Precompiled Flash and ActionScript Code"),
    ("tlb", "OLE Library"),
    ("wpd", "Corel WordPerfect Document"),
    ("woff", "Web Open Font Format"),
    ("wpl", "Windows Media Player Playlist"),
    ("wps", "Microsoft Works (or Kingsoft Writer) Document"),
    ("xlr", "Microsoft Works Spreadsheet or Chart"),
];

/// Description of an extension, if one is known.
pub fn describe_extension(extension: &str) -> Option<&'static str> {
    EXTENSION_DESCRIPTIONS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, desc)| *desc)
}

/// Outcome of category resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Leave the file untouched
    Skip(SkipReason),
    /// Sort into this category (possibly [`Category::Unknown`])
    Category(Category),
}

/// Maps extensions to categories.
#[derive(Debug, Clone)]
pub struct CategoryResolver {
    ignored: HashSet<String>,
    ignored_names: HashSet<String>,
    skip_extensionless: bool,
}

impl CategoryResolver {
    pub fn new(filters: &FilterConfig) -> Self {
        let ignored = IGNORED_EXTENSIONS
            .iter()
            .map(|s| s.to_string())
            .chain(filters.extra_ignored_extensions.iter().map(|s| s.to_lowercase()))
            .collect();
        Self {
            ignored,
            ignored_names: filters.ignored_names.iter().cloned().collect(),
            skip_extensionless: filters.skip_extensionless,
        }
    }

    /// Resolve an extension; case is folded here.
    pub fn resolve(&self, extension: &str) -> Resolution {
        let ext = extension.to_lowercase();
        if ext.is_empty() {
            if self.skip_extensionless {
                return Resolution::Skip(SkipReason::NoExtension);
            }
            return Resolution::Category(Category::Unknown);
        }
        if self.ignored.contains(&ext) {
            return Resolution::Skip(SkipReason::IgnoredExtension(ext));
        }
        Resolution::Category(category_for(&ext).unwrap_or(Category::Unknown))
    }

    /// Resolve a file, honoring ignored names before the extension.
    pub fn resolve_file(&self, file: &RecoveredFile) -> Resolution {
        if self.ignored_names.contains(&file.file_name) {
            return Resolution::Skip(SkipReason::IgnoredName(file.file_name.clone()));
        }
        self.resolve(&file.extension)
    }
}

/// Table lookup without any ignore handling. First match wins.
pub fn category_for(extension: &str) -> Option<Category> {
    CATEGORY_TABLE
        .iter()
        .find(|(_, exts)| exts.contains(&extension))
        .map(|(category, _)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    fn resolver() -> CategoryResolver {
        CategoryResolver::new(&FilterConfig::default())
    }

    #[test]
    fn test_tables_are_disjoint() {
        let mut seen: HashMap<&str, Category> = HashMap::new();
        for (category, exts) in CATEGORY_TABLE {
            for ext in *exts {
                if let Some(prev) = seen.insert(*ext, *category) {
                    panic!("{ext} is listed under both {prev} and {category}");
                }
            }
        }
    }

    #[test]
    fn test_every_listed_extension_resolves_to_its_category() {
        let resolver = CategoryResolver::new(&FilterConfig {
            extra_ignored_extensions: Vec::new(),
            ..FilterConfig::default()
        });
        for (category, exts) in CATEGORY_TABLE {
            for ext in *exts {
                assert_eq!(resolver.resolve(ext), Resolution::Category(*category), "{ext}");
            }
        }
    }

    #[test]
    fn test_case_is_folded() {
        assert_eq!(resolver().resolve("JPG"), Resolution::Category(Category::Pictures));
        assert_eq!(resolver().resolve("Mp3"), Resolution::Category(Category::Music));
    }

    #[test]
    fn test_unlisted_extension_is_unknown() {
        assert_eq!(resolver().resolve("qqq"), Resolution::Category(Category::Unknown));
    }

    #[test]
    fn test_ignored_and_empty_extensions_skip() {
        assert_eq!(resolver().resolve(""), Resolution::Skip(SkipReason::NoExtension));
        assert_eq!(
            resolver().resolve("DLL"),
            Resolution::Skip(SkipReason::IgnoredExtension("dll".to_string()))
        );
        // Configured extras win over the Backup table
        assert_eq!(
            resolver().resolve("zip"),
            Resolution::Skip(SkipReason::IgnoredExtension("zip".to_string()))
        );
    }

    #[test]
    fn test_extensionless_can_be_sorted() {
        let resolver = CategoryResolver::new(&FilterConfig {
            skip_extensionless: false,
            ..FilterConfig::default()
        });
        assert_eq!(resolver.resolve(""), Resolution::Category(Category::Unknown));
    }

    #[test]
    fn test_ignored_name() {
        let file = RecoveredFile::with_size(Path::new("/recup/user"), 10);
        assert_eq!(
            resolver().resolve_file(&file),
            Resolution::Skip(SkipReason::IgnoredName("user".to_string()))
        );
    }

    #[test]
    fn test_describe_extension() {
        assert_eq!(describe_extension("mpp"), Some("Microsoft Project"));
        assert_eq!(describe_extension("jpg"), None);
    }
}
