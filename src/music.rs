//! Music identity resolution.
//!
//! Normalizes raw tag values and groups inconsistently tagged files under
//! canonical artist/album folders. Matching is order dependent: a registry
//! remembers every spelling it accepted during the run, and later files
//! resolve to the best-scoring spelling seen so far. Files sorted before a
//! better spelling showed up keep the folder they already got.

use std::path::PathBuf;

use crate::metadata::RawTags;
use crate::model::RecoveredFile;
use crate::sanitize::sanitize;

/// Folder for music files whose tags are missing or unreadable.
pub const MISC_FOLDER: &str = "misc";

/// Placeholder for a missing artist or album.
pub const UNKNOWN_NAME: &str = "unknown";

fn starts_with_the(s: &str) -> bool {
    s.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("the "))
}

/// Lowercased name with a leading "The " removed.
pub fn match_key(name: &str) -> String {
    let lower = name.to_lowercase();
    match lower.strip_prefix("the ") {
        Some(rest) => rest.to_string(),
        None => lower,
    }
}

/// Score preferring "The "-prefixed, more capitalized spellings.
pub fn title_quality(name: &str) -> i32 {
    let the_bonus = if starts_with_the(name) { 4 } else { 0 };
    the_bonus + name.chars().filter(|c| c.is_uppercase()).count() as i32
}

/// Capitalize each word of a name that has no uppercase letters at all.
fn capitalize_if_lowercase(name: &str) -> String {
    if name.chars().any(char::is_uppercase) {
        return name.to_string();
    }
    let mut out = String::with_capacity(name.len());
    let mut word_start = true;
    for c in name.chars() {
        if word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        word_start = c.is_whitespace();
    }
    out
}

/// Canonical spellings accepted so far in this run.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    names: Vec<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a registry with spellings, in order.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Best registered spelling matching `candidate`, first seen on ties.
    pub fn find_similar(&self, candidate: &str) -> Option<&str> {
        let key = match_key(candidate);
        let mut best: Option<(&str, i32)> = None;
        for name in &self.names {
            if match_key(name) != key {
                continue;
            }
            let quality = title_quality(name);
            if best.is_none_or(|(_, q)| quality > q) {
                best = Some((name.as_str(), quality));
            }
        }
        best.map(|(name, _)| name)
    }

    /// Resolve a candidate to its canonical spelling, registering it when
    /// it is new or scores better than every spelling it matches.
    pub fn resolve(&mut self, candidate: &str) -> String {
        let candidate = capitalize_if_lowercase(candidate);
        let existing = self.find_similar(&candidate).map(str::to_string);
        match existing {
            Some(existing) if title_quality(&existing) >= title_quality(&candidate) => existing,
            _ => {
                if !self.names.contains(&candidate) {
                    self.names.push(candidate.clone());
                }
                candidate
            }
        }
    }
}

/// Strip embedded nulls, sanitize, trim. Empty results count as absent.
pub fn normalize_field(raw: Option<&str>) -> Option<String> {
    let value = raw?.replace('\0', "");
    // Trimming can expose a bare "." or "..", so sanitize again
    let value = sanitize(sanitize(&value).trim());
    (!value.is_empty()).then_some(value)
}

/// Where a music file goes, relative to the music root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicPlacement {
    pub subpath: PathBuf,
    pub file_name: String,
    /// False when the file landed in the misc bucket
    pub tagged: bool,
}

impl MusicPlacement {
    /// Bucket for files with unreadable or unusable tags.
    pub fn misc(file: &RecoveredFile) -> Self {
        Self {
            subpath: PathBuf::from(MISC_FOLDER),
            file_name: sanitize(&file.file_name),
            tagged: false,
        }
    }
}

/// Artist and album registries plus the placement rules built on them.
#[derive(Debug, Clone, Default)]
pub struct MusicIdentityResolver {
    pub artists: NameRegistry,
    pub albums: NameRegistry,
}

impl MusicIdentityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide folder and file name for a tagged music file.
    pub fn place(&mut self, tags: &RawTags, file: &RecoveredFile) -> MusicPlacement {
        let file_name = match (
            normalize_field(tags.title.as_deref()),
            normalize_field(tags.track.as_deref()),
        ) {
            (Some(title), Some(track)) => with_extension(&format!("{track} {title}"), &file.extension),
            (Some(title), None) => with_extension(&title, &file.extension),
            (None, Some(track)) => format!("{track} {}", sanitize(&file.file_name)),
            (None, None) => return MusicPlacement::misc(file),
        };

        let artist = normalize_field(tags.album_artist.as_deref())
            .or_else(|| normalize_field(tags.artist.as_deref()))
            .map(|a| self.artists.resolve(&a))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());
        let album = normalize_field(tags.album.as_deref())
            .map(|a| self.albums.resolve(&a))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        MusicPlacement {
            subpath: [artist, album].iter().collect(),
            file_name,
            tagged: true,
        }
    }
}

fn with_extension(name: &str, extension: &str) -> String {
    if extension.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{extension}")
    }
}
