//! Audio tag extraction.
//!
//! Uses the lofty crate for format-independent tag access. Tags come back
//! as a fixed-shape [`RawTags`] record; nothing is normalized here, that is
//! the music resolver's job.

use lofty::file::TaggedFileExt;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag};
use std::path::Path;

use crate::error::{Error, Result};

/// Raw tag values as stored in the file. Each field is independent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTags {
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub track: Option<String>,
}

impl RawTags {
    /// Whether no field carries a value at all.
    pub fn is_empty(&self) -> bool {
        self.artist.is_none()
            && self.album_artist.is_none()
            && self.album.is_none()
            && self.title.is_none()
            && self.track.is_none()
    }
}

/// Capability that extracts tags from an audio file.
pub trait TagReader {
    /// Read tags. A malformed or unreadable tag structure is
    /// [`Error::TagRead`]; a readable file without tags is an empty record.
    fn read_tags(&self, path: &Path) -> Result<RawTags>;
}

/// [`TagReader`] backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

impl TagReader for LoftyTagReader {
    fn read_tags(&self, path: &Path) -> Result<RawTags> {
        read(path)
    }
}

/// Read the primary tag (or the first available one) of an audio file.
pub fn read(path: &Path) -> Result<RawTags> {
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::tag_read(path, format!("Failed to open file for probing: {e}")))?
        .read()
        .map_err(|e| Error::tag_read(path, format!("Failed to read file metadata: {e}")))?;

    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    Ok(tag.map(tags_from).unwrap_or_default())
}

fn tags_from(tag: &Tag) -> RawTags {
    let track = tag.track().map(|n| n.to_string()).or_else(|| {
        tag.get_string(&ItemKey::TrackNumber)
            .map(|s| s.to_string())
    });

    RawTags {
        artist: tag.artist().map(|s| s.to_string()),
        album_artist: tag.get_string(&ItemKey::AlbumArtist).map(|s| s.to_string()),
        album: tag.album().map(|s| s.to_string()),
        title: tag.title().map(|s| s.to_string()),
        track,
    }
}
