//! Test utilities and fixtures.
//!
//! Pixel grids, minimal audio files, and a stub tag reader so classifier
//! tests don't depend on real recordings.

use image::{Rgba, RgbaImage};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::metadata::{RawTags, TagReader};

/// An image filled with a single color.
pub fn solid_image(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

/// An opaque image whose pixels are all distinct for small sizes.
pub fn gradient_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) * 3 % 256) as u8, 255])
    })
}

/// Write a mono 16-bit PCM WAV file with `samples` samples of silence.
pub fn write_wav(path: &Path, samples: u32) {
    let data_len = samples * 2;
    let mut bytes = Vec::with_capacity(44 + data_len as usize);
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&8000u32.to_le_bytes());
    bytes.extend_from_slice(&16000u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    bytes.resize(44 + data_len as usize, 0);
    std::fs::write(path, bytes).expect("Failed to write wav fixture");
}

/// Tag reader answering from a fixed table keyed by file name.
///
/// Files not in the table fail like a malformed tag structure would.
#[derive(Debug, Default)]
pub struct StubTagReader {
    tags: HashMap<String, RawTags>,
}

impl StubTagReader {
    pub fn with(mut self, file_name: &str, tags: RawTags) -> Self {
        self.tags.insert(file_name.to_string(), tags);
        self
    }
}

impl TagReader for StubTagReader {
    fn read_tags(&self, path: &Path) -> Result<RawTags> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.tags
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::tag_read(path, "unpack requires a buffer of 34 bytes"))
    }
}

/// Write `len` bytes of a repeating pattern and return the path.
pub fn write_bytes(dir: &Path, name: &str, len: usize, seed: u8) -> PathBuf {
    let path = dir.join(name);
    let bytes: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed)).collect();
    std::fs::write(&path, bytes).expect("Failed to write fixture");
    path
}

/// All regular files under `root`, relative to it, sorted.
pub fn relative_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.path().strip_prefix(root).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_is_not_uniform() {
        let image = gradient_image(10, 10);
        assert_ne!(image.get_pixel(0, 0), image.get_pixel(1, 0));
        assert_ne!(image.get_pixel(0, 0), image.get_pixel(0, 1));
    }

    #[test]
    fn test_stub_tag_reader() {
        let reader = StubTagReader::default().with(
            "song.mp3",
            RawTags {
                title: Some("Song".to_string()),
                ..RawTags::default()
            },
        );
        assert!(reader.read_tags(Path::new("/x/song.mp3")).is_ok());
        assert!(reader.read_tags(Path::new("/x/other.mp3")).unwrap_err().is_decode_failure());
    }

    #[test]
    fn test_write_bytes_differs_by_seed() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_bytes(dir.path(), "a.bin", 64, 0);
        let b = write_bytes(dir.path(), "b.bin", 64, 1);
        assert_ne!(std::fs::read(a).unwrap(), std::fs::read(b).unwrap());
    }
}
