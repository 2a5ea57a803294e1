//! Pixel-level image heuristics.
//!
//! Decoding itself is delegated to the `image` crate behind the
//! [`PixelDecoder`] trait so the heuristics can be driven by in-memory
//! pixel grids in tests. Everything here works on RGBA8.

use image::{ImageReader, Rgba, RgbaImage};
use std::path::Path;

use crate::config::ImageConfig;
use crate::error::{Error, Result};

/// Capability that turns an image file into pixels.
pub trait PixelDecoder {
    /// Read only the header and report `(width, height)`.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)>;

    /// Decode the full pixel grid as RGBA.
    fn decode(&self, path: &Path) -> Result<RgbaImage>;
}

/// [`PixelDecoder`] backed by the `image` crate.
///
/// The format is sniffed from content because recovered extensions lie.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    fn reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>> {
        ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| Error::image_decode(path, e.to_string()))
    }
}

impl PixelDecoder for ImageCrateDecoder {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
        Self::reader(path)?
            .into_dimensions()
            .map_err(|e| Error::image_decode(path, e.to_string()))
    }

    fn decode(&self, path: &Path) -> Result<RgbaImage> {
        let image = Self::reader(path)?
            .decode()
            .map_err(|e| Error::image_decode(path, e.to_string()))?;
        Ok(image.into_rgba8())
    }
}

/// Decides whether an image is a generated thumbnail.
#[derive(Debug, Clone)]
pub struct ThumbnailClassifier {
    min_pixels: u64,
    known_sizes: Vec<(u32, u32)>,
}

impl ThumbnailClassifier {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            min_pixels: config.min_non_thumbnail_pixels,
            known_sizes: config.known_thumbnail_sizes.clone(),
        }
    }

    pub fn is_thumbnail(&self, width: u32, height: u32) -> bool {
        u64::from(width) * u64::from(height) <= self.min_pixels
            || self.known_sizes.contains(&(width, height))
    }
}

const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Detects blank (uniform or mostly transparent) images.
#[derive(Debug, Clone)]
pub struct BlankDetector {
    clear_alpha_threshold: u8,
    clear_ratio_max: f64,
}

impl BlankDetector {
    pub fn new(config: &ImageConfig) -> Self {
        Self {
            clear_alpha_threshold: config.clear_alpha_threshold,
            clear_ratio_max: config.clear_ratio_max,
        }
    }

    /// An image is blank if it is one color once fully transparent pixels
    /// are normalized, or if too many of its pixels are clear.
    pub fn is_blank(&self, image: &RgbaImage) -> bool {
        let total = u64::from(image.width()) * u64::from(image.height());
        if total == 0 {
            return true;
        }

        let mut uniform = true;
        let mut clear = 0u64;
        let mut last: Option<Rgba<u8>> = None;
        for pixel in image.pixels() {
            let alpha = pixel.0[3];
            let pixel = if alpha == 0 { CLEAR } else { *pixel };
            if alpha < self.clear_alpha_threshold {
                clear += 1;
            }
            if uniform && last.is_some_and(|prev| prev != pixel) {
                uniform = false;
            }
            last = Some(pixel);
        }

        uniform || clear as f64 / total as f64 > self.clear_ratio_max
    }
}

/// Exact RGBA equality with matching dimensions.
pub fn pixels_identical(a: &RgbaImage, b: &RgbaImage) -> bool {
    a.dimensions() == b.dimensions() && a.as_raw() == b.as_raw()
}
