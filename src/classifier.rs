//! Per-file classification.
//!
//! [`FileClassifier`] turns one [`RecoveredFile`] into a
//! [`Classification`]: either leave it alone, or a destination subpath,
//! final name and disposition. Mutable run state (name registries, running
//! statistics, the cancellation flag) lives in [`SortContext`] and is passed
//! in explicitly so a single traversal owns it.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::category::{CategoryResolver, Resolution};
use crate::config::{Config, SizeConfig};
use crate::error::Error;
use crate::imaging::{PixelDecoder, ThumbnailClassifier};
use crate::metadata::TagReader;
use crate::model::{
    Category, Classification, ClassificationDecision, Disposition, QuarantineReason, RecoveredFile,
};
use crate::music::{MusicIdentityResolver, MusicPlacement};
use crate::report::RunReport;
use crate::sanitize::sanitize;

/// Cooperative stop signal shared with the interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// State owned by one run and threaded through every classification.
#[derive(Debug, Default)]
pub struct SortContext {
    pub music: MusicIdentityResolver,
    pub report: RunReport,
    pub cancel: CancelFlag,
}

impl SortContext {
    pub fn new(cancel: CancelFlag) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    /// Check the stop signal, recording the cancellation once seen.
    pub fn should_stop(&mut self) -> bool {
        if self.cancel.is_cancelled() {
            self.report.mark_cancelled();
            return true;
        }
        false
    }
}

/// Decides category, destination and name for recovered files.
pub struct FileClassifier<D, T> {
    categories: CategoryResolver,
    thumbnails: ThumbnailClassifier,
    sizes: SizeConfig,
    decoder: D,
    tags: T,
}

impl<D: PixelDecoder, T: TagReader> FileClassifier<D, T> {
    pub fn new(config: &Config, decoder: D, tags: T) -> Self {
        Self {
            categories: CategoryResolver::new(&config.filters),
            thumbnails: ThumbnailClassifier::new(&config.images),
            sizes: config.sizes.clone(),
            decoder,
            tags,
        }
    }

    /// Classify one file. Decode and tag failures become quarantine routes.
    pub fn classify(&self, file: &RecoveredFile, ctx: &mut SortContext) -> Classification {
        let category = match self.categories.resolve_file(file) {
            Resolution::Skip(reason) => return Classification::Skip(reason),
            Resolution::Category(category) => category,
        };

        let mut subpath = category.folder_path();
        let mut file_name = sanitize(&file.file_name);
        let mut disposition = Disposition::Keep;

        match category {
            Category::Unknown => ctx.report.record_unknown(&file.extension, &file.path),
            Category::Music => {
                let placement = self.place_music(file, ctx);
                if !placement.tagged {
                    disposition = Disposition::Quarantine(QuarantineReason::Untagged);
                }
                subpath.push(placement.subpath);
                file_name = placement.file_name;
            }
            Category::Pictures => match self.decoder.dimensions(&file.path) {
                Ok((width, height)) => {
                    if self.thumbnails.is_thumbnail(width, height) {
                        disposition = Disposition::Quarantine(QuarantineReason::Thumbnail);
                    }
                }
                Err(e) => {
                    log_read_failure(&e);
                    disposition = Disposition::Quarantine(QuarantineReason::Unusable);
                }
            },
            _ => {
                if self
                    .sizes
                    .min_valid_size(category)
                    .is_some_and(|min| file.size < min)
                {
                    disposition = Disposition::Quarantine(QuarantineReason::Thumbnail);
                }
            }
        }

        // Music buckets are already part of the placement subpath
        if let Disposition::Quarantine(reason) = disposition
            && category != Category::Music
        {
            subpath.push(reason.folder_name());
        }

        if file_name.is_empty() {
            file_name = fallback_name(file);
        }

        Classification::Sort(ClassificationDecision {
            category,
            subpath,
            file_name,
            disposition,
        })
    }

    fn place_music(&self, file: &RecoveredFile, ctx: &mut SortContext) -> MusicPlacement {
        match self.tags.read_tags(&file.path) {
            Ok(tags) if tags.is_empty() => {
                tracing::info!(target: "music", "No tags: {}", file.path.display());
                MusicPlacement::misc(file)
            }
            Ok(tags) => ctx.music.place(&tags, file),
            Err(e) => {
                log_read_failure(&e);
                MusicPlacement::misc(file)
            }
        }
    }
}

/// Malformed payloads are routine in recovered data; anything else
/// (permissions, vanished files) gets an error line.
fn log_read_failure(error: &Error) {
    if error.is_decode_failure() {
        tracing::info!(target: "sort", "{}", error);
    } else {
        tracing::error!(target: "sort", "{}", error);
    }
}

fn fallback_name(file: &RecoveredFile) -> String {
    let name = PathBuf::from("recovered").with_extension(&file.extension);
    name.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::metadata::RawTags;
    use crate::model::SkipReason;
    use crate::test_utils::StubTagReader;
    use image::RgbaImage;
    use std::collections::HashMap;
    use std::path::Path;

    /// Decoder answering dimensions from a table keyed by file name.
    #[derive(Default)]
    struct StubDecoder(HashMap<String, (u32, u32)>);

    impl StubDecoder {
        fn with(mut self, name: &str, dims: (u32, u32)) -> Self {
            self.0.insert(name.to_string(), dims);
            self
        }
    }

    impl PixelDecoder for StubDecoder {
        fn dimensions(&self, path: &Path) -> Result<(u32, u32)> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            self.0
                .get(&name)
                .copied()
                .ok_or_else(|| Error::image_decode(path, "Unsupported BMP header type (0)"))
        }

        fn decode(&self, path: &Path) -> Result<RgbaImage> {
            let (w, h) = self.dimensions(path)?;
            Ok(RgbaImage::new(w, h))
        }
    }

    fn file(name: &str, size: u64) -> RecoveredFile {
        RecoveredFile::with_size(&Path::new("/recup/recup_dir.1").join(name), size)
    }

    fn classify_with(
        decoder: StubDecoder,
        tags: StubTagReader,
        file: &RecoveredFile,
        ctx: &mut SortContext,
    ) -> Classification {
        FileClassifier::new(&Config::default(), decoder, tags).classify(file, ctx)
    }

    fn decision(classification: Classification) -> ClassificationDecision {
        match classification {
            Classification::Sort(d) => d,
            Classification::Skip(reason) => panic!("unexpected skip: {reason:?}"),
        }
    }

    #[test]
    fn test_ignored_extension_is_untouched() {
        let mut ctx = SortContext::default();
        let result = classify_with(
            StubDecoder::default(),
            StubTagReader::default(),
            &file("f1.dll", 10),
            &mut ctx,
        );
        assert_eq!(
            result,
            Classification::Skip(SkipReason::IgnoredExtension("dll".to_string()))
        );
        assert!(ctx.report.unknown_types.is_empty());
    }

    #[test]
    fn test_unknown_goes_to_backup_unknown_and_is_reported() {
        let mut ctx = SortContext::default();
        let d = decision(classify_with(
            StubDecoder::default(),
            StubTagReader::default(),
            &file("f2.qqq", 10),
            &mut ctx,
        ));
        assert_eq!(d.category, Category::Unknown);
        assert_eq!(d.subpath, PathBuf::from("Backup").join("unknown"));
        assert_eq!(d.disposition, Disposition::Keep);
        assert_eq!(ctx.report.unknown_types[0].extension, "qqq");
        assert_eq!(
            ctx.report.unknown_types[0].example,
            PathBuf::from("/recup/recup_dir.1/f2.qqq")
        );
    }

    #[test]
    fn test_picture_routes() {
        let decoder = || {
            StubDecoder::default()
                .with("big.jpg", (1920, 1080))
                .with("thumb.jpg", (160, 120))
                .with("tiny.png", (1, 1))
        };
        let mut ctx = SortContext::default();

        let big = decision(classify_with(decoder(), StubTagReader::default(), &file("big.jpg", 1), &mut ctx));
        assert_eq!(big.subpath, PathBuf::from("Pictures"));
        assert_eq!(big.disposition, Disposition::Keep);

        let thumb = decision(classify_with(decoder(), StubTagReader::default(), &file("thumb.jpg", 1), &mut ctx));
        assert_eq!(thumb.subpath, PathBuf::from("Pictures").join("thumbnails"));

        let tiny = decision(classify_with(decoder(), StubTagReader::default(), &file("tiny.png", 1), &mut ctx));
        assert_eq!(tiny.disposition, Disposition::Quarantine(QuarantineReason::Thumbnail));

        let broken = decision(classify_with(decoder(), StubTagReader::default(), &file("broken.bmp", 1), &mut ctx));
        assert_eq!(broken.subpath, PathBuf::from("Pictures").join("unusable"));
        assert_eq!(broken.disposition, Disposition::Quarantine(QuarantineReason::Unusable));
    }

    #[test]
    fn test_undersized_video_is_quarantined() {
        let mut ctx = SortContext::default();
        let small = decision(classify_with(
            StubDecoder::default(),
            StubTagReader::default(),
            &file("f3.avi", 1024),
            &mut ctx,
        ));
        assert_eq!(small.subpath, PathBuf::from("Videos").join("thumbnails"));

        let fine = decision(classify_with(
            StubDecoder::default(),
            StubTagReader::default(),
            &file("f4.avi", 5_000_000),
            &mut ctx,
        ));
        assert_eq!(fine.subpath, PathBuf::from("Videos"));
    }

    #[test]
    fn test_music_with_tags() {
        let tags = StubTagReader::default().with(
            "song.mp3",
            RawTags {
                album_artist: Some("the who".to_string()),
                album: Some("Tommy".to_string()),
                title: Some("Amazing Journey".to_string()),
                track: Some("1".to_string()),
                ..RawTags::default()
            },
        );
        let mut ctx = SortContext::default();
        let d = decision(classify_with(StubDecoder::default(), tags, &file("song.mp3", 10), &mut ctx));
        assert_eq!(d.subpath, ["Music", "The Who", "Tommy"].iter().collect::<PathBuf>());
        assert_eq!(d.file_name, "1 Amazing Journey.mp3");
        assert_eq!(d.disposition, Disposition::Keep);
        assert_eq!(ctx.music.artists.names(), &["The Who".to_string()]);
    }

    #[test]
    fn test_music_tag_failure_goes_to_misc() {
        let mut ctx = SortContext::default();
        let d = decision(classify_with(
            StubDecoder::default(),
            StubTagReader::default(),
            &file("f5|x.mp3", 10),
            &mut ctx,
        ));
        assert_eq!(d.subpath, PathBuf::from("Music").join("misc"));
        assert_eq!(d.file_name, "f5_x.mp3");
        assert_eq!(d.disposition, Disposition::Quarantine(QuarantineReason::Untagged));
    }

    #[test]
    fn test_music_without_tags_goes_to_misc() {
        let tags = StubTagReader::default().with("f6.ogg", RawTags::default());
        let mut ctx = SortContext::default();
        let d = decision(classify_with(StubDecoder::default(), tags, &file("f6.ogg", 10), &mut ctx));
        assert_eq!(d.subpath, PathBuf::from("Music").join("misc"));
        assert_eq!(d.file_name, "f6.ogg");
    }

    #[test]
    fn test_playlist_shares_music_root() {
        let mut ctx = SortContext::default();
        let d = decision(classify_with(
            StubDecoder::default(),
            StubTagReader::default(),
            &file("f7.m3u", 10),
            &mut ctx,
        ));
        assert_eq!(d.category, Category::Playlists);
        assert_eq!(d.subpath, PathBuf::from("Music"));
    }

    #[test]
    fn test_name_is_sanitized() {
        let mut ctx = SortContext::default();
        let d = decision(classify_with(
            StubDecoder::default(),
            StubTagReader::default(),
            &file("notes: \"draft\".txt", 10),
            &mut ctx,
        ));
        assert_eq!(d.subpath, PathBuf::from("Documents").join("plaintext"));
        assert_eq!(d.file_name, "notes- indraftin.txt");
    }

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        let mut ctx = SortContext::new(flag.clone());
        assert!(!ctx.should_stop());
        flag.cancel();
        assert!(ctx.should_stop());
        assert!(ctx.report.is_cancelled());
    }
}
