//! Application-wide error types.
//!
//! Library modules return [`Error`] through the [`Result`] alias, while the
//! CLI layer uses `anyhow` for convenient propagation.
//!
//! Two variants are expected during a normal run and never abort it:
//! [`Error::ImageDecode`] and [`Error::TagRead`]. The classifier turns them
//! into quarantine routes (`unusable`, `misc`).

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The source root handed to the sort pass is not a directory
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Image header or pixel payload could not be decoded
    #[error("Image decode error for {}: {message}", .path.display())]
    ImageDecode { path: PathBuf, message: String },

    /// Audio tag structure is missing or malformed
    #[error("Tag read error for {}: {message}", .path.display())]
    TagRead { path: PathBuf, message: String },

    /// Report serialization error
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an image decode error.
    pub fn image_decode(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ImageDecode {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a tag read error.
    pub fn tag_read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TagRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a not-a-directory error.
    pub fn not_a_directory(path: impl Into<PathBuf>) -> Self {
        Self::NotADirectory(path.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error is a recoverable decode failure.
    pub fn is_decode_failure(&self) -> bool {
        match self {
            Self::ImageDecode { .. } | Self::TagRead { .. } => true,
            Self::WithContext { source, .. } => source.is_decode_failure(),
            _ => false,
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
