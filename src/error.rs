use std::path::PathBuf;

/// Errors returned by the card scanner.
///
/// Failing to find a card or a digit group is not an error; those outcomes
/// are reported as `None` or [`crate::Assembly::NotFound`].
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("glyph reference sheet must contain exactly 10 glyphs, found {found}")]
    GlyphCount { found: usize },
    #[error("unreadable glyph reference {path}: {reason}")]
    Reference { path: PathBuf, reason: String },
    /// One frame could not be decoded; the source can still deliver more.
    #[error("corrupt frame: {0}")]
    CorruptFrame(#[from] image::ImageError),
    #[error("frame unavailable: {0}")]
    FrameUnavailable(String),
    #[error("video stream error: {0}")]
    Stream(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

impl ScanError {
    /// True for errors that invalidate the scanner setup rather than a single frame.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ScanError::Config(_)
                | ScanError::GlyphCount { .. }
                | ScanError::Reference { .. }
                | ScanError::ConfigParse(_)
        )
    }
}
