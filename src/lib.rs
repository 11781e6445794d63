pub mod acquire;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod source;

pub use acquire::{scan_one, scan_stream, FrameOutcome};
pub use config::ScanConfig;
pub use detection::CardScanner;
pub use detection::glyphs::{GlyphLibrary, GlyphTemplate};
pub use error::ScanError;
pub use models::{Assembly, BoundingBox, CardNetwork, CardReading, Contour, Roi};
pub use pipeline::{DebugDirObserver, NoopObserver, StageObserver};
pub use source::{FrameSource, ImageFileSource, MjpegStream};
