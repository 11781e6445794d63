//! Scanner configuration.
//!
//! Every geometric threshold used by the detection stages lives here so the
//! scanner can be recalibrated for a different camera or resolution without
//! touching code. All fields have defaults; a JSON file only needs to carry
//! the values it overrides.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};

/// Card localization parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardLocatorParams {
    /// Frames are resized to this height (aspect preserved) before searching.
    pub target_height: u32,
    /// Gaussian sigma applied before edge detection.
    pub blur_sigma: f32,
    /// Canny hysteresis thresholds.
    pub canny_low: f32,
    pub canny_high: f32,
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_frac: f64,
    /// Accepted long-side / short-side ratio, inclusive on both ends.
    pub min_aspect: f32,
    pub max_aspect: f32,
}

impl Default for CardLocatorParams {
    fn default() -> Self {
        Self {
            target_height: 500,
            // 5x5 kernel equivalent
            blur_sigma: 1.1,
            canny_low: 50.0,
            canny_high: 150.0,
            approx_epsilon_frac: 0.02,
            min_aspect: 1.4,
            max_aspect: 2.5,
        }
    }
}

/// Digit-group localization parameters.
///
/// The vertical band and the size window assume a card region normalized to
/// `target_width`. They were tuned on a single capture setup and should be
/// recalibrated for other card framings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupLocatorParams {
    /// Card regions are resized to this width (aspect preserved).
    pub target_width: u32,
    /// Width and height of the rectangular top-hat / closing kernel.
    pub tophat_kernel: (u8, u8),
    /// Side of the square kernel used by the second closing pass.
    pub close_kernel: u8,
    /// 3x3 dilation passes used to fuse strokes into group blobs.
    pub dilate_iterations: u8,
    /// 3x3 erosion passes applied after dilation.
    pub erode_iterations: u8,
    /// Accepted blob top edge, exclusive.
    pub band_min_y: u32,
    pub band_max_y: u32,
    /// Widths above `clamp_width_above` are replaced by `clamped_width`.
    pub clamp_width_above: u32,
    pub clamped_width: u32,
    /// Heights above `clamp_height_above` are replaced by `clamped_height`.
    pub clamp_height_above: u32,
    pub clamped_height: u32,
    /// Accepted width / height ratio, exclusive.
    pub min_aspect: f32,
    pub max_aspect: f32,
    /// Accepted blob size, exclusive.
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
}

impl Default for GroupLocatorParams {
    fn default() -> Self {
        Self {
            target_width: 600,
            tophat_kernel: (9, 3),
            close_kernel: 5,
            dilate_iterations: 10,
            erode_iterations: 1,
            band_min_y: 180,
            band_max_y: 220,
            clamp_width_above: 150,
            clamped_width: 110,
            clamp_height_above: 60,
            clamped_height: 45,
            min_aspect: 1.75,
            max_aspect: 3.0,
            min_width: 90,
            max_width: 140,
            min_height: 35,
            max_height: 55,
        }
    }
}

/// Glyph segmentation and matching parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// Extra pixels cropped around each located group.
    pub group_margin: u32,
    /// Reference sheet pixels at or below this level are glyph strokes.
    pub reference_threshold: u8,
    /// Group pixels above this level are glyph strokes.
    pub group_threshold: u8,
    /// 3x3 dilation passes applied to a binarized group.
    pub stroke_dilation: u8,
    /// Optional correlation floor. Glyphs whose best score is below it are
    /// dropped instead of classified. `None` always emits a digit.
    pub min_score: Option<f64>,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            group_margin: 5,
            reference_threshold: 120,
            group_threshold: 100,
            stroke_dilation: 1,
            min_score: None,
        }
    }
}

/// Network camera endpoint for streamed input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub timeout_secs: u64,
}

impl StreamConfig {
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            path: "/video".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Complete scanner configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Image holding the ten reference glyphs, 0 to 9 from left to right.
    pub reference_path: PathBuf,
    /// Segmented regions with a smaller bounding-box area are ignored.
    pub min_roi_area: u32,
    /// Canonical glyph size every template and candidate is resized to.
    pub glyph_width: u32,
    pub glyph_height: u32,
    pub card: CardLocatorParams,
    pub groups: GroupLocatorParams,
    pub classifier: ClassifierParams,
    pub stream: StreamConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            reference_path: PathBuf::from("font.png"),
            min_roi_area: 100,
            glyph_width: 57,
            glyph_height: 88,
            card: CardLocatorParams::default(),
            groups: GroupLocatorParams::default(),
            classifier: ClassifierParams::default(),
            stream: StreamConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ScanConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Reject configurations the detection stages cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.glyph_width == 0 || self.glyph_height == 0 {
            return Err(ScanError::Config("glyph size must be non-zero".into()));
        }
        if self.card.target_height == 0 || self.groups.target_width == 0 {
            return Err(ScanError::Config("target sizes must be non-zero".into()));
        }
        if !(self.card.blur_sigma > 0.0) {
            return Err(ScanError::Config("blur sigma must be positive".into()));
        }
        if self.card.min_aspect > self.card.max_aspect {
            return Err(ScanError::Config(format!(
                "card aspect range is empty: [{}, {}]",
                self.card.min_aspect, self.card.max_aspect
            )));
        }
        let g = &self.groups;
        if g.min_aspect >= g.max_aspect || g.min_width >= g.max_width || g.min_height >= g.max_height {
            return Err(ScanError::Config("digit group filter ranges are empty".into()));
        }
        if g.band_min_y >= g.band_max_y {
            return Err(ScanError::Config(format!(
                "digit group band is empty: ({}, {})",
                g.band_min_y, g.band_max_y
            )));
        }
        if g.tophat_kernel.0 == 0 || g.tophat_kernel.1 == 0 || g.close_kernel == 0 {
            return Err(ScanError::Config("morphology kernels must be non-empty".into()));
        }
        Ok(())
    }
}
