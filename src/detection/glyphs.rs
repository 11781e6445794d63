//! Reference glyph library.
//!
//! The reference sheet holds the ten digits `0` to `9` from left to right.
//! Each glyph is cut out, binarized and resized to the canonical glyph size so
//! that every later comparison happens at a single resolution.

use image::imageops;
use image::{DynamicImage, GrayImage};
use std::path::Path;

use crate::config::ScanConfig;
use crate::detection::{contours, preprocessing};
use crate::error::{Result, ScanError};
use crate::models::BoundingBox;

pub const DIGIT_COUNT: usize = 10;

/// Normalized image of one reference digit.
#[derive(Debug, Clone)]
pub struct GlyphTemplate {
    pub digit: u8,
    pub image: GrayImage,
}

/// The ten digit templates, immutable once built.
#[derive(Debug, Clone)]
pub struct GlyphLibrary {
    templates: Vec<GlyphTemplate>,
    glyph_width: u32,
    glyph_height: u32,
}

impl GlyphLibrary {
    /// Load and build the library from a reference image on disk.
    pub fn load(path: &Path, config: &ScanConfig) -> Result<Self> {
        let reference = image::open(path).map_err(|e| ScanError::Reference {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        log::debug!(
            "Loaded glyph reference {} ({}x{})",
            path.display(),
            reference.width(),
            reference.height()
        );
        Self::build(&reference, config)
    }

    /// Build the library from a decoded reference image.
    ///
    /// Fails unless exactly ten glyphs survive segmentation: a partial digit
    /// map would silently mislabel every later read.
    pub fn build(reference: &DynamicImage, config: &ScanConfig) -> Result<Self> {
        let gray = preprocessing::to_grayscale(reference);
        let binary = preprocessing::binarize_inverted(&gray, config.classifier.reference_threshold);

        let glyphs = segment_glyphs(
            &binary,
            config.min_roi_area,
            config.glyph_width,
            config.glyph_height,
        );
        if glyphs.len() != DIGIT_COUNT {
            return Err(ScanError::GlyphCount { found: glyphs.len() });
        }

        let templates = glyphs
            .into_iter()
            .enumerate()
            .map(|(digit, (_, image))| GlyphTemplate {
                digit: digit as u8,
                image,
            })
            .collect();

        Ok(Self {
            templates,
            glyph_width: config.glyph_width,
            glyph_height: config.glyph_height,
        })
    }

    /// Templates ordered by digit.
    pub fn templates(&self) -> &[GlyphTemplate] {
        &self.templates
    }

    pub fn glyph_size(&self) -> (u32, u32) {
        (self.glyph_width, self.glyph_height)
    }
}

/// Cut every external blob of a binary image into a canonical-size glyph.
///
/// Blobs are returned left to right. Those whose bounding box covers fewer
/// than `min_area` pixels are dropped as noise.
pub(crate) fn segment_glyphs(
    binary: &GrayImage,
    min_area: u32,
    width: u32,
    height: u32,
) -> Vec<(BoundingBox, GrayImage)> {
    let mut blobs = contours::find_external_contours(binary);
    contours::sort_left_to_right(&mut blobs);

    blobs
        .iter()
        .map(|c| c.bounds())
        .filter(|bbox| bbox.area() >= min_area)
        .map(|bbox| {
            let crop = imageops::crop_imm(binary, bbox.x, bbox.y, bbox.width, bbox.height).to_image();
            (bbox, preprocessing::resize_glyph(&crop, width, height))
        })
        .collect()
}
