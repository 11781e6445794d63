use image::imageops;
use image::{DynamicImage, GrayImage};

use crate::config::ClassifierParams;
use crate::detection::glyphs::{segment_glyphs, GlyphLibrary};
use crate::detection::preprocessing;
use crate::models::BoundingBox;
use crate::pipeline::StageObserver;

/// Splits digit groups into glyphs and matches each against the glyph library.
pub struct DigitClassifier<'a> {
    pub library: &'a GlyphLibrary,
    pub params: ClassifierParams,
    pub min_roi_area: u32,
}

/// Best template for one glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMatch {
    pub digit: u8,
    pub score: f64,
}

impl<'a> DigitClassifier<'a> {
    pub fn new(library: &'a GlyphLibrary, params: ClassifierParams, min_roi_area: u32) -> Self {
        Self { library, params, min_roi_area }
    }

    /// Recognized digits of all groups, concatenated in the given group order.
    pub fn classify_groups(
        &self,
        gray: &GrayImage,
        groups: &[BoundingBox],
        observer: &mut dyn StageObserver,
    ) -> Vec<char> {
        let mut output = Vec::new();
        for (i, group) in groups.iter().enumerate() {
            let digits = self.classify_group(gray, group, i, output.len(), observer);
            log::debug!("Group {} at x={}: '{}'", i + 1, group.x, digits.iter().collect::<String>());
            output.extend(digits);
        }
        output
    }

    /// Digits of a single group, left to right. `first_glyph` numbers the
    /// glyph images reported to the observer.
    fn classify_group(
        &self,
        gray: &GrayImage,
        group: &BoundingBox,
        index: usize,
        first_glyph: usize,
        observer: &mut dyn StageObserver,
    ) -> Vec<char> {
        let Some(region) = group.expand_within(self.params.group_margin, gray.width(), gray.height()) else {
            log::debug!("Group {} lies outside the working image", index + 1);
            return Vec::new();
        };

        let crop = imageops::crop_imm(gray, region.x, region.y, region.width, region.height).to_image();
        let binary = preprocessing::binarize(&crop, self.params.group_threshold);
        let binary = preprocessing::dilate_square(&binary, self.params.stroke_dilation);
        observer.observe("group_binary", index, &DynamicImage::ImageLuma8(binary.clone()));

        let (width, height) = self.library.glyph_size();
        let mut digits = Vec::new();
        for (_, glyph) in segment_glyphs(&binary, self.min_roi_area, width, height) {
            let found = self.best_match(&glyph);
            if self.params.min_score.is_some_and(|floor| found.score < floor) {
                log::debug!("Dropped glyph: best score {:.3} below the floor", found.score);
                continue;
            }
            log::trace!("Glyph matched {} (score {:.3})", found.digit, found.score);
            observer.observe("glyph", first_glyph + digits.len(), &DynamicImage::ImageLuma8(glyph));
            digits.push(char::from(b'0' + found.digit));
        }
        digits
    }

    /// Score the glyph against every template and keep the best.
    pub fn best_match(&self, glyph: &GrayImage) -> GlyphMatch {
        let scores: Vec<f64> = self
            .library
            .templates()
            .iter()
            .map(|t| correlation(glyph, &t.image))
            .collect();
        let (index, score) = argmax(&scores);
        GlyphMatch {
            digit: self.library.templates()[index].digit,
            score,
        }
    }
}

/// Index and value of the maximum score. Equal maxima resolve to the lowest index.
pub fn argmax(scores: &[f64]) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (i, &score) in scores.iter().enumerate() {
        if score > best.1 {
            best = (i, score);
        }
    }
    best
}

/// Zero-mean normalized cross-correlation of two equally sized images, in
/// `[-1, 1]`. A constant image correlates 0 with everything.
pub fn correlation(a: &GrayImage, b: &GrayImage) -> f64 {
    debug_assert_eq!(a.dimensions(), b.dimensions());
    let n = a.as_raw().len().min(b.as_raw().len());
    if n == 0 {
        return 0.0;
    }

    let mean = |data: &[u8]| data[..n].iter().map(|&v| v as f64).sum::<f64>() / n as f64;
    let mean_a = mean(a.as_raw());
    let mean_b = mean(b.as_raw());

    let (mut cross, mut var_a, mut var_b) = (0.0, 0.0, 0.0);
    for (&pa, &pb) in a.as_raw().iter().zip(b.as_raw().iter()) {
        let da = pa as f64 - mean_a;
        let db = pb as f64 - mean_b;
        cross += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    cross / (var_a.sqrt() * var_b.sqrt())
}
