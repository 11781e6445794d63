use image::DynamicImage;
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;

use crate::config::CardLocatorParams;
use crate::detection::{contours, preprocessing};
use crate::models::{BoundingBox, Contour, Roi};
use crate::pipeline::StageObserver;

/// Finds the quadrilateral most likely to be a card in a single frame.
pub struct CardLocator {
    pub params: CardLocatorParams,
}

/// A four-cornered outline that passed the aspect filter.
#[derive(Debug, Clone)]
pub struct CardCandidate {
    pub corners: Vec<Point<i32>>,
    pub bbox: BoundingBox,
    pub area: f64,
    pub aspect_ratio: f32,
}

impl CardLocator {
    pub fn new(params: CardLocatorParams) -> Self {
        Self { params }
    }

    /// Crop of the best card candidate, taken from the resized frame.
    ///
    /// Returns `None` when no outline in this frame qualifies; retrying on
    /// later frames is up to the caller.
    pub fn locate(&self, frame: &DynamicImage, observer: &mut dyn StageObserver) -> Option<Roi> {
        if frame.width() == 0 || frame.height() == 0 {
            return None;
        }
        let resized = preprocessing::resize_to_height(frame, self.params.target_height);
        observer.observe("card_resized", 0, &resized);

        let gray = preprocessing::to_grayscale(&resized);
        let blurred = preprocessing::apply_blur(&gray, self.params.blur_sigma);
        let edges = preprocessing::detect_edges(&blurred, self.params.canny_low, self.params.canny_high);
        observer.observe("card_edges", 0, &DynamicImage::ImageLuma8(edges.clone()));

        let outlines = contours::find_external_contours(&edges);
        let best = self.best_candidate(&outlines);

        match &best {
            Some(candidate) => log::debug!(
                "Card candidate at ({}, {}) {}x{}, aspect {:.2}, area {:.0} (from {} outlines)",
                candidate.bbox.x,
                candidate.bbox.y,
                candidate.bbox.width,
                candidate.bbox.height,
                candidate.aspect_ratio,
                candidate.area,
                outlines.len()
            ),
            None => log::debug!("No card outline among {} contours", outlines.len()),
        }

        let bbox = best?.bbox;
        let image = resized.crop_imm(bbox.x, bbox.y, bbox.width, bbox.height);
        observer.observe("card_region", 0, &image);
        Some(Roi { bbox, image })
    }

    /// The qualifying quadrilateral with the largest contour area.
    pub fn best_candidate(&self, outlines: &[Contour]) -> Option<CardCandidate> {
        let mut best: Option<CardCandidate> = None;
        for outline in outlines {
            let Some(candidate) = self.qualify(outline) else {
                continue;
            };
            let largest = best.as_ref().map_or(0.0, |b| b.area);
            if candidate.area > largest {
                best = Some(candidate);
            }
        }
        best
    }

    /// Approximate the outline as a polygon and apply the card shape filters.
    pub fn qualify(&self, outline: &Contour) -> Option<CardCandidate> {
        let epsilon = self.params.approx_epsilon_frac * outline.perimeter();
        if outline.points.len() < 4 || epsilon <= 0.0 {
            return None;
        }
        let corners = approximate_polygon_dp(&outline.points, epsilon, true);
        if corners.len() != 4 {
            return None;
        }

        let bbox = Contour::from_points(corners.clone())?.bounds();
        let (long, short) = if bbox.width >= bbox.height {
            (bbox.width, bbox.height)
        } else {
            (bbox.height, bbox.width)
        };
        let aspect_ratio = long as f32 / short as f32;
        if aspect_ratio < self.params.min_aspect || aspect_ratio > self.params.max_aspect {
            return None;
        }

        Some(CardCandidate {
            corners,
            bbox,
            area: outline.area(),
            aspect_ratio,
        })
    }
}
