use image::{DynamicImage, GrayImage, Rgb};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::config::GroupLocatorParams;
use crate::detection::{contours, preprocessing};
use crate::models::BoundingBox;
use crate::pipeline::StageObserver;

/// Finds the horizontal bands of a card region that hold digit groups.
pub struct GroupLocator {
    pub params: GroupLocatorParams,
}

/// Digit groups found in a card region.
#[derive(Debug, Clone)]
pub struct LocatedGroups {
    /// Grayscale card region at the normalized working width. Group boxes
    /// are in this image's coordinates.
    pub working: GrayImage,
    /// Accepted groups, left to right.
    pub groups: Vec<BoundingBox>,
}

impl GroupLocator {
    pub fn new(params: GroupLocatorParams) -> Self {
        Self { params }
    }

    pub fn locate_groups(&self, card_region: &DynamicImage, observer: &mut dyn StageObserver) -> LocatedGroups {
        if card_region.width() == 0 || card_region.height() == 0 {
            return LocatedGroups {
                working: GrayImage::new(0, 0),
                groups: Vec::new(),
            };
        }
        let resized = preprocessing::resize_to_width(card_region, self.params.target_width);
        let working = preprocessing::to_grayscale(&resized);

        let mask = self.group_mask(&working, observer);
        let blobs = contours::find_external_contours(&mask);

        let mut groups: Vec<BoundingBox> = blobs
            .iter()
            .filter_map(|blob| self.accept(blob.bounds()))
            .collect();
        groups.sort_by_key(|g| g.x);

        log::debug!("Digit groups: {} accepted of {} blobs", groups.len(), blobs.len());
        for g in &groups {
            log::trace!("  group at ({}, {}) {}x{} ar={:.2}", g.x, g.y, g.width, g.height, g.aspect_ratio());
        }
        observer.observe("groups_annotated", 0, &annotate(&working, &groups));

        LocatedGroups { working, groups }
    }

    /// Binary mask in which each digit group becomes one solid blob.
    pub fn group_mask(&self, gray: &GrayImage, observer: &mut dyn StageObserver) -> GrayImage {
        let (kw, kh) = self.params.tophat_kernel;
        let rect = preprocessing::rect_mask(kw, kh);

        let tophat = preprocessing::tophat(gray, &rect);
        observer.observe("groups_tophat", 0, &DynamicImage::ImageLuma8(tophat.clone()));

        let gradient = preprocessing::horizontal_gradient(&tophat);
        let gradient = preprocessing::close(&gradient, &rect);
        observer.observe("groups_gradient", 0, &DynamicImage::ImageLuma8(gradient.clone()));

        let thresh = preprocessing::binarize_otsu(&gradient);
        let square = preprocessing::rect_mask(self.params.close_kernel, self.params.close_kernel);
        let thresh = preprocessing::close(&thresh, &square);

        // Dilating far more than eroding fuses the strokes of a group into one blob
        let thresh = preprocessing::dilate_square(&thresh, self.params.dilate_iterations);
        let thresh = preprocessing::erode_square(&thresh, self.params.erode_iterations);
        observer.observe("groups_mask", 0, &DynamicImage::ImageLuma8(thresh.clone()));
        thresh
    }

    /// Apply the size clamps and the position, aspect and size filters.
    ///
    /// Oversized blobs are clamped rather than discarded, so a group merged
    /// with a neighbouring structure can still pass. All bounds are exclusive.
    pub fn accept(&self, bbox: BoundingBox) -> Option<BoundingBox> {
        let p = &self.params;
        if bbox.y <= p.band_min_y || bbox.y >= p.band_max_y {
            return None;
        }

        let mut clamped = bbox;
        if clamped.width > p.clamp_width_above {
            clamped.width = p.clamped_width;
        }
        if clamped.height > p.clamp_height_above {
            clamped.height = p.clamped_height;
        }

        let ar = clamped.aspect_ratio();
        let accepted = ar > p.min_aspect
            && ar < p.max_aspect
            && clamped.width > p.min_width
            && clamped.width < p.max_width
            && clamped.height > p.min_height
            && clamped.height < p.max_height;

        accepted.then_some(clamped)
    }
}

fn annotate(working: &GrayImage, groups: &[BoundingBox]) -> DynamicImage {
    let mut canvas = DynamicImage::ImageLuma8(working.clone()).to_rgb8();
    for g in groups {
        let rect = Rect::at(g.x as i32, g.y as i32).of_size(g.width.max(1), g.height.max(1));
        draw_hollow_rect_mut(&mut canvas, rect, Rgb([255u8, 0, 0]));
    }
    DynamicImage::ImageRgb8(canvas)
}
