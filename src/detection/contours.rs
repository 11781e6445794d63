use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use crate::models::Contour;

/// Find the outermost borders of the foreground (non-zero) regions.
///
/// Borders nested inside holes of other regions are skipped, so a ring-shaped
/// glyph such as `0` yields a single contour.
pub fn find_external_contours(binary: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| Contour::from_points(c.points))
        .collect()
}

/// Sort contours by the left edge of their bounding box.
pub fn sort_left_to_right(contours: &mut [Contour]) {
    contours.sort_by_key(|c| (c.min_x, c.min_y));
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Luma([255u8]));
            }
        }
    }

    #[test]
    fn test_nested_regions_are_not_external() {
        let mut img = GrayImage::new(60, 40);
        // Ring with a blob inside its hole
        fill(&mut img, 5, 5, 30, 30);
        for y in 10..30 {
            for x in 10..30 {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }
        fill(&mut img, 17, 17, 5, 5);
        fill(&mut img, 45, 10, 6, 6);

        let mut contours = find_external_contours(&img);
        sort_left_to_right(&mut contours);

        assert_eq!(contours.len(), 2);
        assert_eq!((contours[0].min_x, contours[0].width()), (5, 30));
        assert_eq!((contours[1].min_x, contours[1].height()), (45, 6));
    }

    #[test]
    fn test_empty_image_has_no_contours() {
        assert!(find_external_contours(&GrayImage::new(10, 10)).is_empty());
    }
}
