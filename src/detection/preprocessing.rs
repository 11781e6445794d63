use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::gradients::horizontal_scharr;
use imageproc::morphology::{self, Mask};

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Detect edges using Canny edge detector
pub fn detect_edges(img: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    canny(img, low_threshold, high_threshold)
}

/// Resize to `target_height`, keeping the aspect ratio.
pub fn resize_to_height(img: &DynamicImage, target_height: u32) -> DynamicImage {
    if img.height() == target_height || img.height() == 0 {
        return img.clone();
    }
    let ratio = target_height as f64 / img.height() as f64;
    let width = ((img.width() as f64 * ratio) as u32).max(1);
    img.resize_exact(width, target_height, FilterType::Triangle)
}

/// Resize to `target_width`, keeping the aspect ratio.
pub fn resize_to_width(img: &DynamicImage, target_width: u32) -> DynamicImage {
    if img.width() == target_width || img.width() == 0 {
        return img.clone();
    }
    let ratio = target_width as f64 / img.width() as f64;
    let height = ((img.height() as f64 * ratio) as u32).max(1);
    img.resize_exact(target_width, height, FilterType::Triangle)
}

/// Resize a glyph crop to the canonical template size.
pub fn resize_glyph(img: &GrayImage, width: u32, height: u32) -> GrayImage {
    imageops::resize(img, width, height, FilterType::Triangle)
}

/// Pixels above `level` become 255, all others 0.
pub fn binarize(img: &GrayImage, level: u8) -> GrayImage {
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] > level { Luma([255u8]) } else { Luma([0u8]) }
    })
}

/// Pixels above `level` become 0, all others 255.
pub fn binarize_inverted(img: &GrayImage, level: u8) -> GrayImage {
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[0] > level { Luma([0u8]) } else { Luma([255u8]) }
    })
}

/// Binarize with the level chosen by Otsu's method.
pub fn binarize_otsu(img: &GrayImage) -> GrayImage {
    binarize(img, otsu_level(img))
}

/// Rectangular structuring element centred on the middle pixel.
pub fn rect_mask(width: u8, height: u8) -> Mask {
    let kernel = GrayImage::from_pixel(width as u32, height as u32, Luma([255u8]));
    Mask::from_image(&kernel, width / 2, height / 2)
}

/// White top-hat: the image minus its opening. Keeps bright details smaller
/// than the structuring element.
pub fn tophat(img: &GrayImage, mask: &Mask) -> GrayImage {
    let opened = morphology::grayscale_open(img, mask);
    ImageBuffer::from_fn(img.width(), img.height(), |x, y| {
        Luma([img.get_pixel(x, y)[0].saturating_sub(opened.get_pixel(x, y)[0])])
    })
}

pub fn close(img: &GrayImage, mask: &Mask) -> GrayImage {
    morphology::grayscale_close(img, mask)
}

/// Repeated 3x3 dilation of a binary image.
pub fn dilate_square(img: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 {
        return img.clone();
    }
    morphology::dilate(img, Norm::LInf, iterations)
}

/// Repeated 3x3 erosion of a binary image.
pub fn erode_square(img: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 {
        return img.clone();
    }
    morphology::erode(img, Norm::LInf, iterations)
}

/// Absolute horizontal derivative, min-max scaled to the full 0-255 range.
/// A flat input yields an all-zero image.
pub fn horizontal_gradient(img: &GrayImage) -> GrayImage {
    let grad = horizontal_scharr(img);

    let magnitudes: Vec<u32> = grad.pixels().map(|p| p[0].unsigned_abs() as u32).collect();
    let min = magnitudes.iter().copied().min().unwrap_or(0);
    let max = magnitudes.iter().copied().max().unwrap_or(0);
    let range = max - min;

    let mut out = GrayImage::new(img.width(), img.height());
    if range == 0 {
        return out;
    }
    for (pixel, &m) in out.pixels_mut().zip(magnitudes.iter()) {
        *pixel = Luma([((255 * (m - min)) / range) as u8]);
    }
    out
}
