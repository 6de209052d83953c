//! Cosmetic enhancement of the preview image.
//!
//! Contrast and sharpness follow the usual "blend towards a degenerate
//! image" formulation: a factor of 1.0 returns the input, larger factors
//! push pixels away from the degenerate image.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};

/// Adjusts contrast around the mean intensity.
pub fn adjust_contrast(img: &GrayImage, factor: f32) -> GrayImage {
    let pixels = img.as_raw();
    if pixels.is_empty() {
        return img.clone();
    }

    let sum: u64 = pixels.iter().map(|&p| p as u64).sum();
    let mean = (sum as f64 / pixels.len() as f64 + 0.5).floor() as f32;

    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        Luma([blend(mean, img.get_pixel(x, y)[0] as f32, factor)])
    })
}

/// Adjusts sharpness against a 3x3 smoothed copy of the image.
pub fn adjust_sharpness(img: &GrayImage, factor: f32) -> GrayImage {
    let smoothed = smooth(img);

    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        let base = smoothed.get_pixel(x, y)[0] as f32;
        Luma([blend(base, img.get_pixel(x, y)[0] as f32, factor)])
    })
}

/// Upscales by an integer factor with nearest-neighbour sampling.
///
/// Returns `None` when the scaled dimensions do not fit in `u32`.
pub fn upscale_nearest(img: &GrayImage, scale: u32) -> Option<GrayImage> {
    let scale = scale.max(1);
    let width = img.width().checked_mul(scale)?;
    let height = img.height().checked_mul(scale)?;
    Some(imageops::resize(img, width, height, FilterType::Nearest))
}

/// Smoothing kernel: unit weights around a centre weight of 5.
///
/// Border pixels are copied unchanged.
fn smooth(img: &GrayImage) -> GrayImage {
    const CENTER: u32 = 5;
    const WEIGHT: f32 = 13.0;

    let (w, h) = img.dimensions();
    if w < 3 || h < 3 {
        return img.clone();
    }

    GrayImage::from_fn(w, h, |x, y| {
        if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
            return *img.get_pixel(x, y);
        }

        let mut acc = 0u32;
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                acc += img.get_pixel(nx, ny)[0] as u32;
            }
        }
        acc += (CENTER - 1) * img.get_pixel(x, y)[0] as u32;

        Luma([(acc as f32 / WEIGHT).round().clamp(0.0, 255.0) as u8])
    })
}

#[inline]
fn blend(base: f32, pixel: f32, factor: f32) -> u8 {
    (base + factor * (pixel - base)).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([((x * 13 + y * 29) % 256) as u8]))
    }

    #[test]
    fn test_unit_factors_are_identity() {
        let img = gradient(16, 12);

        assert_eq!(adjust_contrast(&img, 1.0), img);
        assert_eq!(adjust_sharpness(&img, 1.0), img);
    }

    #[test]
    fn test_contrast_spreads_around_mean() {
        let img = GrayImage::from_raw(2, 1, vec![100, 200]).unwrap();
        let out = adjust_contrast(&img, 1.5);

        // mean 150: 150 - 1.5*50, 150 + 1.5*50
        assert_eq!(out.as_raw(), &vec![75, 225]);
    }

    #[test]
    fn test_contrast_clamps() {
        let img = GrayImage::from_raw(2, 1, vec![0, 255]).unwrap();
        let out = adjust_contrast(&img, 3.0);

        assert_eq!(out.as_raw(), &vec![0, 255]);
    }

    #[test]
    fn test_sharpness_leaves_flat_image() {
        let img = GrayImage::from_pixel(8, 8, Luma([90]));
        assert_eq!(adjust_sharpness(&img, 1.5), img);
    }

    #[test]
    fn test_sharpness_boosts_isolated_peak() {
        let mut img = GrayImage::from_pixel(5, 5, Luma([0]));
        img.put_pixel(2, 2, Luma([130]));

        let out = adjust_sharpness(&img, 1.5);

        // smoothed centre = 130*5/13 = 50; 50 + 1.5*(130-50) = 170
        assert_eq!(out.get_pixel(2, 2)[0], 170);
        // borders keep their value
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_upscale_replicates_pixels() {
        let img = GrayImage::from_raw(2, 1, vec![10, 20]).unwrap();
        let out = upscale_nearest(&img, 2).unwrap();

        assert_eq!(out.dimensions(), (4, 2));
        assert_eq!(out.as_raw(), &vec![10, 10, 20, 20, 10, 10, 20, 20]);
    }

    #[test]
    fn test_upscale_by_three_keeps_blocks() {
        let img = GrayImage::from_raw(2, 2, vec![1, 2, 3, 4]).unwrap();
        let out = upscale_nearest(&img, 3).unwrap();

        assert_eq!(out.dimensions(), (6, 6));
        assert_eq!(&out.as_raw()[..6], &[1, 1, 1, 2, 2, 2]);
        assert_eq!(&out.as_raw()[30..], &[3, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn test_upscale_overflow_rejected() {
        let img = GrayImage::from_raw(2, 1, vec![10, 20]).unwrap();
        assert!(upscale_nearest(&img, u32::MAX).is_none());
    }

    #[test]
    fn test_tiny_image_not_smoothed() {
        let img = gradient(2, 2);
        assert_eq!(smooth(&img), img);
    }
}
