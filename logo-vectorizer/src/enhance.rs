//! Preprocessing filters applied before tracing.
//!
//! Each level is a fixed, ordered chain: denoise, then sharpen, then tonal
//! adjustments. No filter changes the buffer dimensions.

use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::debug;

/// PIL-style 3x3 sharpen kernel, row-major, normalized by its sum
const SHARPEN_KERNEL: [i32; 9] = [-2, -2, -2, -2, 32, -2, -2, -2, -2];
const SHARPEN_DIVISOR: f32 = 16.0;

const STANDARD_CONTRAST: f32 = 1.2;

const ULTRA_BLUR_SIGMA: f32 = 0.5;
const ULTRA_UNSHARP_RADIUS: f32 = 2.0;
const ULTRA_UNSHARP_PERCENT: i32 = 150;
const ULTRA_UNSHARP_THRESHOLD: i32 = 3;
const ULTRA_CONTRAST: f32 = 1.4;
const ULTRA_SATURATION: f32 = 1.1;

/// Quality enhancement level, mutually exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnhancementLevel {
    /// Pass the buffer through unchanged
    None,
    /// Sharpen, then contrast x1.2
    #[default]
    Standard,
    /// Blur, unsharp mask, contrast x1.4, saturation x1.1
    Ultra,
}

impl EnhancementLevel {
    /// Resolve the `--no-enhance` / `--ultra-quality` flag pair.
    ///
    /// `ultra` wins when both are set.
    pub fn from_flags(no_enhance: bool, ultra: bool) -> Self {
        match (no_enhance, ultra) {
            (_, true) => Self::Ultra,
            (true, false) => Self::None,
            (false, false) => Self::Standard,
        }
    }
}

/// Run the filter chain for `level` over `image`
pub fn enhance(image: &RgbaImage, level: EnhancementLevel) -> RgbaImage {
    debug!("Enhancing {}x{} image ({})", image.width(), image.height(), level);

    match level {
        EnhancementLevel::None => image.clone(),
        EnhancementLevel::Standard => {
            let sharpened = sharpen(image);
            contrast(&sharpened, STANDARD_CONTRAST)
        }
        EnhancementLevel::Ultra => {
            let blurred = gaussian_blur(image, ULTRA_BLUR_SIGMA);
            let masked = unsharp_mask(
                &blurred,
                ULTRA_UNSHARP_RADIUS,
                ULTRA_UNSHARP_PERCENT,
                ULTRA_UNSHARP_THRESHOLD,
            );
            let contrasted = contrast(&masked, ULTRA_CONTRAST);
            saturate(&contrasted, ULTRA_SATURATION)
        }
    }
}

/// 3x3 sharpen. The one-pixel border keeps the source values.
///
/// Each weighted sum is divided by the kernel sum and rounded to nearest.
pub fn sharpen(image: &RgbaImage) -> RgbaImage {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return image.clone();
    }

    let mut out = image.clone();
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let mut sums = [0i32; 4];
            for (i, weight) in SHARPEN_KERNEL.iter().enumerate() {
                let px = image.get_pixel(x + (i as u32 % 3) - 1, y + (i as u32 / 3) - 1);
                for (sum, &c) in sums.iter_mut().zip(px.0.iter()) {
                    *sum += weight * c as i32;
                }
            }
            let value = sums.map(|sum| {
                (sum as f32 / SHARPEN_DIVISOR).round().clamp(0.0, 255.0) as u8
            });
            out.put_pixel(x, y, Rgba(value));
        }
    }

    out
}

pub fn gaussian_blur(image: &RgbaImage, sigma: f32) -> RgbaImage {
    imageops::blur(image, sigma)
}

/// Unsharp mask over every channel.
///
/// Channels that differ from the blurred copy by less than `threshold` are
/// left alone; the rest move away from it by `percent`% of the difference.
pub fn unsharp_mask(image: &RgbaImage, radius: f32, percent: i32, threshold: i32) -> RgbaImage {
    let blurred = imageops::blur(image, radius);
    let mut out = image.clone();

    for (px, soft) in out.pixels_mut().zip(blurred.pixels()) {
        for (c, &b) in px.0.iter_mut().zip(soft.0.iter()) {
            let orig = *c as i32;
            let diff = orig - b as i32;
            if diff.abs() >= threshold {
                *c = (orig + diff * percent / 100).clamp(0, 255) as u8;
            }
        }
    }

    out
}

/// Contrast around the image's mean luminance. Alpha is untouched.
pub fn contrast(image: &RgbaImage, factor: f32) -> RgbaImage {
    let mean = mean_luma(image) as f32;
    map_rgb(image, |_, c| blend(mean, c, factor))
}

/// Saturation around each pixel's own luminance. Alpha is untouched.
pub fn saturate(image: &RgbaImage, factor: f32) -> RgbaImage {
    map_rgb(image, |px, c| blend(luma(px) as f32, c, factor))
}

/// ITU-R 601-2 luma
fn luma(px: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = px.0;
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114 + 500) / 1000) as u8
}

fn mean_luma(image: &RgbaImage) -> u8 {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return 0;
    }
    let total: u64 = image.pixels().map(|px| luma(px) as u64).sum();
    ((total as f64 / count as f64) + 0.5) as u8
}

fn blend(degenerate: f32, c: u8, factor: f32) -> u8 {
    (degenerate + factor * (c as f32 - degenerate)).round().clamp(0.0, 255.0) as u8
}

fn map_rgb<F>(image: &RgbaImage, f: F) -> RgbaImage
where
    F: Fn(&Rgba<u8>, u8) -> u8,
{
    let mut out = image.clone();
    for px in out.pixels_mut() {
        let src = *px;
        for c in px.0.iter_mut().take(3) {
            *c = f(&src, *c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x / 4 + y / 4) % 2 == 0 {
                Rgba([52, 152, 219, 255])
            } else {
                Rgba([255, 255, 255, 128])
            }
        })
    }

    #[test]
    fn test_none_is_bit_identical() {
        let img = checker(17, 11);
        let once = enhance(&img, EnhancementLevel::None);
        let twice = enhance(&once, EnhancementLevel::None);
        assert_eq!(once, img);
        assert_eq!(twice, img);
    }

    #[test]
    fn test_levels_are_deterministic_and_keep_dimensions() {
        let img = checker(23, 9);
        for level in [EnhancementLevel::Standard, EnhancementLevel::Ultra] {
            let a = enhance(&img, level);
            let b = enhance(&img, level);
            assert_eq!(a, b);
            assert_eq!(a.dimensions(), img.dimensions());
        }
    }

    #[test]
    fn test_tiny_images_survive() {
        for (w, h) in [(1, 1), (2, 5), (3, 3)] {
            let img = checker(w, h);
            for level in [EnhancementLevel::None, EnhancementLevel::Standard, EnhancementLevel::Ultra] {
                assert_eq!(enhance(&img, level).dimensions(), (w, h));
            }
        }
    }

    #[test]
    fn test_sharpen_keeps_flat_regions_and_border() {
        let flat = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
        assert_eq!(sharpen(&flat), flat);

        let mut img = RgbaImage::from_pixel(5, 5, Rgba([100, 100, 100, 255]));
        img.put_pixel(2, 2, Rgba([140, 140, 140, 255]));
        let out = sharpen(&img);
        // centre: (32*140 - 2*8*100) / 16 = 180
        assert_eq!(out.get_pixel(2, 2).0, [180, 180, 180, 255]);
        // neighbour: (32*100 - 2*7*100 - 2*140) / 16 = 95
        assert_eq!(out.get_pixel(1, 2).0, [95, 95, 95, 255]);
        assert_eq!(out.get_pixel(0, 0), img.get_pixel(0, 0));
        assert_eq!(out.get_pixel(4, 2), img.get_pixel(4, 2));
    }

    #[test]
    fn test_sharpen_rounds_to_nearest() {
        let mut img = RgbaImage::from_pixel(5, 5, Rgba([100, 100, 100, 255]));
        img.put_pixel(2, 2, Rgba([141, 141, 141, 255]));
        let out = sharpen(&img);
        // centre: (32*141 - 2*8*100) / 16 = 182
        assert_eq!(out.get_pixel(2, 2).0, [182, 182, 182, 255]);
        // neighbour: (32*100 - 2*7*100 - 2*141) / 16 = 94.875, truncation would give 94
        assert_eq!(out.get_pixel(1, 2).0, [95, 95, 95, 255]);
    }

    #[test]
    fn test_contrast_stretches_around_mean() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([100, 100, 100, 255]));
        img.put_pixel(1, 0, Rgba([200, 200, 200, 77]));
        let out = contrast(&img, 1.2);
        // mean luma 150
        assert_eq!(out.get_pixel(0, 0).0, [90, 90, 90, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [210, 210, 210, 77]);
    }

    #[test]
    fn test_contrast_clamps() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([255, 255, 255, 255]));
        let out = contrast(&img, 1.4);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(1, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_saturate_leaves_grey_alone() {
        let grey = RgbaImage::from_pixel(3, 3, Rgba([128, 128, 128, 200]));
        assert_eq!(saturate(&grey, 1.1), grey);

        let blue = RgbaImage::from_pixel(1, 1, Rgba([52, 152, 219, 255]));
        let out = saturate(&blue, 1.1);
        let [r, g, b, a] = out.get_pixel(0, 0).0;
        assert!(r < 52);
        assert!(b > 219);
        assert!(g > 152);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_unsharp_mask_respects_threshold() {
        let flat = RgbaImage::from_pixel(6, 6, Rgba([90, 90, 90, 255]));
        assert_eq!(unsharp_mask(&flat, 2.0, 150, 3), flat);

        let img = checker(16, 16);
        let strong = unsharp_mask(&img, 2.0, 150, 3);
        let silent = unsharp_mask(&img, 2.0, 150, 256);
        assert_ne!(strong, img);
        assert_eq!(silent, img);
    }

    #[test]
    fn test_flag_precedence() {
        assert_eq!(EnhancementLevel::from_flags(false, false), EnhancementLevel::Standard);
        assert_eq!(EnhancementLevel::from_flags(true, false), EnhancementLevel::None);
        assert_eq!(EnhancementLevel::from_flags(false, true), EnhancementLevel::Ultra);
        assert_eq!(EnhancementLevel::from_flags(true, true), EnhancementLevel::Ultra);
    }
}
