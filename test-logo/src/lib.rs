//! Synthetic logo images for exercising the converter.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const FILL: Rgb<u8> = Rgb([0x34, 0x98, 0xdb]);
pub const OUTLINE: Rgb<u8> = Rgb([0x29, 0x80, 0xb9]);

/// Reference canvas the logo layout is specified on
const BASE: f32 = 200.0;

/// Outlined blue circle with a white bar and two white dots, on white.
///
/// Laid out on a 200x200 grid and scaled to `size`.
pub fn draw_logo(size: u32) -> RgbImage {
    let s = |v: f32| (v * size as f32 / BASE).round() as i32;
    let mut img = RgbImage::from_pixel(size, size, WHITE);

    let center = (s(100.0), s(100.0));
    draw_filled_circle_mut(&mut img, center, s(50.0), OUTLINE);
    draw_filled_circle_mut(&mut img, center, s(47.0), FILL);

    let bar = Rect::at(s(90.0), s(80.0)).of_size(s(20.0).max(1) as u32, s(40.0).max(1) as u32);
    draw_filled_rect_mut(&mut img, bar, WHITE);
    draw_filled_circle_mut(&mut img, (s(90.0), s(100.0)), s(5.0), WHITE);
    draw_filled_circle_mut(&mut img, (s(110.0), s(100.0)), s(5.0), WHITE);

    img
}

/// Solid blue circle filling most of a white square
pub fn draw_plain_circle(size: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(size, size, WHITE);
    let c = (size / 2) as i32;
    draw_filled_circle_mut(&mut img, (c, c), (size as f32 * 0.35) as i32, FILL);
    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_layout() {
        let img = draw_logo(200);
        assert_eq!(img.dimensions(), (200, 200));
        assert_eq!(*img.get_pixel(5, 5), WHITE);
        assert_eq!(*img.get_pixel(100, 60), FILL);
        assert_eq!(*img.get_pixel(100, 100), WHITE);
        assert_eq!(*img.get_pixel(100, 51), OUTLINE);
    }

    #[test]
    fn test_plain_circle() {
        let img = draw_plain_circle(100);
        assert_eq!(img.dimensions(), (100, 100));
        assert_eq!(*img.get_pixel(50, 50), FILL);
        assert_eq!(*img.get_pixel(2, 2), WHITE);
        let blue = img.pixels().filter(|p| **p == FILL).count();
        assert!(blue > 3000 && blue < 4500, "blue pixels: {blue}");
    }

    #[test]
    fn test_logo_scales() {
        let img = draw_logo(64);
        assert_eq!(img.dimensions(), (64, 64));
        assert_eq!(*img.get_pixel(32, 32), WHITE);
        assert_eq!(*img.get_pixel(32, 20), FILL);
    }
}
