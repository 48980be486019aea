#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use rand::Rng;

/// A single flat color.
pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([rgb[0], rgb[1], rgb[2], 255]))
}

/// Pure black/white checkerboard with square cells of `cell` pixels.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> RgbaImage {
    assert!(cell > 0, "cell size must be positive");
    RgbaImage::from_fn(width, height, |x, y| {
        let v = if ((x / cell) + (y / cell)) & 1 == 0 { 0 } else { 255 };
        Rgba([v, v, v, 255])
    })
}

/// Gray `dark` on the left half, gray `bright` on the right half.
pub fn split_halves(width: u32, height: u32, dark: u8, bright: u8) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, _| {
        let v = if x < width / 2 { dark } else { bright };
        Rgba([v, v, v, 255])
    })
}

/// Uniform RGB noise.
pub fn noise<R: Rng>(width: u32, height: u32, rng: &mut R) -> RgbaImage {
    RgbaImage::from_fn(width, height, |_, _| Rgba([rng.r#gen(), rng.r#gen(), rng.r#gen(), 255]))
}

/// Encodes `image` as PNG bytes, the way a file upload would arrive.
pub fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}
