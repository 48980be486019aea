// THEORY:
// The patch renderer is the drawing side of the overlay flow. Given an
// `OverlayKind` and a box size it paints a procedural texture into a transparent
// RGBA patch, and given a `Placement` it composites that patch onto the canvas.
// It also prepares externally generated cut-outs (near-white background removed,
// scaled into the patch box) so they can travel the same compositing path.
//
// All randomness (dot radii, block offsets, speckles) is drawn from the caller's
// RNG so a seeded session renders the same canvas twice.

use crate::core_modules::overlay::{OverlayKind, Placement};
use image::imageops::FilterType;
use image::{Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_polygon_mut};
use imageproc::geometric_transformations::{Interpolation, rotate_about_center};
use imageproc::point::Point;
use imageproc::rect::Rect;
use rand::Rng;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

const CHECKER_CELL: u32 = 12;
const CHECKER_LIGHT: u8 = 245;
const CHECKER_DARK: u8 = 25;
const CHECKER_ALPHA: u8 = 185;

const HALFTONE_SPACING: u32 = 10;
const HALFTONE_INK: Rgba<u8> = Rgba([0, 0, 0, 166]);

const CMY_ALPHA: u8 = 179;
const TAPE_COLOR: Rgba<u8> = Rgba([245, 230, 180, 191]);
const TAPE_FIBER: Rgba<u8> = Rgba([200, 185, 140, 51]);
const PAPER: Rgba<u8> = Rgba([248, 248, 248, 255]);

/// Near-white threshold used when cutting a generated image out of its background.
pub const CUTOUT_WHITE_THRESHOLD: u8 = 242;
/// Smallest side a fitted cut-out may have.
pub const MIN_CUTOUT_SIDE: u32 = 8;

/// Paints a `width` x `height` patch of the given kind.
pub fn render_patch<R: Rng + ?Sized>(kind: OverlayKind, width: u32, height: u32, rng: &mut R) -> RgbaImage {
    let width = width.max(1);
    let height = height.max(1);
    match kind {
        OverlayKind::Checker => checker(width, height),
        OverlayKind::Halftone => halftone(width, height, rng),
        OverlayKind::Cmy => cmy(width, height, rng),
        OverlayKind::TapeX => tape_x(width, height, rng),
        OverlayKind::Photocopy => photocopy(width, height, rng),
    }
}

fn checker(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let on = ((x / CHECKER_CELL) ^ (y / CHECKER_CELL)) & 1 == 1;
        let v = if on { CHECKER_LIGHT } else { CHECKER_DARK };
        Rgba([v, v, v, CHECKER_ALPHA])
    })
}

fn halftone<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> RgbaImage {
    let mut patch = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let half = HALFTONE_SPACING / 2;
    for y in (half..height).step_by(HALFTONE_SPACING as usize) {
        for x in (half..width).step_by(HALFTONE_SPACING as usize) {
            draw_filled_circle_mut(&mut patch, (x as i32, y as i32), dot_radius(rng), HALFTONE_INK);
        }
    }
    patch
}

/// Dot radius drawn from [2, 5) and floored to whole pixels.
fn dot_radius<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    rng.gen_range(2.0..5.0_f64).floor() as i32
}

fn cmy<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> RgbaImage {
    let mut patch = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let pad = (width as f64 * 0.05).floor() as i32;
    let block_w = ((width as i32 - 3 * pad) / 3).max(1) as u32;
    let block_h = (height as i32 - 2 * pad).max(1) as u32;
    let inks = [[0, 255, 255], [255, 0, 255], [255, 255, 0]];
    for (i, [r, g, b]) in inks.into_iter().enumerate() {
        let offset_x = rng.gen_range(-3..3);
        let offset_y = rng.gen_range(-3..3);
        let x = pad + i as i32 * (block_w as i32 + pad) + offset_x;
        let rect = Rect::at(x, pad + offset_y).of_size(block_w, block_h);
        draw_filled_rect_mut(&mut patch, rect, Rgba([r, g, b, CMY_ALPHA]));
    }
    patch
}

fn tape_x<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> RgbaImage {
    let mut patch = RgbaImage::from_pixel(width, height, TRANSPARENT);
    let (w, h) = (width as f64, height as f64);
    let length = w.max(h) * 0.9;
    let thickness = (w.min(h) * 0.12).max(10.0);
    tape_strip(&mut patch, (w * 0.05, h * 0.5), length, thickness, 0.8, rng);
    tape_strip(&mut patch, (w * 0.95, h * 0.5), -length, thickness, -0.8, rng);
    patch
}

/// One translucent tape strip starting at `origin`, running `length` along
/// `angle`, with faint paper fibers blended over it.
fn tape_strip<R: Rng + ?Sized>(
    patch: &mut RgbaImage,
    origin: (f64, f64),
    length: f64,
    thickness: f64,
    angle: f64,
    rng: &mut R,
) {
    let (sin, cos) = angle.sin_cos();
    let along = |t: f64, n: f64| -> (f64, f64) {
        (origin.0 + t * cos - n * sin, origin.1 + t * sin + n * cos)
    };
    let half = thickness / 2.0;
    let corners = [along(0.0, -half), along(length, -half), along(length, half), along(0.0, half)];
    let polygon: Vec<Point<i32>> = corners
        .iter()
        .map(|&(x, y)| Point::new(x.round() as i32, y.round() as i32))
        .collect();
    draw_polygon_mut(patch, &polygon, TAPE_COLOR);

    let fibers = (length.abs() * thickness * 0.01).floor() as usize;
    for _ in 0..fibers {
        let (x, y) = along(rng.gen_range(0.0..1.0) * length, (rng.gen_range(0.0..1.0) - 0.5) * thickness);
        if x >= 0.0 && y >= 0.0 && (x as u32) < patch.width() && (y as u32) < patch.height() {
            patch.get_pixel_mut(x as u32, y as u32).blend(&TAPE_FIBER);
        }
    }
}

fn photocopy<R: Rng + ?Sized>(width: u32, height: u32, rng: &mut R) -> RgbaImage {
    let mut patch = RgbaImage::from_pixel(width, height, PAPER);
    for y in (0..height).step_by(2) {
        let toner = if rng.gen_bool(0.5) { 26 } else { 8 };
        for x in 0..width {
            patch.get_pixel_mut(x, y).blend(&Rgba([0, 0, 0, toner]));
        }
    }
    let specks = (width as f64 * height as f64 * 0.006) as usize;
    for _ in 0..specks {
        let x = rng.gen_range(0..width);
        let y = rng.gen_range(0..height);
        patch.get_pixel_mut(x, y).blend(&Rgba([0, 0, 0, 128]));
    }
    if width > 2 && height > 2 {
        let border = Rgba([51, 51, 51, 255]);
        draw_hollow_rect_mut(&mut patch, Rect::at(0, 0).of_size(width, height), border);
        draw_hollow_rect_mut(&mut patch, Rect::at(1, 1).of_size(width - 2, height - 2), border);
    }
    patch
}

/// Rotates `patch` about its center and alpha-composites it at the placement.
pub fn composite(canvas: &mut RgbaImage, patch: &RgbaImage, placement: &Placement) {
    let rotated = if placement.rotation == 0.0 {
        patch.clone()
    } else {
        rotate_about_center(patch, placement.rotation, Interpolation::Bilinear, TRANSPARENT)
    };
    image::imageops::overlay(canvas, &rotated, placement.x as i64, placement.y as i64);
}

/// Makes every pixel whose R, G and B are all at least `threshold` transparent.
pub fn white_to_transparent(image: &mut RgbaImage, threshold: u8) {
    for pixel in image.pixels_mut() {
        let Rgba([r, g, b, _]) = *pixel;
        if r >= threshold && g >= threshold && b >= threshold {
            pixel.0[3] = 0;
        }
    }
}

/// Scales `image` to fit inside `max_width` x `max_height`, keeping its aspect
/// ratio and never going below `MIN_CUTOUT_SIDE` on either side.
pub fn fit_within(image: &RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let scale = (max_width as f64 / image.width().max(1) as f64).min(max_height as f64 / image.height().max(1) as f64);
    let width = ((image.width() as f64 * scale).floor() as u32).max(MIN_CUTOUT_SIDE);
    let height = ((image.height() as f64 * scale).floor() as u32).max(MIN_CUTOUT_SIDE);
    image::imageops::resize(image, width, height, FilterType::Triangle)
}
