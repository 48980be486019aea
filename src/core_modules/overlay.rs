// THEORY:
// The overlay selector decides *what* synthetic patch illustrates a set of
// recommendations and *where* it lands. It never draws; the patch renderer and
// the canvas do that.
//
// Key architectural principles:
// 1.  **Text-Driven Selection**: The kind is read from the joined, lowercased
//     phrases with a first-match priority list: halftone, checker, cmy (or
//     "misregistration"), tape X (or "masking"), photocopy, then checker as the
//     fallback. The order is the tie-break: a set that mentions both halftone
//     and checker gets a halftone patch.
// 2.  **Anchored Placement**: The patch box is 45% x 25% of the canvas, anchored
//     at the region's fixed fraction pair, jittered by up to ±8% of each canvas
//     dimension, clamped inside the canvas and rotated by up to ±6°.
// 3.  **Injected Chance**: Jitter and rotation come from the caller's RNG.

use crate::core_modules::region::RegionLabel;
use rand::Rng;
use std::fmt;

pub const PATCH_WIDTH_FRACTION: f64 = 0.45;
pub const PATCH_HEIGHT_FRACTION: f64 = 0.25;
const JITTER_FRACTION: f64 = 0.08;
const MAX_ROTATION_DEGREES: f64 = 6.0;

/// The synthetic patch archetypes the renderer knows how to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    Halftone,
    Checker,
    Cmy,
    TapeX,
    Photocopy,
}

impl OverlayKind {
    pub fn tag(&self) -> &'static str {
        match self {
            OverlayKind::Halftone => "halftone",
            OverlayKind::Checker => "checker",
            OverlayKind::Cmy => "cmy",
            OverlayKind::TapeX => "tapex",
            OverlayKind::Photocopy => "photocopy",
        }
    }

    /// Picks the overlay for a set of recommendation phrases.
    pub fn from_phrases<S: AsRef<str>>(phrases: &[S]) -> Self {
        let text = phrases
            .iter()
            .map(|phrase| phrase.as_ref())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if text.contains("halftone") {
            OverlayKind::Halftone
        } else if text.contains("checker") {
            OverlayKind::Checker
        } else if text.contains("misregistration") || text.contains("cmy") {
            OverlayKind::Cmy
        } else if text.contains("masking-tape") || text.contains("tape x") || text.contains("masking") {
            OverlayKind::TapeX
        } else if text.contains("photocopy") {
            OverlayKind::Photocopy
        } else {
            OverlayKind::Checker
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Where and how a patch of a given size is composited onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Top-left corner of the unrotated patch box.
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Rotation about the box center, in radians.
    pub rotation: f32,
}

/// The default patch box for a canvas: floor(45% W) by floor(25% H), at least 1x1.
pub fn patch_size(canvas_width: u32, canvas_height: u32) -> (u32, u32) {
    (
        ((canvas_width as f64 * PATCH_WIDTH_FRACTION).floor() as u32).max(1),
        ((canvas_height as f64 * PATCH_HEIGHT_FRACTION).floor() as u32).max(1),
    )
}

/// Places a `width` x `height` patch in `region` of a canvas.
pub fn place<R: Rng + ?Sized>(
    region: RegionLabel,
    canvas_width: u32,
    canvas_height: u32,
    width: u32,
    height: u32,
    rng: &mut R,
) -> Placement {
    let (anchor_x, anchor_y) = region.anchor();
    let canvas_w = canvas_width as f64;
    let canvas_h = canvas_height as f64;
    let jitter_x = rng.gen_range(-JITTER_FRACTION..JITTER_FRACTION) * canvas_w;
    let jitter_y = rng.gen_range(-JITTER_FRACTION..JITTER_FRACTION) * canvas_h;

    let max_x = canvas_width.saturating_sub(width) as f64;
    let max_y = canvas_height.saturating_sub(height) as f64;
    let x = (canvas_w * anchor_x + jitter_x).floor().clamp(0.0, max_x) as u32;
    let y = (canvas_h * anchor_y + jitter_y).floor().clamp(0.0, max_y) as u32;

    let rotation = rng
        .gen_range(-MAX_ROTATION_DEGREES..MAX_ROTATION_DEGREES)
        .to_radians() as f32;

    Placement {
        x,
        y,
        width,
        height,
        rotation,
    }
}
