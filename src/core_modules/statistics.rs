// THEORY:
// The statistics engine reduces the three per-pixel layers (color, luma, edge
// magnitude) to the scalar features the recommendation rules read. Every
// function here is pure and total over a valid, non-empty buffer: a 1x1 image or
// a solid fill degrades to zeros instead of dividing by zero.
//
// Feature families:
// - Color:      mean color, Hasler–Süsstrunk colorfulness, mean hue/saturation
//               and the warm/cool temperature class derived from the hue.
// - Tone:       contrast (luma standard deviation) and Shannon entropy of the
//               luma histogram.
// - Structure:  edge density (share of strong normalized gradients).

use crate::core_modules::gradient::GradientField;
use crate::core_modules::luminance::LuminanceField;
use crate::core_modules::pixel_buffer::PixelBuffer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized gradient magnitude above which a pixel counts as an edge.
pub const EDGE_THRESHOLD: f32 = 0.25;

/// Pixels at or below this HSV saturation are too gray to vote on hue.
pub const SATURATION_FLOOR: f64 = 0.1;

/// Warm/cool classification of an image's mean hue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Temperature {
    Warm,
    Cool,
}

impl Temperature {
    /// Warm when the hue sits in [0, 30) or (330, 360), or in the extended
    /// yellow-orange band [30, 60]. The two warm ranges meet at 30, so the
    /// effective warm set is [0, 60] and (330, 360).
    pub fn from_hue(hue: f64) -> Self {
        let warm = hue < 30.0 || hue > 330.0 || (30.0..=60.0).contains(&hue);
        if warm { Temperature::Warm } else { Temperature::Cool }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Temperature::Warm => "warm",
            Temperature::Cool => "cool",
        }
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of the hue pass over the saturated pixels of an image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HueSummary {
    pub hue: f64,
    pub temperature: Temperature,
    pub mean_saturation: f64,
}

/// Arithmetic mean of R, G and B over all pixels, each rounded.
pub fn dominant_color_mean(buffer: &PixelBuffer) -> [u8; 3] {
    let (mut sum_r, mut sum_g, mut sum_b) = (0u64, 0u64, 0u64);
    for pixel in buffer.pixels() {
        sum_r += pixel.red as u64;
        sum_g += pixel.green as u64;
        sum_b += pixel.blue as u64;
    }
    let count = buffer.len().max(1) as f64;
    let mean = |sum: u64| (sum as f64 / count).round().clamp(0.0, 255.0) as u8;
    [mean(sum_r), mean(sum_g), mean(sum_b)]
}

/// Hasler–Süsstrunk colorfulness:
/// `sqrt(std(rg)² + std(yb)²) + 0.3 · sqrt(mean(rg)² + mean(yb)²)`.
pub fn colorfulness(buffer: &PixelBuffer) -> f64 {
    let count = buffer.len().max(1) as f64;
    let (mut sum_rg, mut sum_yb) = (0.0f64, 0.0f64);
    for pixel in buffer.pixels() {
        sum_rg += pixel.red_green();
        sum_yb += pixel.yellow_blue();
    }
    let mean_rg = sum_rg / count;
    let mean_yb = sum_yb / count;

    let (mut var_rg, mut var_yb) = (0.0f64, 0.0f64);
    for pixel in buffer.pixels() {
        var_rg += (pixel.red_green() - mean_rg).powi(2);
        var_yb += (pixel.yellow_blue() - mean_yb).powi(2);
    }
    let std_rg = (var_rg / count).sqrt();
    let std_yb = (var_yb / count).sqrt();

    (std_rg * std_rg + std_yb * std_yb).sqrt() + 0.3 * (mean_rg * mean_rg + mean_yb * mean_yb).sqrt()
}

/// Population standard deviation of luma divided by 255, roughly [0, 0.5].
pub fn contrast(luminance: &LuminanceField) -> f64 {
    let count = luminance.data.len().max(1) as f64;
    let mean = luminance.data.iter().map(|&v| v as f64).sum::<f64>() / count;
    let variance = luminance
        .data
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / count;
    variance.sqrt() / 255.0
}

/// Share of gradient samples strictly above `EDGE_THRESHOLD`.
pub fn edge_density(gradient: &GradientField) -> f64 {
    let count = gradient.data.len().max(1) as f64;
    let edges = gradient.data.iter().filter(|&&g| g > EDGE_THRESHOLD).count();
    edges as f64 / count
}

/// Shannon entropy (bits) of the 256-bin luma histogram, in [0, 8].
pub fn entropy(luminance: &LuminanceField) -> f64 {
    let total = luminance.data.len().max(1) as f64;
    let entropy: f64 = luminance
        .histogram()
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum();
    // A single populated bin yields -0.0; report a plain zero.
    entropy.max(0.0)
}

/// Mean hue and saturation over pixels with saturation above `SATURATION_FLOOR`.
/// With no such pixel the hue defaults to 0 (and therefore warm).
pub fn hue_and_temperature(buffer: &PixelBuffer) -> HueSummary {
    let (mut sum_hue, mut sum_saturation, mut count) = (0.0f64, 0.0f64, 0usize);
    for pixel in buffer.pixels() {
        let (hue, saturation, _) = pixel.hsv();
        if saturation > SATURATION_FLOOR {
            sum_hue += hue;
            sum_saturation += saturation;
            count += 1;
        }
    }
    let (hue, mean_saturation) = if count > 0 {
        (sum_hue / count as f64, sum_saturation / count as f64)
    } else {
        (0.0, 0.0)
    };
    HueSummary {
        hue,
        temperature: Temperature::from_hue(hue),
        mean_saturation,
    }
}
