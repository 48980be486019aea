// THEORY:
// `FeatureSet` is the summary record that crosses from the measurement half of
// the engine into the decision half. It is built in one call from one snapshot
// and its derived layers, so it is never observed half-filled. It serializes to
// the same flat JSON shape the decision log and external tools read back, and a
// re-parsed record drives the recommendation engine to the identical output.

use crate::core_modules::gradient::GradientField;
use crate::core_modules::luminance::LuminanceField;
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::core_modules::region::RegionLabel;
use crate::core_modules::statistics::{self, Temperature};
use serde::{Deserialize, Serialize};

/// Scalar and categorical features of one analyzed image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub dominant_color: [u8; 3],
    pub colorfulness: f64,
    pub contrast: f64,
    pub edge_density: f64,
    pub entropy: f64,
    pub hue: f64,
    pub temperature: Temperature,
    pub mean_saturation: f64,
    pub suggested_region: RegionLabel,
}

impl FeatureSet {
    /// Computes every statistic from one snapshot and its derived layers.
    pub fn compute(
        buffer: &PixelBuffer,
        luminance: &LuminanceField,
        gradient: &GradientField,
        suggested_region: RegionLabel,
    ) -> Self {
        let hue_summary = statistics::hue_and_temperature(buffer);
        Self {
            dominant_color: statistics::dominant_color_mean(buffer),
            colorfulness: statistics::colorfulness(buffer),
            contrast: statistics::contrast(luminance),
            edge_density: statistics::edge_density(gradient),
            entropy: statistics::entropy(luminance),
            hue: hue_summary.hue,
            temperature: hue_summary.temperature,
            mean_saturation: hue_summary.mean_saturation,
            suggested_region,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FeatureSet {
        FeatureSet {
            dominant_color: [12, 34, 56],
            colorfulness: 41.25,
            contrast: 0.1875,
            edge_density: 0.0421,
            entropy: 6.5,
            hue: 212.5,
            temperature: Temperature::Cool,
            mean_saturation: 0.42,
            suggested_region: RegionLabel::BottomCenter,
        }
    }

    #[test]
    fn serializes_with_readable_labels() {
        let json = sample().to_json().unwrap();
        assert!(json.contains(r#""temperature":"cool""#), "{json}");
        assert!(json.contains(r#""suggested_region":"bottom center""#), "{json}");
        assert!(json.contains(r#""dominant_color":[12,34,56]"#), "{json}");
    }

    #[test]
    fn json_round_trip_is_lossless() {
        let features = sample();
        let parsed = FeatureSet::from_json(&features.to_json().unwrap()).unwrap();
        assert_eq!(parsed, features);
    }

    #[test]
    fn unknown_region_is_rejected() {
        let json = sample()
            .to_json()
            .unwrap()
            .replace("bottom center", "somewhere");
        assert!(FeatureSet::from_json(&json).is_err());
    }
}
