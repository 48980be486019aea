// THEORY:
// The `pipeline` module is the top-level API of the analysis engine. It strings
// the core modules together into one pass over a single image snapshot and hands
// back a complete `AnalysisRecord`.
//
// Key architectural principles:
// 1.  **One Snapshot, One Pass**: Luminance, gradient, grid masses, the feature
//     set, the recommendations and the overlay choice are all derived from the
//     same `PixelBuffer`. Nothing is cached between passes; the record is built
//     whole and replaced whole.
// 2.  **Owned Chance**: The pipeline owns the RNG. Region selection, the strip
//     direction and overlay placement all draw from it, so seeding it pins the
//     entire run.
// 3.  **Replayable Decisions**: A `FeatureSet` read back from JSON can be fed to
//     `recommend_from` and yields the same record the first pass produced
//     under the same RNG state.

use crate::core_modules::features::FeatureSet;
use crate::core_modules::gradient::GradientField;
use crate::core_modules::luminance::LuminanceField;
use crate::core_modules::overlay::OverlayKind;
use crate::core_modules::pixel_buffer::PixelBuffer;
use crate::core_modules::recommendation::{self, RecommendationSet};
use crate::core_modules::region::{RegionLabel, RegionPartitioner};
use crate::error::Result;
use image::RgbaImage;
use log::{debug, info};
use rand::Rng;

const PROMPT_STYLE: &str = "collage paper cut-out, torn edges, matte texture, photographed on plain white background, hard crisp silhouette";
const PROMPT_FINISH: &str = "no drop shadow, high contrast";
const DEFAULT_EDIT_PHRASE: &str = "Add a small collage element in the suggested region.";

/// The full result of analyzing one image.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub features: FeatureSet,
    pub recommendations: RecommendationSet,
    /// The synthetic patch the recommendations call for.
    pub overlay: OverlayKind,
}

impl AnalysisRecord {
    pub fn region(&self) -> RegionLabel {
        self.features.suggested_region
    }
}

/// The main, top-level struct for the analysis engine.
pub struct AnalysisPipeline<R: Rng> {
    rng: R,
    passes: u64,
}

impl<R: Rng> AnalysisPipeline<R> {
    pub fn new(rng: R) -> Self {
        Self { rng, passes: 0 }
    }

    /// The pipeline's RNG, for the placement and rendering steps that follow a pass.
    pub fn rng(&mut self) -> &mut R {
        &mut self.rng
    }

    /// Number of completed passes.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn analyze_image(&mut self, image: &RgbaImage) -> Result<AnalysisRecord> {
        let buffer = PixelBuffer::from_image(image)?;
        Ok(self.run(&buffer))
    }

    pub fn run(&mut self, buffer: &PixelBuffer) -> AnalysisRecord {
        // Stage 1: Derived layers
        let luminance = LuminanceField::from_pixels(buffer);
        let gradient = GradientField::sobel(&luminance);

        // Stage 2: Spatial emptiness
        let region = RegionPartitioner::new(&luminance, &gradient).select(&mut self.rng);

        // Stage 3: Global statistics
        let features = FeatureSet::compute(buffer, &luminance, &gradient, region);
        debug!(
            "features for {}x{}: {:?}",
            buffer.width(),
            buffer.height(),
            features
        );

        self.passes += 1;
        self.recommend_from(features)
    }

    /// Runs the decision half only, on an already computed feature set.
    pub fn recommend_from(&mut self, features: FeatureSet) -> AnalysisRecord {
        let recommendations = recommendation::recommend(Some(&features), &mut self.rng);
        let overlay = OverlayKind::from_phrases(&recommendations.phrases);
        info!(
            "suggested region '{}', overlay '{}', {} recommendations",
            features.suggested_region,
            overlay,
            recommendations.len()
        );
        AnalysisRecord {
            features,
            recommendations,
            overlay,
        }
    }
}

/// Builds the text-to-image prompt for a generated cut-out.
pub fn prompt_from_recommendations<S: AsRef<str>>(features: Option<&FeatureSet>, phrases: &[S]) -> String {
    let base = phrases
        .iter()
        .map(|phrase| phrase.as_ref())
        .collect::<Vec<_>>()
        .join(" ; ");
    let temperature = features.map_or("neutral", |f| f.temperature.as_str());
    format!("{base}. {PROMPT_STYLE}, {temperature} palette accent, {PROMPT_FINISH}")
}

/// Builds the instruction for an image-edit request: the first recommendation
/// without markup, restricted to the suggested region.
pub fn edit_instruction(record: Option<&AnalysisRecord>) -> String {
    let phrase = record
        .and_then(|r| r.recommendations.phrases.first())
        .map_or(DEFAULT_EDIT_PHRASE, String::as_str)
        .replace("**", "");
    let region = record.map_or(RegionLabel::Center, AnalysisRecord::region);
    format!("{phrase} Only modify the {region} area; keep all other areas unchanged.")
}
