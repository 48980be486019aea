// THEORY:
// `AnalysisSession` is the explicit owner of everything that lives between
// user actions: the working canvas, the most recent analysis, the decision log,
// the thumbnail history and the RNG. Operations that need a prior analysis read
// it from here, and a new analysis replaces it as a whole.
//
// Key architectural principles:
// 1.  **Whole-Record Replacement**: `last` is either `None` or a complete
//     `AnalysisRecord`. Loading a new image clears it; analyzing replaces it.
// 2.  **Proxy Failures Degrade**: Diffusion and edit requests go through the
//     `GenerationProxy`. Any `ProxyError` is logged at `warn` and answered with
//     the local synthetic overlay, reported as `OverlayOutcome::Fallback`.
// 3.  **Missing Input Is Explicit**: Analyzing without a canvas, or overlaying
//     and logging without an analysis, is `AnalysisError::InputMissing`.

use crate::config::AppConfig;
use crate::core_modules::overlay::{self, Placement};
use crate::core_modules::overlay_patch::{self, CUTOUT_WHITE_THRESHOLD};
use crate::core_modules::pixel_buffer::{self, PixelBuffer};
use crate::core_modules::utils::image_helper;
use crate::decision_log::{Decision, DecisionLog};
use crate::error::{AnalysisError, ProxyError, Result};
use crate::history::HistoryStore;
use crate::pipeline::{self, AnalysisPipeline, AnalysisRecord};
use crate::proxy::{Description, GenerationProxy};
use image::RgbaImage;
use image::imageops::FilterType;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// What an analysis does to the canvas after computing the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// Analyze and record only.
    #[default]
    General,
    /// Composite the synthetic overlay.
    Direct,
    /// Composite a generated cut-out.
    Diffuse,
    /// Send the canvas to the image-edit endpoint.
    Edit,
}

impl AnalysisMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisMode::General => "general",
            AnalysisMode::Direct => "direct",
            AnalysisMode::Diffuse => "diffuse",
            AnalysisMode::Edit => "edit",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "general" => Ok(AnalysisMode::General),
            "direct" => Ok(AnalysisMode::Direct),
            "diffuse" => Ok(AnalysisMode::Diffuse),
            "edit" => Ok(AnalysisMode::Edit),
            other => Err(format!("unknown mode '{other}' (expected general, direct, diffuse or edit)")),
        }
    }
}

/// How the canvas changed after an analysis.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayOutcome {
    /// Nothing was drawn.
    Untouched,
    /// The procedural patch was composited.
    Synthetic(Placement),
    /// A generated cut-out was composited.
    Generated(Placement),
    /// The canvas was replaced by the edited image.
    Edited,
    /// The proxy failed and the procedural patch was composited instead.
    Fallback { reason: String, placement: Placement },
}

pub struct AnalysisSession<P: GenerationProxy> {
    config: AppConfig,
    pipeline: AnalysisPipeline<StdRng>,
    proxy: P,
    canvas: Option<RgbaImage>,
    last: Option<AnalysisRecord>,
    decisions: DecisionLog,
    history: HistoryStore,
}

impl<P: GenerationProxy> AnalysisSession<P> {
    pub fn new(config: AppConfig, proxy: P) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let history = HistoryStore::new(
            config.history_capacity,
            config.history_quota_bytes,
            config.thumbnail_width,
        );
        Self {
            config,
            pipeline: AnalysisPipeline::new(rng),
            proxy,
            canvas: None,
            last: None,
            decisions: DecisionLog::new(),
            history,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn proxy(&self) -> &P {
        &self.proxy
    }

    pub fn canvas(&self) -> Option<&RgbaImage> {
        self.canvas.as_ref()
    }

    pub fn last_analysis(&self) -> Option<&AnalysisRecord> {
        self.last.as_ref()
    }

    pub fn decisions(&self) -> &DecisionLog {
        &self.decisions
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryStore {
        &mut self.history
    }

    pub fn load_image(&mut self, path: &Path) -> Result<()> {
        let image = pixel_buffer::load_image(path)?;
        self.set_canvas(image);
        Ok(())
    }

    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let image = pixel_buffer::decode_image(bytes)?;
        self.set_canvas(image);
        Ok(())
    }

    /// Installs a new canvas, scaled to the configured width, and forgets the
    /// previous analysis.
    pub fn set_canvas(&mut self, image: RgbaImage) {
        let canvas = pixel_buffer::fit_to_width(image, self.config.max_canvas_width);
        info!("canvas set to {}x{}", canvas.width(), canvas.height());
        self.canvas = Some(canvas);
        self.last = None;
    }

    /// Analyzes the current canvas and records a history thumbnail.
    pub fn analyze(&mut self) -> Result<&AnalysisRecord> {
        let canvas = self.canvas.as_ref().ok_or(AnalysisError::InputMissing("no image loaded"))?;
        let buffer = PixelBuffer::from_image(canvas)?;
        let record = self.pipeline.run(&buffer);
        self.save_history_thumbnail();
        Ok(&*self.last.insert(record))
    }

    /// Analyzes, then applies the mode's canvas change.
    pub async fn run(&mut self, mode: AnalysisMode) -> Result<OverlayOutcome> {
        info!("running {mode} analysis");
        match mode {
            AnalysisMode::General => {
                self.analyze()?;
                Ok(OverlayOutcome::Untouched)
            }
            AnalysisMode::Direct => {
                // Direct mode draws before the thumbnail is taken.
                let canvas = self.canvas.as_ref().ok_or(AnalysisError::InputMissing("no image loaded"))?;
                let record = self.pipeline.analyze_image(canvas)?;
                self.last = Some(record);
                let placement = self.apply_synthetic_overlay()?;
                self.save_history_thumbnail();
                Ok(OverlayOutcome::Synthetic(placement))
            }
            AnalysisMode::Diffuse => {
                self.analyze()?;
                self.apply_diffusion_overlay().await
            }
            AnalysisMode::Edit => {
                self.analyze()?;
                self.apply_edit().await
            }
        }
    }

    /// Composites the procedural patch for the last analysis.
    pub fn apply_synthetic_overlay(&mut self) -> Result<Placement> {
        let record = self.last.as_ref().ok_or(AnalysisError::InputMissing("no analysis to illustrate"))?;
        let canvas = self.canvas.as_mut().ok_or(AnalysisError::InputMissing("no image loaded"))?;
        let (canvas_w, canvas_h) = canvas.dimensions();
        let (patch_w, patch_h) = overlay::patch_size(canvas_w, canvas_h);

        let rng = self.pipeline.rng();
        let patch = overlay_patch::render_patch(record.overlay, patch_w, patch_h, rng);
        let placement = overlay::place(record.region(), canvas_w, canvas_h, patch_w, patch_h, rng);
        overlay_patch::composite(canvas, &patch, &placement);
        info!("{} patch placed at ({}, {})", record.overlay, placement.x, placement.y);
        Ok(placement)
    }

    /// Requests a generated cut-out and composites it in the suggested region.
    pub async fn apply_diffusion_overlay(&mut self) -> Result<OverlayOutcome> {
        let record = self.last.as_ref().ok_or(AnalysisError::InputMissing("no analysis to illustrate"))?;
        let (canvas_w, canvas_h) = self
            .canvas
            .as_ref()
            .ok_or(AnalysisError::InputMissing("no image loaded"))?
            .dimensions();
        let (target_w, target_h) = overlay::patch_size(canvas_w, canvas_h);
        let prompt = pipeline::prompt_from_recommendations(Some(&record.features), &record.recommendations.phrases);
        let region = record.region();

        let generated = self.proxy.diffuse(&prompt, target_w, target_h).await;
        match generated {
            Ok(mut generated) => {
                overlay_patch::white_to_transparent(&mut generated, CUTOUT_WHITE_THRESHOLD);
                let cutout = overlay_patch::fit_within(&generated, target_w, target_h);
                let placement = overlay::place(
                    region,
                    canvas_w,
                    canvas_h,
                    cutout.width(),
                    cutout.height(),
                    self.pipeline.rng(),
                );
                if let Some(canvas) = self.canvas.as_mut() {
                    overlay_patch::composite(canvas, &cutout, &placement);
                }
                info!("generated cut-out placed at ({}, {})", placement.x, placement.y);
                Ok(OverlayOutcome::Generated(placement))
            }
            Err(error) => self.fall_back("diffusion", error),
        }
    }

    /// Sends the canvas to the edit endpoint and replaces it with the result.
    pub async fn apply_edit(&mut self) -> Result<OverlayOutcome> {
        let canvas = self.canvas.as_ref().ok_or(AnalysisError::InputMissing("no image loaded"))?;
        let (canvas_w, canvas_h) = canvas.dimensions();
        let data_url = image_helper::to_data_url(canvas)?;
        let instruction = pipeline::edit_instruction(self.last.as_ref());

        let edited = match self.proxy.edit(&data_url, &instruction).await {
            Ok(url) => self.proxy.fetch_image(&url).await,
            Err(error) => Err(error),
        };
        match edited {
            Ok(image) => {
                let resized = image::imageops::resize(&image, canvas_w, canvas_h, FilterType::Triangle);
                self.canvas = Some(resized);
                self.save_history_thumbnail();
                info!("canvas replaced by edited image");
                Ok(OverlayOutcome::Edited)
            }
            Err(error) => self.fall_back("edit", error),
        }
    }

    /// Asks the describe endpoint for a caption of the current canvas.
    pub async fn describe_canvas(&self) -> Result<std::result::Result<Description, ProxyError>> {
        let canvas = self.canvas.as_ref().ok_or(AnalysisError::InputMissing("no image loaded"))?;
        let data_url = image_helper::to_data_url(canvas)?;
        Ok(self.proxy.describe(&data_url).await)
    }

    fn fall_back(&mut self, action: &str, error: ProxyError) -> Result<OverlayOutcome> {
        warn!("{action} unavailable, using local overlay: {error}");
        let placement = self.apply_synthetic_overlay()?;
        Ok(OverlayOutcome::Fallback {
            reason: error.to_string(),
            placement,
        })
    }

    /// Logs the user's verdict on the current recommendations.
    pub fn submit_decision(&mut self, decision: Decision) -> Result<()> {
        let record = self.last.as_ref().ok_or(AnalysisError::InputMissing("no recommendations to judge"))?;
        self.decisions.record(decision, &record.recommendations);
        info!("decision '{decision}' logged");
        Ok(())
    }

    pub fn export_csv(&self, path: &Path) -> Result<()> {
        self.decisions.export(path)
    }

    pub fn save_canvas(&self, path: &Path) -> Result<()> {
        let canvas = self.canvas.as_ref().ok_or(AnalysisError::InputMissing("no image loaded"))?;
        image_helper::save(path, canvas)
    }

    fn save_history_thumbnail(&mut self) {
        let Some(canvas) = self.canvas.as_ref() else {
            return;
        };
        if let Err(error) = self.history.push_canvas(canvas) {
            warn!("could not save history thumbnail: {error}");
        }
    }
}
