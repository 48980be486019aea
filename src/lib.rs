// THEORY:
// This file is the main entry point for the `collage_advisor` library crate.
// It defines the public API exposed to front ends such as the bundled CLI.
//
// The analysis engine lives in `core_modules`, one file per stage. `pipeline`
// strings those stages into a single pass, and `session` owns the state that
// persists between user actions (canvas, last analysis, decision log, history).
// The remaining modules are the collaborators at the edges: the generation
// proxy, configuration and the error types.

pub mod config;
pub mod core_modules;
pub mod decision_log;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod proxy;
pub mod session;

pub use crate::config::AppConfig;
pub use crate::core_modules::features::FeatureSet;
pub use crate::core_modules::overlay::OverlayKind;
pub use crate::core_modules::recommendation::RecommendationSet;
pub use crate::core_modules::region::RegionLabel;
pub use crate::error::{AnalysisError, ProxyError};
pub use crate::pipeline::{AnalysisPipeline, AnalysisRecord};
pub use crate::session::{AnalysisMode, AnalysisSession, OverlayOutcome};
