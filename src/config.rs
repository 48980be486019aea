// THEORY:
// Runtime configuration for the session and its collaborators. The analysis rule
// table itself is not configurable: its thresholds are constants in the modules
// that apply them. What lives here is everything around it: how large the canvas
// may be, how many history thumbnails are kept, where the proxy lives and how
// patiently it is polled, and an optional seed that pins every random choice.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Settings for the optional captioning/generation proxy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Base URL of the serverless functions (`/describe`, `/qwen-edit`).
    pub api_base: Option<String>,
    /// URL of the diffusion worker. `None` disables diffusion overlays.
    pub diffusion_url: Option<String>,
    pub poll_interval_ms: u64,
    pub poll_deadline_secs: u64,
    pub request_timeout_secs: u64,
    pub edit_steps: u32,
    pub edit_guidance: f32,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            api_base: None,
            diffusion_url: None,
            poll_interval_ms: 1000,
            poll_deadline_secs: 30,
            request_timeout_secs: 90,
            edit_steps: 28,
            edit_guidance: 4.0,
        }
    }
}

impl ProxyConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_deadline(&self) -> Duration {
        Duration::from_secs(self.poll_deadline_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Images wider than this are downscaled before analysis.
    pub max_canvas_width: u32,
    pub thumbnail_width: u32,
    pub history_capacity: usize,
    /// Total byte budget for stored thumbnails. `None` means unbounded.
    pub history_quota_bytes: Option<usize>,
    /// Seed for the session RNG. `None` seeds from OS entropy.
    pub seed: Option<u64>,
    pub proxy: ProxyConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_canvas_width: 1200,
            thumbnail_width: 220,
            history_capacity: 20,
            history_quota_bytes: None,
            seed: None,
            proxy: ProxyConfig::default(),
        }
    }
}

/// Reads an `AppConfig` from a JSON file. Missing fields take their defaults.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let contents = fs::read_to_string(path).map_err(|e| {
        AnalysisError::Config(format!("Failed to read config {}: {e}", path.display()))
    })?;
    let config: AppConfig = serde_json::from_str(&contents).map_err(|e| {
        AnalysisError::Config(format!("Failed to parse config {}: {e}", path.display()))
    })?;
    if config.max_canvas_width == 0 || config.thumbnail_width == 0 {
        return Err(AnalysisError::Config(
            "max_canvas_width and thumbnail_width must be nonzero".to_string(),
        ));
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "seed": 7, "proxy": {{ "poll_deadline_secs": 90 }} }}"#).unwrap();

        let config = load_config(file.path()).expect("config should parse");
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.max_canvas_width, 1200);
        assert_eq!(config.proxy.poll_deadline(), Duration::from_secs(90));
        assert_eq!(config.proxy.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn zero_canvas_width_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, r#"{{ "max_canvas_width": 0 }}"#).unwrap();
        assert!(matches!(load_config(file.path()), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not json").unwrap();
        assert!(matches!(load_config(file.path()), Err(AnalysisError::Config(_))));
    }
}
