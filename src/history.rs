// THEORY:
// The history store keeps small PNG thumbnails of the canvas, one per analysis,
// as data URLs. It is bounded twice: by a count (oldest entries drop first) and
// optionally by a byte quota. Exceeding the quota is never an error; the store
// sheds its oldest entries until the rest fits, and if even the newest entry
// alone is over quota it is kept anyway so the latest state is never lost.

use crate::core_modules::utils::image_helper;
use crate::error::Result;
use image::RgbaImage;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// Key the thumbnail list is stored under.
pub const STORAGE_KEY: &str = "collage_history_dataurls";

#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: VecDeque<String>,
    capacity: usize,
    quota_bytes: Option<usize>,
    thumbnail_width: u32,
}

impl HistoryStore {
    pub fn new(capacity: usize, quota_bytes: Option<usize>, thumbnail_width: u32) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            quota_bytes,
            thumbnail_width,
        }
    }

    /// Thumbnails `canvas` and appends it.
    pub fn push_canvas(&mut self, canvas: &RgbaImage) -> Result<()> {
        let thumb = image_helper::thumbnail(canvas, self.thumbnail_width);
        self.push(image_helper::to_data_url(&thumb)?);
        Ok(())
    }

    pub fn push(&mut self, data_url: String) {
        self.entries.push_back(data_url);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.enforce_quota();
    }

    fn enforce_quota(&mut self) {
        let Some(quota) = self.quota_bytes else {
            return;
        };
        let mut dropped = 0;
        while self.entries.len() > 1 && self.total_bytes() > quota {
            self.entries.pop_front();
            dropped += 1;
        }
        if dropped > 0 {
            warn!("history over its {quota}-byte quota; dropped {dropped} oldest thumbnail(s)");
        }
    }

    pub fn total_bytes(&self) -> usize {
        self.entries.iter().map(String::len).sum()
    }

    /// Thumbnails, most recent first.
    pub fn list(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().rev().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes `{ "collage_history_dataurls": [oldest, ..., newest] }`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let stored = StoredHistory {
            entries: self.entries.iter().cloned().collect(),
        };
        std::fs::write(path, serde_json::to_string(&stored)?)?;
        Ok(())
    }

    /// Replaces the entries with those stored at `path`. A missing file leaves
    /// the store empty. The count and quota bounds are re-applied.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        self.entries.clear();
        if !path.exists() {
            return Ok(());
        }
        let stored: StoredHistory = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        for entry in stored.entries {
            self.push(entry);
        }
        Ok(())
    }
}

// Field name must match STORAGE_KEY.
#[derive(Serialize, Deserialize)]
struct StoredHistory {
    #[serde(rename = "collage_history_dataurls", default)]
    entries: Vec<String>,
}
