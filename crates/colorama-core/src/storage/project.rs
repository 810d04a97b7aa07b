//! Persisted project record.

use crate::config::{DrawingConfig, DrawingMode};
use crate::raster::RasterSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name given to projects that were never named.
pub const UNTITLED: &str = "Untitled";

/// A saved drawing: metadata, the canvas and the drawing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: String,
    pub name: String,
    pub mode: DrawingMode,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canvas: Option<RasterSnapshot>,
    /// Free-form settings; holds the serialized [`DrawingConfig`].
    #[serde(default)]
    pub settings: serde_json::Value,
    /// JPEG data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl ProjectRecord {
    /// Create an empty record with a fresh id.
    pub fn new(name: impl Into<String>, mode: DrawingMode) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            mode,
            created: now,
            modified: now,
            canvas: None,
            settings: serde_json::Value::Null,
            thumbnail: None,
        }
    }

    pub fn untitled(mode: DrawingMode) -> Self {
        Self::new(UNTITLED, mode)
    }

    /// Bump the modification time.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    pub fn set_canvas(&mut self, snapshot: RasterSnapshot) {
        self.canvas = Some(snapshot);
    }

    pub fn set_drawing_config(&mut self, config: &DrawingConfig) {
        match serde_json::to_value(config) {
            Ok(value) => self.settings = value,
            Err(e) => log::warn!("Could not serialize drawing settings: {}", e),
        }
    }

    /// Drawing settings stored with the project, or defaults when the blob
    /// is missing or unreadable.
    pub fn drawing_config(&self) -> DrawingConfig {
        if self.settings.is_null() {
            return DrawingConfig::default();
        }
        serde_json::from_value(self.settings.clone()).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable settings in project {}: {}", self.id, e);
            DrawingConfig::default()
        })
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            mode: self.mode,
            modified: self.modified,
            has_thumbnail: self.thumbnail.is_some(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Listing entry for a saved project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub mode: DrawingMode,
    pub modified: DateTime<Utc>,
    pub has_thumbnail: bool,
}
