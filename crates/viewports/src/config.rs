//! JSON scene files: canvas size, shared view state and ordered views.
//!
//! ```json
//! {
//!   "canvas": { "width": 800, "height": 600 },
//!   "view_state": { "type": "geospatial", "longitude": 2.35, "latitude": 48.85, "zoom": 12 },
//!   "views": [
//!     { "id": "main", "frame": "geospatial", "projection": "perspective",
//!       "params": { "fovy": 36.87, "near": 0.1, "far": 1000 } },
//!     { "id": "inset", "x": "70%", "width": "30%", "height": "30%",
//!       "frame": "geospatial", "projection": "orthographic",
//!       "params": { "fovy": 36.87, "near": 0.1, "far": 1000 } }
//!   ]
//! }
//! ```

use std::path::Path;

use foundation::CanvasSize;
use serde::{Deserialize, Serialize};

use crate::descriptor::ViewDescriptor;
use crate::error::LayoutError;
use crate::layout::LayoutManager;
use crate::view_state::ViewState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    pub canvas: CanvasSize,
    pub view_state: ViewState,
    pub views: Vec<ViewDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Serialize(String),
    Layout(LayoutError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "scene file error: {msg}"),
            ConfigError::Parse(msg) => write!(f, "scene file is invalid: {msg}"),
            ConfigError::Serialize(msg) => write!(f, "cannot write scene: {msg}"),
            ConfigError::Layout(e) => write!(f, "scene layout is invalid: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<LayoutError> for ConfigError {
    fn from(e: LayoutError) -> Self {
        ConfigError::Layout(e)
    }
}

impl SceneConfig {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    /// Layout manager holding this scene's views, not yet resolved.
    pub fn layout_manager(&self) -> Result<LayoutManager, ConfigError> {
        Ok(LayoutManager::with_descriptors(self.views.clone())?)
    }
}
