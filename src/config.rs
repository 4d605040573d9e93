//! Pipeline settings loaded from a TOML file.
//!
//! ```toml
//! engine = "grid"
//!
//! [metrics]
//! charWidth = 7.5
//! groupPadding = 24
//!
//! [layout]
//! direction = "LR"
//! nodeSpacingX = 60
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout::{DEFAULT_ENGINE, LayoutOptions};
use crate::measure::GraphMetrics;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Node and group geometry used when building graphs.
    pub metrics: GraphMetrics,
    pub layout: LayoutOptions,
    /// Layout engine name; unknown names fall back to the layered engine.
    pub engine: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metrics: GraphMetrics::default(),
            layout: LayoutOptions::default(),
            engine: DEFAULT_ENGINE.to_string(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}
