//! Search tuning loaded from TOML.
//!
//! Every field has a default, so a config file only lists what it changes:
//!
//! ```toml
//! tt_size_log2 = 22
//! null_move = false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::search::INF;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid search config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid search config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Transposition table holds `1 << tt_size_log2` entries.
    pub tt_size_log2: u32,
    /// First iteration searched with an aspiration window.
    pub aspiration_min_depth: u8,
    /// Half-width of the initial aspiration window, in centipawns.
    pub aspiration_window: i32,
    pub null_move: bool,
    pub null_move_min_depth: i32,
    pub null_move_reduction: i32,
    /// Reverse futility pruning applies at this depth and below.
    pub rfp_max_depth: i32,
    /// Margin per remaining ply.
    pub rfp_margin: i32,
    pub lmr_min_depth: i32,
    /// Moves before this index are never reduced.
    pub lmr_min_move_index: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            tt_size_log2: 20,
            aspiration_min_depth: 5,
            aspiration_window: 25,
            null_move: true,
            null_move_min_depth: 3,
            null_move_reduction: 2,
            rfp_max_depth: 6,
            rfp_margin: 80,
            lmr_min_depth: 3,
            lmr_min_move_index: 3,
        }
    }
}

impl SearchConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SearchConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(10..=30).contains(&self.tt_size_log2) {
            return Err(ConfigError::Invalid(format!(
                "tt_size_log2 must be between 10 and 30, got {}",
                self.tt_size_log2
            )));
        }
        if !(1..=INF).contains(&self.aspiration_window) {
            return Err(ConfigError::Invalid(format!(
                "aspiration_window must be between 1 and {INF}, got {}",
                self.aspiration_window
            )));
        }
        if self.null_move_reduction < 1 {
            return Err(ConfigError::Invalid(
                "null_move_reduction must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
