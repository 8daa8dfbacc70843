//! Versioned model directories.
//!
//! ```text
//! models/
//!   v001/
//!     network.bin
//!     metadata.toml   (optional)
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chess_core::{Network, NetworkError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

pub const DEFAULT_MODELS_DIR: &str = "models";
pub const NETWORK_FILE: &str = "network.bin";
pub const METADATA_FILE: &str = "metadata.toml";

#[derive(Debug, Error)]
pub enum NeuralError {
    #[error("model version {0:?} is not a plain directory name")]
    InvalidVersion(String),
    #[error("model {version} not found in {}", dir.display())]
    ModelNotFound { dir: PathBuf, version: String },
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid model metadata in {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Free-form description stored next to the weights.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMetadata {
    pub name: String,
    pub description: String,
    pub trained_on: String,
}

impl ModelMetadata {
    pub fn to_toml_string(&self) -> String {
        toml::to_string(self).unwrap_or_default()
    }
}

/// Weights and metadata read from one version directory.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub version: String,
    pub dir: PathBuf,
    pub network: Network,
    pub metadata: Option<ModelMetadata>,
}

fn version_dir(models_dir: &Path, version: &str) -> Result<PathBuf, NeuralError> {
    let plain = !version.is_empty()
        && version != "."
        && version != ".."
        && !version.contains(['/', '\\']);
    if !plain {
        return Err(NeuralError::InvalidVersion(version.to_string()));
    }
    Ok(models_dir.join(version))
}

pub fn load_model(models_dir: impl AsRef<Path>, version: &str) -> Result<LoadedModel, NeuralError> {
    let models_dir = models_dir.as_ref();
    let dir = version_dir(models_dir, version)?;
    let network_path = dir.join(NETWORK_FILE);
    if !network_path.is_file() {
        return Err(NeuralError::ModelNotFound {
            dir: models_dir.to_path_buf(),
            version: version.to_string(),
        });
    }
    let network = Network::load(&network_path)?;

    let metadata_path = dir.join(METADATA_FILE);
    let metadata = if metadata_path.is_file() {
        let text = fs::read_to_string(&metadata_path).map_err(|source| NeuralError::Io {
            path: metadata_path.clone(),
            source,
        })?;
        let metadata: ModelMetadata =
            toml::from_str(&text).map_err(|source| NeuralError::Metadata {
                path: metadata_path,
                source,
            })?;
        Some(metadata)
    } else {
        None
    };

    info!(
        version,
        dir = %dir.display(),
        name = metadata.as_ref().map_or("", |m| m.name.as_str()),
        "loaded model"
    );
    Ok(LoadedModel {
        version: version.to_string(),
        dir,
        network,
        metadata,
    })
}

/// Write `network` (and `metadata`, if given) as version `version`,
/// creating the directory as needed. Returns the version directory.
pub fn save_model(
    models_dir: impl AsRef<Path>,
    version: &str,
    network: &Network,
    metadata: Option<&ModelMetadata>,
) -> Result<PathBuf, NeuralError> {
    let dir = version_dir(models_dir.as_ref(), version)?;
    fs::create_dir_all(&dir).map_err(|source| NeuralError::Io {
        path: dir.clone(),
        source,
    })?;
    network.save(dir.join(NETWORK_FILE))?;
    if let Some(metadata) = metadata {
        let path = dir.join(METADATA_FILE);
        fs::write(&path, metadata.to_toml_string())
            .map_err(|source| NeuralError::Io { path, source })?;
    }
    Ok(dir)
}
