//! Neural Network Chess Engine
//!
//! The classical alpha-beta search driven by a quantised NNUE evaluator.
//! The network's accumulator is attached to the search position and updated
//! incrementally on every make and undo.
//!
//! # Model Loading
//!
//! Models are loaded from the `models/` directory with versioned
//! subdirectories, see [`load_model`]:
//! ```text
//! models/
//!   v001/
//!     network.bin
//!     metadata.toml
//! ```

mod evaluator;
mod model;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chess_core::{Engine, Network, Position, SearchLimits, SearchResult};
use classical_engine::{ClassicalEngine, SearchConfig};
use tracing::warn;

pub use evaluator::NeuralEvaluator;
pub use model::{
    load_model, save_model, LoadedModel, ModelMetadata, NeuralError, DEFAULT_MODELS_DIR,
    METADATA_FILE, NETWORK_FILE,
};

/// Chess engine searching with an NNUE evaluation.
pub struct NeuralEngine {
    inner: ClassicalEngine<NeuralEvaluator>,
    models_dir: PathBuf,
    /// Model version string
    version: String,
    metadata: Option<ModelMetadata>,
    /// Cached name string for UCI identification
    name: String,
}

impl NeuralEngine {
    /// Wraps an in-memory network; reported as version `custom`.
    pub fn from_network(network: Network, config: SearchConfig) -> Self {
        Self::build(
            Arc::new(network),
            config,
            PathBuf::from(DEFAULT_MODELS_DIR),
            "custom".to_string(),
            None,
        )
    }

    /// Creates a neural engine with a specific model version.
    ///
    /// # Arguments
    /// * `models_dir` - Base directory containing model versions (e.g., "models/")
    /// * `version` - Version string (e.g., "v001")
    ///
    /// # Example
    /// ```ignore
    /// let engine = NeuralEngine::with_model("models/", "v001")?;
    /// ```
    pub fn with_model(models_dir: impl AsRef<Path>, version: &str) -> Result<Self, NeuralError> {
        Self::with_model_and_config(models_dir, version, SearchConfig::default())
    }

    pub fn with_model_and_config(
        models_dir: impl AsRef<Path>,
        version: &str,
        config: SearchConfig,
    ) -> Result<Self, NeuralError> {
        let models_dir = models_dir.as_ref();
        let model = load_model(models_dir, version)?;
        Ok(Self::build(
            Arc::new(model.network),
            config,
            models_dir.to_path_buf(),
            model.version,
            model.metadata,
        ))
    }

    fn build(
        network: Arc<Network>,
        config: SearchConfig,
        models_dir: PathBuf,
        version: String,
        metadata: Option<ModelMetadata>,
    ) -> Self {
        let name = format!("Neural-{version}");
        let inner = ClassicalEngine::with_evaluator(NeuralEvaluator::from_shared(network), config)
            .named(name.clone());
        Self {
            inner,
            models_dir,
            version,
            metadata,
            name,
        }
    }

    /// Returns the currently loaded model version.
    pub fn model_version(&self) -> &str {
        &self.version
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn network(&self) -> &Arc<Network> {
        self.inner.evaluator().network()
    }

    /// Swap in another version from the same models directory, keeping the
    /// search configuration.
    pub fn load_version(&mut self, version: &str) -> Result<(), NeuralError> {
        let config = self.inner.config().clone();
        *self = Self::with_model_and_config(&self.models_dir, version, config)?;
        Ok(())
    }
}

impl Engine for NeuralEngine {
    fn search(&mut self, pos: &Position, limits: SearchLimits) -> SearchResult {
        self.inner.search(pos, limits)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn new_game(&mut self) {
        self.inner.new_game();
    }

    fn set_option(&mut self, name: &str, value: &str) -> bool {
        match name.to_lowercase().as_str() {
            "modelversion" | "model" => match self.load_version(value.trim()) {
                Ok(()) => true,
                Err(err) => {
                    warn!(%err, "keeping model {}", self.version);
                    false
                }
            },
            _ => self.inner.set_option(name, value),
        }
    }
}
