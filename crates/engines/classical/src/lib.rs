//! Classical Chess Engine
//!
//! Iterative-deepening alpha-beta search over the bitboard core. The
//! evaluator is pluggable: [`ClassicalEngine`] defaults to material counting,
//! and the neural engine reuses the same searcher with an NNUE evaluator.

pub mod config;
pub mod eval;
pub mod ordering;
pub mod search;
pub mod tt;

use std::path::Path;

use chess_core::{Engine, Evaluator, Position, SearchLimits, SearchResult};
use tracing::{debug, warn};

pub use config::{ConfigError, SearchConfig};
pub use eval::{piece_value, MaterialEvaluator, PIECE_VALUES};
pub use search::{is_mate_score, Searcher, DRAW, INF, MATE, MAX_PLY};
pub use tt::{Bound, TranspositionTable, TtEntry};

/// Classical chess engine: negamax search with a pluggable evaluator.
///
/// This engine uses:
/// - Iterative deepening with aspiration windows
/// - Alpha-beta with quiescence, null-move and reverse futility pruning
/// - Late-move reductions
/// - A transposition table, killer moves and history for ordering
/// - 50-move rule and threefold repetition detection
pub struct ClassicalEngine<E: Evaluator = MaterialEvaluator> {
    searcher: Searcher<E>,
    name: String,
}

impl ClassicalEngine<MaterialEvaluator> {
    pub fn new() -> Self {
        Self::with_config(SearchConfig::default())
    }

    pub fn with_config(config: SearchConfig) -> Self {
        Self::with_evaluator(MaterialEvaluator, config)
    }

    /// Build an engine from a TOML search config file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::with_config(SearchConfig::load(path)?))
    }
}

impl Default for ClassicalEngine<MaterialEvaluator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Evaluator> ClassicalEngine<E> {
    pub fn with_evaluator(evaluator: E, config: SearchConfig) -> Self {
        let name = format!("Classical ({})", evaluator.name());
        Self {
            searcher: Searcher::new(evaluator, config),
            name,
        }
    }

    /// Override the name reported over UCI.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn evaluator(&self) -> &E {
        self.searcher.evaluator()
    }

    pub fn config(&self) -> &SearchConfig {
        self.searcher.config()
    }

    pub fn set_config(&mut self, config: SearchConfig) {
        self.searcher.set_config(config);
    }

    pub fn searcher(&self) -> &Searcher<E> {
        &self.searcher
    }
}

impl<E: Evaluator> Engine for ClassicalEngine<E> {
    fn search(&mut self, pos: &Position, limits: SearchLimits) -> SearchResult {
        self.searcher.search(pos, limits)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn new_game(&mut self) {
        self.searcher.clear();
    }

    fn set_option(&mut self, name: &str, value: &str) -> bool {
        if !name.eq_ignore_ascii_case("hash") {
            return false;
        }
        match value.trim().parse::<usize>() {
            Ok(mb) if mb > 0 => {
                self.searcher.resize_tt(mb);
                debug!(mb, entries = self.searcher.tt().len(), "resized transposition table");
                true
            }
            _ => {
                warn!(value, "ignoring invalid Hash value");
                false
            }
        }
    }
}
