pub mod attacks;
pub mod bitboard;
pub mod board;
pub mod error;
pub mod eval;
pub mod fen;
pub mod movegen;
pub mod nnue;
pub mod perft;
pub mod time_control;
pub mod types;
pub mod uci;
pub mod zobrist;

use std::time::Duration;

// Re-export core game logic (not engine-specific)
pub use attacks::{ATTACKS, AttackTables};
pub use bitboard::Bitboard;
pub use board::{CastlingRights, MoveGuard, Position, START_FEN};
pub use error::{ChessError, ChessResult};
pub use eval::Evaluator;
pub use movegen::{GenMode, MAX_MOVES, MoveList, legal_moves};
pub use nnue::{Accumulator, HIDDEN_SIZE, INPUT_SIZE, Matrix, Network, NetworkError};
pub use perft::{perft, perft_divide};
pub use time_control::*;
pub use types::*;
pub use uci::*;
pub use zobrist::{HASH_KEYS, HashKeys};

// =============================================================================
// Engine trait: implemented by the classical and neural engines
// =============================================================================

/// Result of a search operation
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The best move found (None if no legal moves)
    pub best_move: Option<Move>,
    /// Score in centipawns from the side to move's perspective; mates are
    /// reported as `±(MATE - ply)`
    pub score: i32,
    /// Deepest fully completed iteration
    pub depth: u8,
    /// Number of nodes searched
    pub nodes: u64,
    /// Whether search was stopped early due to time limit
    pub stopped: bool,
    pub elapsed: Duration,
    /// Principal variation starting with `best_move`
    pub pv: Vec<Move>,
}

/// Trait that all chess engines must implement.
///
/// Lets the UCI front end swap the material and NNUE engines at runtime.
pub trait Engine: Send {
    /// Search the position with the given search limits.
    ///
    /// The engine works on its own copy of `pos`; the caller's position is
    /// never modified.
    fn search(&mut self, pos: &Position, limits: SearchLimits) -> SearchResult;

    /// Returns the engine's name for UCI identification
    fn name(&self) -> &str;

    /// Returns the engine's author for UCI identification
    fn author(&self) -> &str {
        "bitboard-chess"
    }

    /// Reset internal state for a new game (clear hash tables, history, etc.)
    fn new_game(&mut self) {}

    /// Set a UCI option. Returns true if the option was recognized.
    fn set_option(&mut self, _name: &str, _value: &str) -> bool {
        false
    }
}
