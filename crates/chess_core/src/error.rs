use thiserror::Error;

/// Failures at the text boundary: positions and moves supplied by callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChessError {
    #[error("invalid FEN '{fen}': {reason}")]
    InvalidFen { fen: String, reason: String },

    #[error("invalid move text '{0}'")]
    InvalidMoveText(String),

    #[error("illegal move '{mv}' in position '{fen}'")]
    IllegalMove { mv: String, fen: String },
}

pub type ChessResult<T> = Result<T, ChessError>;
