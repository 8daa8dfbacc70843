//! Material-based position evaluation using bitboards.

use chess_core::{Color, Evaluator, PieceKind, Position};

/// Material values in centipawns, indexed by PieceKind::idx().
/// Order: Pawn, Knight, Bishop, Rook, Queen, King
pub const PIECE_VALUES: [i32; 6] = [100, 320, 330, 500, 900, 0];

#[inline]
pub fn piece_value(kind: PieceKind) -> i32 {
    PIECE_VALUES[kind.idx()]
}

/// Counts material from the side-to-move's perspective.
///
/// Returns a score in centipawns:
/// - Positive = good for side to move
/// - Negative = bad for side to move
/// - 0 = equal material
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, pos: &Position) -> i32 {
        let mut score = 0i32;
        for kind in PieceKind::ALL {
            let white = pos.pieces(Color::White, kind).popcount() as i32;
            let black = pos.pieces(Color::Black, kind).popcount() as i32;
            score += piece_value(kind) * (white - black);
        }

        if pos.side_to_move() == Color::White {
            score
        } else {
            -score
        }
    }

    fn name(&self) -> &str {
        "material"
    }
}
