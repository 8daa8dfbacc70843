use crate::board::Position;
use crate::movegen::GenMode;
use crate::types::Move;

/// Count the leaf positions `depth` plies below `pos`.
///
/// The last ply is bulk-counted from the length of the move list.
pub fn perft(pos: &mut Position, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = pos.generate_legal_moves(GenMode::All);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for &mv in moves.iter() {
        pos.make_move(mv);
        nodes += perft(pos, depth - 1);
        pos.undo_move(mv);
    }
    nodes
}

/// Per-root-move perft counts, in generation order.
pub fn perft_divide(pos: &mut Position, depth: u8) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    let moves = pos.generate_legal_moves(GenMode::All);
    moves
        .iter()
        .map(|&mv| {
            pos.make_move(mv);
            let count = perft(pos, depth - 1);
            pos.undo_move(mv);
            (mv, count)
        })
        .collect()
}
