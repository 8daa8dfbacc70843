//! Draw conditions visible from the position alone:
//! - Stalemate
//! - Fifty-move rule
//! - Threefold repetition

use chess_core::{GenMode, PieceKind, Position, position_from_moves};

// =============================================================================
// Stalemate Tests
// =============================================================================

#[test]
fn test_stalemate_king_in_corner() {
    // Black king on a8, white queen on b6, white king on c7
    let pos = Position::from_fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1").unwrap();

    assert!(pos.generate_legal_moves(GenMode::All).is_empty());
    assert!(!pos.in_check(), "Stalemate means king is not in check");
}

#[test]
fn test_stalemate_king_and_pawn_endgame() {
    // White king on g6, white pawn on g7, black king on g8
    let pos = Position::from_fen("6k1/6P1/6K1/8/8/8/8/8 b - - 0 1").unwrap();

    assert!(pos.generate_legal_moves(GenMode::All).is_empty());
    assert!(!pos.in_check());
}

// =============================================================================
// Fifty-Move Rule Tests
// =============================================================================

#[test]
fn test_fifty_move_rule_at_100_halfmoves() {
    let pos = Position::from_fen("8/8/8/4k3/8/4K3/8/8 w - - 100 60").unwrap();
    assert!(pos.is_fifty_move_draw());
}

#[test]
fn test_fifty_move_rule_at_99_halfmoves() {
    let pos = Position::from_fen("8/8/8/4k3/8/4K3/8/8 w - - 99 60").unwrap();
    assert!(!pos.is_fifty_move_draw());
}

#[test]
fn test_fifty_move_rule_reached_by_quiet_move() {
    let mut pos = Position::from_fen("8/8/8/4k3/8/3K4/4P3/8 w - - 99 60").unwrap();
    let king_move = pos
        .generate_legal_moves(GenMode::All)
        .iter()
        .copied()
        .find(|m| pos.piece_at(m.from()).map(|p| p.kind) == Some(PieceKind::King))
        .expect("king has a move");
    pos.make_move(king_move);
    assert!(pos.is_fifty_move_draw());
}

#[test]
fn test_fifty_move_rule_reset_on_pawn_move() {
    let mut pos = Position::from_fen("8/8/8/4k3/8/3K4/4P3/8 w - - 99 60").unwrap();

    let pawn_move = pos
        .generate_legal_moves(GenMode::All)
        .iter()
        .copied()
        .find(|m| pos.piece_at(m.from()).map(|p| p.kind) == Some(PieceKind::Pawn))
        .expect("Should have a pawn move available");
    pos.make_move(pawn_move);

    assert!(!pos.is_fifty_move_draw(), "Pawn move should reset halfmove clock");
    assert_eq!(pos.halfmove_clock(), 0);
}

// =============================================================================
// Threefold Repetition Tests
// =============================================================================

#[test]
fn test_threefold_after_knight_shuffles() {
    let shuffle = ["b1c3", "b8c6", "c3b1", "c6b8"];

    // The start position has now occurred twice.
    let pos = position_from_moves("startpos", &shuffle).unwrap();
    assert!(!pos.threefold_repetition());

    let twice: Vec<&str> = shuffle.iter().chain(shuffle.iter()).copied().collect();
    let pos = position_from_moves("startpos", &twice).unwrap();
    assert!(pos.threefold_repetition());
}

#[test]
fn test_threefold_needs_the_same_side_to_move() {
    // The knights return to the start squares with black to move: same
    // placement but a different position.
    let moves = ["b1c3", "b8c6", "c3b1", "c6b8", "g1f3", "g8f6", "f3g1"];
    let pos = position_from_moves("startpos", &moves).unwrap();
    assert!(!pos.threefold_repetition());
}

#[test]
fn test_lost_castling_rights_break_repetition() {
    // Rook and king shuffles throw away castling rights, so the early
    // occurrences no longer count.
    let moves = [
        "h1g1", "h8g8", "g1h1", "g8h8", // rights lost on both sides
        "h1g1", "h8g8", "g1h1", "g8h8", //
    ];
    let start = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
    let pos = position_from_moves(start, &moves).unwrap();
    assert!(!pos.threefold_repetition());

    let mut more = moves.to_vec();
    more.extend(["h1g1", "h8g8", "g1h1", "g8h8"]);
    let pos = position_from_moves(start, &more).unwrap();
    assert!(pos.threefold_repetition());
}
