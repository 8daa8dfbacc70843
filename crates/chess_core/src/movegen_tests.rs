use super::*;

fn fen(s: &str) -> Position {
    Position::from_fen(s).unwrap()
}

fn has_move(list: &MoveList, text: &str) -> bool {
    list.iter().any(|m| m.to_string() == text)
}

#[test]
fn test_startpos_moves() {
    let pos = Position::startpos();
    let moves = pos.generate_legal_moves(GenMode::All);
    assert_eq!(moves.len(), 20);
    assert!(pos.generate_legal_moves(GenMode::Captures).is_empty());
}

#[test]
fn test_kiwipete_moves() {
    let pos = fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -");
    let moves = pos.generate_legal_moves(GenMode::All);
    assert_eq!(moves.len(), 48);
    assert!(has_move(&moves, "e1g1"));
    assert!(has_move(&moves, "e1c1"));

    let captures = pos.generate_legal_moves(GenMode::Captures);
    assert_eq!(captures.len(), 8);
    for mv in &captures {
        assert!(pos.is_capture(*mv) || mv.is_promotion());
    }
}

#[test]
fn test_double_check_allows_only_king_moves() {
    // Rook on e8 and bishop on b4 both check the king on e1.
    let pos = fen("4r1k1/8/8/8/1b6/8/8/R3K3 w Q - 0 1");
    assert_eq!(pos.checkers().popcount(), 2);
    let moves = pos.generate_legal_moves(GenMode::All);
    assert!(!moves.is_empty());
    for mv in &moves {
        assert_eq!(mv.from(), pos.king_square(Color::White));
    }
    assert!(!has_move(&moves, "e1c1"));
}

#[test]
fn test_single_check_evasions() {
    // Rook on e8 checks; interpose with the bishop or rook, or step aside.
    let pos = fen("4r1k1/8/8/8/8/8/2B5/R3K3 w - - 0 1");
    let moves = pos.generate_legal_moves(GenMode::All);
    assert!(has_move(&moves, "c2e4"));
    assert!(!has_move(&moves, "a1a8"));
    assert!(!has_move(&moves, "a1b1"));
    assert!(has_move(&moves, "e1d2"));
    assert!(!has_move(&moves, "e1e2"));
}

#[test]
fn test_pinned_pieces() {
    // Bishop d2 pinned by the b4 bishop; knight e2 pinned by the e8 rook.
    let pos = fen("4r1k1/8/8/8/1b6/8/3BN3/4K3 w - - 0 1");
    let pinned = pos.pinned_pieces();
    assert!(pinned.contains(coord_to_sq("d2").unwrap()));
    assert!(pinned.contains(coord_to_sq("e2").unwrap()));
    assert_eq!(pinned.popcount(), 2);

    let moves = pos.generate_legal_moves(GenMode::All);
    // pinned knight never moves
    assert!(moves.iter().all(|m| m.from() != coord_to_sq("e2").unwrap()));
    // pinned bishop slides along the pin and may capture the pinner
    assert!(has_move(&moves, "d2c3"));
    assert!(has_move(&moves, "d2b4"));
    assert!(!has_move(&moves, "d2e3"));
}

#[test]
fn test_pinned_pawn_moves_stay_on_line() {
    // Pawn e2 is pinned on the e-file: it may push but not capture.
    let pos = fen("4r1k1/8/8/8/8/3p4/4P3/4K3 w - - 0 1");
    let moves = pos.generate_legal_moves(GenMode::All);
    assert!(has_move(&moves, "e2e3"));
    assert!(has_move(&moves, "e2e4"));
    assert!(!has_move(&moves, "e2d3"));

    // Pinned diagonally, it may only capture the pinner.
    let pos = fen("6k1/8/8/8/8/2b5/3P4/4K3 w - - 0 1");
    let moves = pos.generate_legal_moves(GenMode::All);
    assert!(!has_move(&moves, "d2d3"));
    assert!(!has_move(&moves, "d2d4"));
    let pos = fen("6k1/8/8/8/8/8/3P4/4K3 w - - 0 1");
    assert!(has_move(&pos.generate_legal_moves(GenMode::All), "d2d4"));
}

#[test]
fn test_en_passant_discovered_check_is_illegal() {
    // Capturing on c6 would remove both pawns from the fifth rank and expose
    // the king on a5 to the rook on h5.
    let pos = fen("8/8/8/KPp4r/8/8/8/4k3 w - c6 0 2");
    let moves = pos.generate_legal_moves(GenMode::All);
    assert!(!has_move(&moves, "b5c6"));

    // Without the rook the capture is fine.
    let pos = fen("8/8/8/KPp5/8/8/8/4k3 w - c6 0 2");
    let moves = pos.generate_legal_moves(GenMode::All);
    assert!(has_move(&moves, "b5c6"));
    let ep = moves.iter().find(|m| m.to_string() == "b5c6").unwrap();
    assert_eq!(ep.kind(), MoveKind::EnPassant);
}

#[test]
fn test_en_passant_captures_checking_pawn() {
    // Black just played d7d5 giving check to the king on e4.
    let pos = fen("4k3/8/8/3pP3/4K3/8/8/8 w - d6 0 2");
    assert!(pos.in_check());
    let moves = pos.generate_legal_moves(GenMode::All);
    assert!(has_move(&moves, "e5d6"));
    assert!(has_move(&pos.generate_legal_moves(GenMode::Captures), "e5d6"));
}

#[test]
fn test_promotions_generate_all_pieces() {
    let pos = fen("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
    let moves = pos.generate_legal_moves(GenMode::All);
    for text in ["a7a8q", "a7a8r", "a7a8b", "a7a8n", "a7b8q", "a7b8n"] {
        assert!(has_move(&moves, text), "missing {text}");
    }
    // quiet promotions are noisy
    let captures = pos.generate_legal_moves(GenMode::Captures);
    assert_eq!(captures.iter().filter(|m| m.is_promotion()).count(), 8);
}

#[test]
fn test_castling_blocked_by_attack() {
    // Black rook on f8 covers f1: no king-side castle, queen side allowed.
    let pos = fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
    let moves = pos.generate_legal_moves(GenMode::All);
    assert!(!has_move(&moves, "e1g1"));
    assert!(has_move(&moves, "e1c1"));

    // b1 may be attacked; only d1 and c1 matter.
    let pos = fen("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
    assert!(has_move(&pos.generate_legal_moves(GenMode::All), "e1c1"));

    // b1 must still be empty.
    let pos = fen("4k3/8/8/8/8/8/8/RN2K3 w Q - 0 1");
    assert!(!has_move(&pos.generate_legal_moves(GenMode::All), "e1c1"));
}

#[test]
fn test_king_cannot_retreat_along_checking_ray() {
    let pos = fen("4k3/8/8/8/8/8/8/r3K3 w - - 0 1");
    let moves = pos.generate_legal_moves(GenMode::All);
    assert!(!has_move(&moves, "e1f1"));
    assert!(has_move(&moves, "e1e2"));
}

#[test]
fn test_checkmate_and_stalemate_have_no_moves() {
    // back-rank mate
    let mate = fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1");
    assert!(mate.in_check());
    assert!(mate.generate_legal_moves(GenMode::All).is_empty());

    let stalemate = fen("k7/2K5/1Q6/8/8/8/8/8 b - - 0 1");
    assert!(!stalemate.in_check());
    assert!(stalemate.generate_legal_moves(GenMode::All).is_empty());
}

#[test]
fn test_generated_moves_pass_is_legal() {
    let pos = fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -");
    for mv in &pos.generate_legal_moves(GenMode::All) {
        assert!(pos.is_legal(*mv), "{mv} rejected");
    }
}

#[test]
fn test_move_list_retain() {
    let mut list = MoveList::new();
    list.push(Move::normal(0, 1));
    list.push(Move::normal(0, 2));
    list.push(Move::normal(0, 3));
    list.retain(|m| m.to() != 2);
    assert_eq!(list.len(), 2);
    assert_eq!(list[1], Move::normal(0, 3));
    list.clear();
    assert!(list.is_empty());
}
