use std::collections::HashSet;

use super::*;
use crate::types::{Color, PieceKind};

#[test]
fn test_keys_unique() {
    let keys = &HASH_KEYS;
    let mut seen = HashSet::new();

    for color in 0..2 {
        for kind in 0..6 {
            for sq in 0..64 {
                assert!(seen.insert(keys.pieces[color][kind][sq]), "duplicate piece key");
            }
        }
    }
    assert!(seen.insert(keys.black_to_move));
    for k in keys.castling {
        assert!(seen.insert(k), "castling key collision");
    }
    for k in keys.en_passant {
        assert!(seen.insert(k), "en passant key collision");
    }
    assert!(!seen.contains(&0));
}

#[test]
fn test_piece_key_lookup() {
    let wp = Piece::new(Color::White, PieceKind::Pawn);
    let bp = Piece::new(Color::Black, PieceKind::Pawn);
    assert_eq!(HASH_KEYS.piece(wp, 12), HASH_KEYS.pieces[0][0][12]);
    assert_ne!(HASH_KEYS.piece(wp, 12), HASH_KEYS.piece(bp, 12));
}

#[test]
fn test_castling_key_combines_flags() {
    let keys = &HASH_KEYS;
    assert_eq!(keys.castling(CastlingRights::NONE), 0);
    assert_eq!(
        keys.castling(CastlingRights::ALL),
        keys.castling[0] ^ keys.castling[1] ^ keys.castling[2] ^ keys.castling[3]
    );
    let wk = CastlingRights::WHITE_KING_SIDE;
    let bq = CastlingRights::BLACK_QUEEN_SIDE;
    assert_eq!(
        keys.castling(wk.union(bq)),
        keys.castling(wk) ^ keys.castling(bq)
    );
}

#[test]
fn test_en_passant_key_uses_file() {
    // e3 and e6 share the e-file key
    assert_eq!(HASH_KEYS.en_passant(20), HASH_KEYS.en_passant(44));
    assert_ne!(HASH_KEYS.en_passant(20), HASH_KEYS.en_passant(21));
}

#[test]
fn test_keys_are_reproducible() {
    let fresh = HashKeys::new();
    assert_eq!(fresh.black_to_move, HASH_KEYS.black_to_move);
    assert_eq!(fresh.pieces[1][5][63], HASH_KEYS.pieces[1][5][63]);
}
