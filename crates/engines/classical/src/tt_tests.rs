use super::*;

fn mv() -> Move {
    Move::normal(12, 28)
}

#[test]
fn test_store_and_probe() {
    let mut tt = TranspositionTable::new(10);
    assert_eq!(tt.len(), 1024);
    assert!(tt.probe(0xABCD).is_none());

    tt.store(0xABCD, 4, 37, Bound::Exact, mv());
    let entry = tt.probe(0xABCD).unwrap();
    assert_eq!(entry.depth, 4);
    assert_eq!(entry.score, 37);
    assert_eq!(entry.bound, Bound::Exact);
    assert_eq!(tt.best_move(0xABCD), Some(mv()));
}

#[test]
fn test_key_must_match_exactly() {
    let mut tt = TranspositionTable::new(10);
    tt.store(5, 3, 10, Bound::Lower, mv());
    // same slot, different key
    assert!(tt.probe(5 + 1024).is_none());
    assert!(tt.best_move(5 + 1024).is_none());
}

#[test]
fn test_always_replace() {
    let mut tt = TranspositionTable::new(10);
    tt.store(5, 9, 10, Bound::Exact, mv());
    tt.store(5 + 1024, 1, -3, Bound::Upper, Move::NULL);
    assert!(tt.probe(5).is_none());
    let entry = tt.probe(5 + 1024).unwrap();
    assert_eq!(entry.depth, 1);
    assert_eq!(tt.best_move(5 + 1024), None);
}

#[test]
fn test_clear_and_hashfull() {
    let mut tt = TranspositionTable::new(12);
    assert_eq!(tt.hashfull(), 0);
    for key in 0..500u64 {
        tt.store(key, 1, 0, Bound::Exact, Move::NULL);
    }
    assert_eq!(tt.hashfull(), 500);
    tt.clear();
    assert_eq!(tt.hashfull(), 0);
    assert!(tt.probe(1).is_none());
}

#[test]
fn test_with_megabytes_is_power_of_two() {
    let tt = TranspositionTable::with_megabytes(1);
    assert!(tt.len().is_power_of_two());
    assert!(tt.len() * std::mem::size_of::<Option<TtEntry>>() <= 1024 * 1024);

    let tiny = TranspositionTable::with_megabytes(0);
    assert_eq!(tiny.len(), 1024);
}

#[test]
fn test_mate_scores_are_ply_relative() {
    let mate_in_3 = MATE - 5;
    let stored = score_to_tt(mate_in_3, 2);
    assert_eq!(stored, MATE - 3);
    assert_eq!(score_from_tt(stored, 2), mate_in_3);
    // the same entry read four plies deeper is a longer mate
    assert_eq!(score_from_tt(stored, 6), MATE - 9);

    let mated = -MATE + 7;
    assert_eq!(score_from_tt(score_to_tt(mated, 3), 3), mated);

    assert_eq!(score_to_tt(150, 9), 150);
    assert_eq!(score_from_tt(-150, 9), -150);
}
