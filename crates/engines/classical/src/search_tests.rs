use super::*;
use std::thread;

use chess_core::{position_from_moves, CHECK_INTERVAL, MAX_DEPTH};

use crate::eval::MaterialEvaluator;

fn searcher() -> Searcher<MaterialEvaluator> {
    Searcher::new(
        MaterialEvaluator,
        SearchConfig {
            tt_size_log2: 16,
            ..SearchConfig::default()
        },
    )
}

fn fen(text: &str) -> Position {
    Position::from_fen(text).unwrap()
}

#[test]
fn test_finds_mate_in_one() {
    let pos = fen("4k3/8/4K3/8/4Q3/8/8/8 w - - 0 1");
    let result = searcher().search(&pos, SearchLimits::depth(3));

    assert_eq!(result.score, MATE - 1);
    assert!(is_mate_score(result.score));

    let mut after = pos.clone();
    after.make_move(result.best_move.unwrap());
    assert!(after.in_check());
    assert!(after.generate_legal_moves(GenMode::All).is_empty());
}

#[test]
fn test_checkmated_root_has_no_move() {
    let pos = fen("R5k1/5ppp/8/8/8/8/8/K7 b - - 0 1");
    let result = searcher().search(&pos, SearchLimits::depth(4));
    assert_eq!(result.best_move, None);
    assert_eq!(result.score, -MATE);
    assert!(result.pv.is_empty());
}

#[test]
fn test_stalemated_root_scores_draw() {
    let pos = fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
    let result = searcher().search(&pos, SearchLimits::depth(4));
    assert_eq!(result.best_move, None);
    assert_eq!(result.score, DRAW);
}

#[test]
fn test_captures_hanging_queen() {
    let pos = fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1");
    let result = searcher().search(&pos, SearchLimits::depth(3));
    assert_eq!(result.best_move.unwrap().to_string(), "d1d5");
    assert!(result.score >= 400);
}

#[test]
fn test_avoids_losing_the_queen() {
    // The queen is attacked by a pawn and can simply take it.
    let pos = fen("4k3/8/8/2p5/3Q4/8/8/4K3 w - - 0 1");
    let result = searcher().search(&pos, SearchLimits::depth(4));
    let mv = result.best_move.unwrap();
    let mut after = pos.clone();
    after.make_move(mv);
    assert!(MaterialEvaluator.evaluate(&after) <= -800);
    assert!(result.score >= 800);
}

#[test]
fn test_search_is_deterministic() {
    let pos = Position::startpos();
    let mut engine = searcher();
    let first = engine.search(&pos, SearchLimits::depth(4));
    let second = engine.search(&pos, SearchLimits::depth(4));

    assert_eq!(first.best_move, second.best_move);
    assert_eq!(first.score, second.score);
    assert_eq!(first.nodes, second.nodes);
    assert_eq!(first.pv, second.pv);
}

#[test]
fn test_caller_position_is_untouched() {
    let pos = fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
    let fen_before = pos.to_fen();
    let hash_before = pos.position_hash();

    let result = searcher().search(&pos, SearchLimits::depth(3));
    assert!(result.best_move.is_some());
    assert_eq!(pos.to_fen(), fen_before);
    assert_eq!(pos.position_hash(), hash_before);
}

#[test]
fn test_reports_completed_depth_and_pv() {
    let pos = Position::startpos();
    let result = searcher().search(&pos, SearchLimits::depth(4));
    assert_eq!(result.depth, 4);
    assert!(!result.stopped);
    assert!(result.nodes > 0);
    assert_eq!(result.pv.first().copied(), result.best_move);

    let mut replay = pos.clone();
    for &mv in &result.pv {
        assert!(replay.generate_legal_moves(GenMode::All).contains(&mv));
        replay.make_move(mv);
    }
}

#[test]
fn test_threefold_position_is_a_draw_below_root() {
    let mut pos = position_from_moves(
        "startpos",
        &["g1f3", "g8f6", "f3g1", "f6g8", "g1f3", "g8f6", "f3g1", "f6g8"],
    )
    .unwrap();
    assert!(pos.threefold_repetition());

    let mut engine = searcher();
    assert_eq!(engine.negamax(&mut pos, 3, 1, -INF, INF, true), Ok(DRAW));
    assert_eq!(engine.quiescence(&mut pos, 1, -INF, INF), Ok(DRAW));
}

#[test]
fn test_fifty_move_rule_is_a_draw_below_root() {
    let mut pos = fen("4k3/8/8/8/8/8/8/Q3K3 b - - 100 80");
    let mut engine = searcher();
    assert_eq!(engine.negamax(&mut pos, 2, 1, -INF, INF, true), Ok(DRAW));
}

#[test]
fn test_time_limit_stops_with_a_move() {
    let pos = Position::startpos();
    let result = searcher().search(&pos, SearchLimits::time(Duration::from_millis(50)));

    assert!(result.stopped);
    assert!(result.best_move.is_some());
    assert!(result.depth >= 1);
    assert!(result.depth < MAX_DEPTH);
    assert!(result.elapsed < Duration::from_secs(5));
}

#[test]
fn test_external_stop_request() {
    let pos = Position::startpos();
    let limits = SearchLimits::depth(MAX_DEPTH);
    let handle = limits.time_control.clone();

    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        handle.stop();
    });
    let result = searcher().search(&pos, limits);
    stopper.join().unwrap();

    assert!(result.stopped);
    assert!(result.best_move.is_some());
}

#[test]
fn test_aborted_search_restores_position() {
    let mut pos = Position::startpos();
    let before = pos.to_fen();
    let mut engine = searcher();
    engine.time = TimeControl::new(None);
    engine.time.stop();
    // Trip the clock check a few nodes into the tree.
    engine.nodes = CHECK_INTERVAL - 10;

    assert_eq!(engine.negamax(&mut pos, 5, 0, -INF, INF, true), Err(Aborted));
    assert_eq!(pos.to_fen(), before);
}

#[test]
fn test_pruning_switches_do_not_change_tactics() {
    let pos = fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1");
    let mut plain = Searcher::new(
        MaterialEvaluator,
        SearchConfig {
            tt_size_log2: 12,
            null_move: false,
            rfp_max_depth: 0,
            lmr_min_depth: 100,
            ..SearchConfig::default()
        },
    );
    let pruned = searcher().search(&pos, SearchLimits::depth(4));
    let unpruned = plain.search(&pos, SearchLimits::depth(4));
    assert_eq!(pruned.best_move, unpruned.best_move);
}

#[test]
fn test_nodes_per_second() {
    assert_eq!(nodes_per_second(1_000, Duration::from_millis(500)), 2_000);
    assert_eq!(nodes_per_second(1_000, Duration::ZERO), 0);
}

#[test]
fn test_stop_requested_before_search_is_honoured() {
    let pos = Position::startpos();
    let limits = SearchLimits::depth(7);
    limits.time_control.stop();
    let result = searcher().search(&pos, limits);

    assert!(result.stopped);
    assert_eq!(result.depth, 1);
    assert!(result.best_move.is_some());
}

#[test]
fn test_unbounded_search_does_not_end_on_mate() {
    let pos = fen("4k3/8/4K3/8/4Q3/8/8/8 w - - 0 1");
    let limits = SearchLimits::depth(MAX_DEPTH);
    let handle = limits.time_control.clone();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        handle.stop();
    });
    let result = searcher().search(&pos, limits);
    stopper.join().unwrap();

    assert!(result.depth > 1);
    assert_eq!(result.score, MATE - 1);
}

#[test]
fn test_huge_aspiration_window_does_not_overflow() {
    let mut engine = Searcher::new(
        MaterialEvaluator,
        SearchConfig {
            tt_size_log2: 12,
            aspiration_min_depth: 1,
            aspiration_window: i32::MAX,
            ..SearchConfig::default()
        },
    );
    let pos = fen("4k3/8/8/3q4/8/8/8/3RK3 w - - 0 1");
    let result = engine.search(&pos, SearchLimits::depth(4));
    assert_eq!(result.best_move.unwrap().to_string(), "d1d5");
}
