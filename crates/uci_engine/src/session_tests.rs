use super::*;
use std::fs;

use chess_core::{Move, Network};
use neural_engine::save_model;

fn session() -> (Session, Arc<Mutex<Vec<u8>>>) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let out: Output = buffer.clone();
    let config = SearchConfig {
        tt_size_log2: 12,
        ..SearchConfig::default()
    };
    (Session::new(config, out), buffer)
}

fn lines(buffer: &Arc<Mutex<Vec<u8>>>) -> Vec<String> {
    let bytes = buffer.lock().unwrap();
    String::from_utf8_lossy(&bytes).lines().map(str::to_string).collect()
}

#[test]
fn test_uci_handshake() {
    let (mut session, buffer) = session();
    assert!(session.handle("uci"));
    assert!(session.handle("isready"));
    let out = lines(&buffer);
    assert_eq!(out[0], "id name Classical (material)");
    assert!(out.iter().any(|l| l.starts_with("option name Hash type spin")));
    assert!(out.iter().any(|l| l.starts_with("option name Evaluator type combo")));
    assert_eq!(out[out.len() - 2], "uciok");
    assert_eq!(out[out.len() - 1], "readyok");
}

#[test]
fn test_go_depth_prints_bestmove() {
    let (mut session, buffer) = session();
    session.handle("position startpos moves e2e4 e7e5");
    session.handle("go depth 2");
    session.finish_search();

    let out = lines(&buffer);
    let info = out.iter().find(|l| l.starts_with("info depth 2 score cp")).unwrap();
    assert!(info.contains(" pv "));
    let best = out.last().unwrap().strip_prefix("bestmove ").unwrap();
    assert!(chess_core::parse_uci_move(session.position(), best).is_ok());
}

#[test]
fn test_mated_position_reports_null_move() {
    let (mut session, buffer) = session();
    session.handle("position fen R5k1/5ppp/8/8/8/8/8/K7 b - - 0 1");
    session.handle("go depth 3");
    session.finish_search();
    assert_eq!(lines(&buffer).last().unwrap(), "bestmove 0000");
}

#[test]
fn test_bad_position_keeps_previous() {
    let (mut session, _buffer) = session();
    session.handle("position startpos moves e2e4");
    let before = session.position().to_fen();
    session.handle("position startpos moves e2e5");
    session.handle("position fen not/a/fen w - - 0 1");
    assert_eq!(session.position().to_fen(), before);
}

#[test]
fn test_stop_ends_infinite_search() {
    let (mut session, buffer) = session();
    session.handle("go infinite");
    assert!(session.is_searching());
    std::thread::sleep(Duration::from_millis(20));
    session.handle("stop");
    assert!(!session.is_searching());
    assert!(lines(&buffer).last().unwrap().starts_with("bestmove "));

    // Nothing to stop between searches.
    session.handle("stop");
    assert!(session.handle("isready"));
}

#[test]
fn test_stop_right_after_go_infinite() {
    let (done_tx, done_rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let (mut session, buffer) = session();
        for _ in 0..20 {
            session.handle("go infinite");
            session.handle("stop");
        }
        let bestmoves = lines(&buffer).iter().filter(|l| l.starts_with("bestmove ")).count();
        done_tx.send(bestmoves).ok();
    });
    let bestmoves = done_rx.recv_timeout(Duration::from_secs(30)).unwrap();
    assert_eq!(bestmoves, 20);
}

#[test]
fn test_infinite_search_waits_for_stop_after_mate() {
    let (mut session, buffer) = session();
    session.handle("position fen 4k3/8/4K3/8/4Q3/8/8/8 w - - 0 1");
    session.handle("go infinite");
    std::thread::sleep(Duration::from_millis(100));
    assert!(!lines(&buffer).iter().any(|l| l.starts_with("bestmove")));
    session.handle("stop");
    assert!(lines(&buffer).last().unwrap().starts_with("bestmove "));
}

#[test]
fn test_quit_returns_false() {
    let (mut session, _buffer) = session();
    session.handle("go depth 1");
    assert!(!session.handle("quit"));
    assert!(!session.is_searching());
    assert!(session.handle(""));
    assert!(session.handle("unknowncommand arg"));
}

#[test]
fn test_ucinewgame_resets_position() {
    let (mut session, _buffer) = session();
    session.handle("position startpos moves d2d4");
    session.handle("ucinewgame");
    assert_eq!(session.position().to_fen(), chess_core::START_FEN);
}

#[test]
fn test_neural_evaluator_option() {
    let dir = std::env::temp_dir().join(format!("uci_engine_models_{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    save_model(&dir, "v001", &Network::zeroed(), None).unwrap();
    save_model(&dir, "v002", &Network::zeroed(), None).unwrap();

    let (session, buffer) = session();
    let mut session = session.with_models_dir(&dir);
    session.handle("setoption name Hash value 1");
    session.handle("setoption name Evaluator value neural");
    assert_eq!(session.evaluator(), EvaluatorChoice::Neural);
    session.handle("setoption name ModelVersion value v002");
    session.handle("setoption name ModelVersion value v404");
    session.handle("uci");
    assert!(lines(&buffer).contains(&"id name Neural-v002".to_string()));

    session.handle("setoption name Evaluator value material");
    assert_eq!(session.evaluator(), EvaluatorChoice::Material);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_model_keeps_material() {
    let (session, _buffer) = session();
    let mut session = session.with_models_dir("/nonexistent/models");
    session.handle("setoption name Evaluator value neural");
    assert_eq!(session.evaluator(), EvaluatorChoice::Material);
}

#[test]
fn test_parse_setoption() {
    assert_eq!(
        parse_setoption(&["name", "Hash", "value", "64"]),
        Some(("Hash".to_string(), "64".to_string()))
    );
    assert_eq!(
        parse_setoption(&["name", "Clear", "Hash"]),
        Some(("Clear Hash".to_string(), String::new()))
    );
    assert_eq!(parse_setoption(&["value", "3"]), None);
    assert_eq!(parse_setoption(&["name", "value", "3"]), None);
}

#[test]
fn test_parse_go() {
    let limits = parse_go(&["depth", "5"], Color::White);
    assert_eq!(limits.depth, 5);
    assert_eq!(limits.move_time, None);

    let limits = parse_go(&["movetime", "1000"], Color::White);
    assert_eq!(limits.move_time, Some(Duration::from_millis(990)));
    assert_eq!(limits.depth, MAX_DEPTH);

    let args = ["wtime", "60000", "btime", "20000", "winc", "1000", "binc", "0"];
    let white = parse_go(&args, Color::White);
    assert_eq!(white.move_time, Some(Duration::from_millis(3_500)));
    let black = parse_go(&args, Color::Black);
    assert_eq!(black.move_time, Some(Duration::from_millis(1_000)));

    let limits = parse_go(&["movetime", "500", "depth", "3"], Color::Black);
    assert_eq!(limits.depth, 3);
    assert_eq!(limits.move_time, Some(Duration::from_millis(490)));

    assert_eq!(parse_go(&["infinite"], Color::White).move_time, None);
    assert_eq!(parse_go(&["infinite"], Color::White).depth, MAX_DEPTH);
    assert_eq!(parse_go(&[], Color::White).depth, SearchLimits::default().depth);
}

#[test]
fn test_info_line_formats_mate_and_pv() {
    let result = SearchResult {
        best_move: Some(Move::normal(12, 28)),
        score: MATE - 3,
        depth: 4,
        nodes: 2_000,
        stopped: false,
        elapsed: Duration::from_millis(1_000),
        pv: vec![Move::normal(12, 28), Move::normal(52, 36)],
    };
    assert_eq!(
        info_line(&result),
        "info depth 4 score mate 2 nodes 2000 time 1000 nps 2000 pv e2e4 e7e5"
    );

    let mated = SearchResult {
        score: -(MATE - 2),
        pv: Vec::new(),
        ..result
    };
    assert!(info_line(&mated).contains("score mate -1"));
    assert!(!info_line(&mated).contains(" pv"));
}
