use std::time::Instant;

use rayon::prelude::*;

use chess_core::{GenMode, Position, perft, perft_divide};

const FULL_PERFT_ENV: &str = "FULL_PERFT";
const NODE_LIMIT: u64 = 10_000_000;
const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

struct SuiteCase {
    line: usize,
    fen: String,
    counts: Vec<(u8, u64)>,
}

fn parse_suite(data: &str) -> Vec<SuiteCase> {
    data.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let mut fields = line.split(';');
            let fen = fields.next()?.trim();
            if fen.is_empty() {
                return None;
            }
            let mut counts: Vec<(u8, u64)> = fields
                .filter_map(|field| {
                    let (key, value) = field.trim().split_once(' ')?;
                    let depth = key.strip_prefix('D')?;
                    Some((
                        depth.parse().unwrap_or_else(|_| panic!("line {}: depth {key}", idx + 1)),
                        value.trim().parse().unwrap_or_else(|_| panic!("line {}: count {value}", idx + 1)),
                    ))
                })
                .collect();
            counts.sort_by_key(|&(depth, _)| depth);
            Some(SuiteCase {
                line: idx + 1,
                fen: fen.to_string(),
                counts,
            })
        })
        .collect()
}

/// Per-move counts one ply down, for locating the move a generator gets wrong.
fn divide_report(pos: &mut Position, depth: u8) -> String {
    perft_divide(pos, depth)
        .into_iter()
        .map(|(mv, nodes)| format!("  {mv}: {nodes}\n"))
        .collect()
}

fn check_perft(fen: &str, depth: u8, expected: u64) -> u64 {
    let mut pos = Position::from_fen(fen).unwrap_or_else(|e| panic!("{fen}: {e}"));
    let got = perft(&mut pos, depth);
    if got != expected {
        panic!(
            "perft mismatch for '{fen}' at depth {depth}: expected {expected}, got {got}\n{}",
            divide_report(&mut pos, depth)
        );
    }
    assert_eq!(pos.to_fen(), Position::from_fen(fen).unwrap().to_fen());
    got
}

#[test]
fn perft_from_standard_epd() {
    let full = std::env::var(FULL_PERFT_ENV).is_ok();
    let cases = parse_suite(include_str!("standard.epd"));
    assert_eq!(cases.len(), 6);

    cases.par_iter().for_each(|case| {
        let start = Instant::now();
        let mut nodes = 0u64;
        let mut ran = Vec::new();
        for &(depth, expected) in &case.counts {
            if !full && expected > NODE_LIMIT {
                eprintln!(
                    "line {}: skipping D{depth} ({expected} nodes); set {FULL_PERFT_ENV}=1 to run it",
                    case.line
                );
                continue;
            }
            nodes += check_perft(&case.fen, depth, expected);
            ran.push(depth);
        }
        let elapsed = start.elapsed();
        println!(
            "line {:02}: depths {ran:?}, {nodes} nodes in {elapsed:.3?} ({:.1} Mn/s)",
            case.line,
            nodes as f64 / 1_000_000.0 / elapsed.as_secs_f64().max(f64::EPSILON)
        );
    });
}

#[test]
fn perft_kiwipete_depth_four() {
    check_perft(KIWIPETE, 4, 4_085_603);
}

#[test]
fn perft_startpos_shallow() {
    let mut pos = Position::startpos();
    for (depth, expected) in [(1, 20), (2, 400), (3, 8_902), (4, 197_281)] {
        assert_eq!(perft(&mut pos, depth), expected, "depth {depth}");
    }
    assert_eq!(pos.to_fen(), chess_core::START_FEN);
}

#[test]
fn perft_divide_matches_children() {
    let mut pos = Position::from_fen(KIWIPETE).unwrap();
    let divide = perft_divide(&mut pos, 2);
    assert_eq!(divide.len(), 48);
    assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 2_039);

    // Each entry is the child position's own move count.
    for (mv, nodes) in divide {
        pos.make_move(mv);
        assert_eq!(pos.generate_legal_moves(GenMode::All).len() as u64, nodes, "{mv}");
        pos.undo_move(mv);
    }
    assert_eq!(perft_divide(&mut pos, 0), Vec::new());
}

#[test]
fn divide_report_lists_every_root_move() {
    let mut pos = Position::startpos();
    let report = divide_report(&mut pos, 1);
    assert_eq!(report.lines().count(), 20);
    assert!(report.contains("  e2e4: 1\n"));
}
