//! Move generation benchmark for profiling with cargo-flamegraph.
//!
//! Two tables: full versus captures-only generation timed separately per
//! position, then `Position::is_legal` on the pawn moves the generator
//! leaves to it (en passant and pinned pawns).
//!
//! Usage:
//!   cargo flamegraph --example movegen_bench -p chess_core

use chess_core::{GenMode, Move, MoveKind, Position, coord_to_sq};
use std::hint::black_box;
use std::time::{Duration, Instant};

const GEN_POSITIONS: &[(&str, &str)] = &[
    ("Start", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
    ("Kiwipete", "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"),
    ("Promotions", "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1"),
    ("Rook endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"),
    ("Mated", "rnb1kbnr/pppp1ppp/8/4p3/5PPq/8/PPPPP2P/RNBQKBNR w KQkq - 1 3"),
];

/// (name, fen, from, to, kind, expected legality)
const LEGALITY_CASES: &[(&str, &str, &str, &str, MoveKind, bool)] = &[
    ("ep plain", "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2", "e5", "d6", MoveKind::EnPassant, true),
    ("ep rank pin", "8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1", "e5", "d6", MoveKind::EnPassant, false),
    ("ep along pin", "4k3/2b5/8/3pP3/5K2/8/8/8 w - d6 0 1", "e5", "d6", MoveKind::EnPassant, true),
    ("ep checker", "8/8/8/3pP3/2K5/8/8/4k3 w - d6 0 1", "e5", "d6", MoveKind::EnPassant, true),
    ("pin along file", "4k3/4r3/8/8/8/8/4P3/4K3 w - - 0 1", "e2", "e3", MoveKind::Normal, true),
    ("pin across diag", "4k3/8/8/b7/8/8/3P4/4K3 w - - 0 1", "d2", "d3", MoveKind::Normal, false),
    ("pin capture", "4k3/8/8/8/8/2b5/3P4/4K3 w - - 0 1", "d2", "c3", MoveKind::Normal, true),
];

const GEN_ITERATIONS: usize = 100_000;
const LEGAL_ITERATIONS: usize = 1_000_000;

fn per_second(count: usize, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        count as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

fn time_mode(pos: &Position, mode: GenMode) -> (usize, Duration) {
    let start = Instant::now();
    let mut moves = 0usize;
    for _ in 0..GEN_ITERATIONS {
        moves += black_box(pos).generate_legal_moves(mode).len();
    }
    (moves / GEN_ITERATIONS, start.elapsed())
}

fn generation_table() {
    println!("=== Generation: All vs Captures ===");
    println!("Iterations per position: {GEN_ITERATIONS}");
    println!();
    println!("{:<16}{:>6}{:>14}{:>6}{:>14}{:>8}", "position", "all", "pos/sec", "caps", "pos/sec", "ratio");

    let (mut all_time, mut caps_time) = (Duration::ZERO, Duration::ZERO);
    for (name, fen) in GEN_POSITIONS {
        let Ok(pos) = Position::from_fen(fen) else {
            println!("{name}: invalid FEN, skipped");
            continue;
        };
        let (all, all_elapsed) = time_mode(&pos, GenMode::All);
        let (caps, caps_elapsed) = time_mode(&pos, GenMode::Captures);
        all_time += all_elapsed;
        caps_time += caps_elapsed;

        let ratio = all_elapsed.as_secs_f64() / caps_elapsed.as_secs_f64().max(f64::EPSILON);
        println!(
            "{name:<16}{all:>6}{:>14.0}{caps:>6}{:>14.0}{ratio:>8.2}",
            per_second(GEN_ITERATIONS, all_elapsed),
            per_second(GEN_ITERATIONS, caps_elapsed),
        );
    }
    println!("{:=<64}", "");
    println!("All: {all_time:.3?}  Captures: {caps_time:.3?}");
}

fn legality_table() {
    println!("=== is_legal: en passant and pinned pawns ===");
    println!("Iterations per case: {LEGAL_ITERATIONS}");
    println!();

    for &(name, fen, from, to, kind, expected) in LEGALITY_CASES {
        let (Ok(pos), Some(from), Some(to)) = (Position::from_fen(fen), coord_to_sq(from), coord_to_sq(to))
        else {
            println!("{name}: bad case, skipped");
            continue;
        };
        let mv = Move::new(from, to, kind);
        let legal = pos.is_legal(mv);
        let generated = pos.generate_legal_moves(GenMode::All).iter().any(|&m| m == mv);
        let verdict = if legal == expected && generated == expected { "ok" } else { "MISMATCH" };

        let start = Instant::now();
        let mut count = 0usize;
        for _ in 0..LEGAL_ITERATIONS {
            count += black_box(&pos).is_legal(black_box(mv)) as usize;
        }
        let elapsed = start.elapsed();
        black_box(count);

        println!(
            "{name:.<20} {mv} legal={legal:<5} {verdict:<8} {:>12.0} calls/sec",
            per_second(LEGAL_ITERATIONS, elapsed)
        );
    }
}

fn main() {
    generation_table();
    println!();
    legality_table();
}
