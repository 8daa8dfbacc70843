//! Perft benchmark for profiling with cargo-flamegraph.
//!
//! Without a FEN it runs the bundled EPD suite up to `depth`, checking each
//! count against the suite and timing it. With a FEN it times that position,
//! or prints a per-move breakdown when `divide` follows.
//!
//! Usage:
//!   cargo flamegraph --example perft_bench -p chess_core -- [depth] [fen] [divide]
//!
//!   # Suite up to depth 4 (default)
//!   cargo run --release --example perft_bench -p chess_core
//!
//!   # One position, compared move by move against another generator
//!   cargo run --release --example perft_bench -p chess_core -- 3 "<fen>" divide

use chess_core::{Position, perft, perft_divide};
use std::env;
use std::process::ExitCode;
use std::time::{Duration, Instant};

const SUITE: &str = include_str!("../tests/standard.epd");

fn nps(nodes: u64, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        nodes as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

/// `fen ;D1 20 ;D2 400` into the FEN and its (depth, nodes) pairs.
fn suite_line(line: &str) -> Option<(&str, Vec<(u8, u64)>)> {
    let mut fields = line.split(';');
    let fen = fields.next()?.trim();
    let counts = fields
        .filter_map(|field| {
            let (key, value) = field.trim().split_once(' ')?;
            Some((key.strip_prefix('D')?.parse().ok()?, value.trim().parse().ok()?))
        })
        .collect();
    (!fen.is_empty()).then_some((fen, counts))
}

fn run_suite(max_depth: u8) -> ExitCode {
    println!("=== Perft suite up to depth {max_depth} ===");
    println!();

    let mut failures = 0;
    let (mut total_nodes, mut total_time) = (0u64, Duration::ZERO);
    for (fen, counts) in SUITE.lines().filter_map(suite_line) {
        let Ok(mut pos) = Position::from_fen(fen) else {
            println!("{fen}: invalid FEN, skipped");
            continue;
        };
        println!("{fen}");
        for (depth, expected) in counts.into_iter().filter(|&(d, _)| d <= max_depth) {
            let start = Instant::now();
            let nodes = perft(&mut pos, depth);
            let elapsed = start.elapsed();
            total_nodes += nodes;
            total_time += elapsed;

            let status = if nodes == expected {
                "ok".to_string()
            } else {
                failures += 1;
                format!("expected {expected}")
            };
            println!(
                "  D{depth} {nodes:>12} {elapsed:>10.3?} {:>12.0} nps  {status}",
                nps(nodes, elapsed)
            );
        }
    }

    println!("{:=<70}", "");
    println!(
        "TOTAL: {total_nodes} nodes in {total_time:.3?} ({:.0} nps), {failures} mismatches",
        nps(total_nodes, total_time)
    );
    if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn run_position(fen: &str, depth: u8, divide: bool) -> ExitCode {
    let mut pos = match Position::from_fen(fen) {
        Ok(pos) => pos,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    println!("Position: {fen}");
    println!("Depth: {depth}");
    println!();

    let start = Instant::now();
    let nodes = if divide {
        let breakdown = perft_divide(&mut pos, depth);
        for (mv, count) in &breakdown {
            println!("{mv}: {count}");
        }
        println!();
        breakdown.iter().map(|(_, count)| count).sum()
    } else {
        perft(&mut pos, depth)
    };
    let elapsed = start.elapsed();

    println!("Nodes: {nodes}");
    println!("Time: {elapsed:.3?}");
    println!("NPS: {:.0}", nps(nodes, elapsed));
    ExitCode::SUCCESS
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let depth: u8 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(4);

    match args.get(2) {
        Some(fen) => run_position(fen, depth, args.get(3).is_some_and(|a| a == "divide")),
        None => run_suite(depth),
    }
}
