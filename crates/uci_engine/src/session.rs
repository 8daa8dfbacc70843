//! UCI command handling.
//!
//! Searches run on a worker thread that owns the engine until it prints
//! `bestmove`; any command that needs the engine joins it first.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chess_core::{
    move_to_uci, parse_position_command, Color, Engine, Position, SearchLimits, SearchResult,
    TimeControl, MAX_DEPTH,
};
use classical_engine::search::nodes_per_second;
use classical_engine::{is_mate_score, ClassicalEngine, SearchConfig, MATE};
use neural_engine::{NeuralEngine, DEFAULT_MODELS_DIR};
use tracing::{debug, info, warn};

/// Where protocol text goes; shared with the search thread.
pub type Output = Arc<Mutex<dyn Write + Send>>;

pub const DEFAULT_HASH_MB: usize = 16;
pub const DEFAULT_MODEL_VERSION: &str = "v001";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluatorChoice {
    Material,
    Neural,
}

struct RunningSearch {
    time_control: TimeControl,
    handle: JoinHandle<Box<dyn Engine>>,
}

pub struct Session {
    engine: Option<Box<dyn Engine>>,
    search: Option<RunningSearch>,
    position: Position,
    config: SearchConfig,
    evaluator: EvaluatorChoice,
    models_dir: PathBuf,
    model_version: String,
    hash_mb: Option<usize>,
    out: Output,
}

impl Session {
    pub fn new(config: SearchConfig, out: Output) -> Self {
        let engine: Box<dyn Engine> = Box::new(ClassicalEngine::with_config(config.clone()));
        Self {
            engine: Some(engine),
            search: None,
            position: Position::startpos(),
            config,
            evaluator: EvaluatorChoice::Material,
            models_dir: PathBuf::from(DEFAULT_MODELS_DIR),
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            hash_mb: None,
            out,
        }
    }

    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn evaluator(&self) -> EvaluatorChoice {
        self.evaluator
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_some()
    }

    /// Handle one line of input. Returns false on `quit`.
    pub fn handle(&mut self, line: &str) -> bool {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return true;
        };

        match command {
            "uci" => self.identify(),
            "isready" => self.send("readyok"),
            "ucinewgame" => {
                self.finish_search();
                if let Some(engine) = self.engine.as_mut() {
                    engine.new_game();
                }
                self.position = Position::startpos();
            }
            "setoption" => {
                self.finish_search();
                self.set_option(args);
            }
            "position" => match parse_position_command(args) {
                Ok(pos) => self.position = pos,
                Err(err) => warn!(%err, "rejected position command"),
            },
            "go" => {
                self.finish_search();
                let limits = parse_go(args, self.position.side_to_move());
                self.start_search(limits);
            }
            "stop" => {
                if let Some(search) = &self.search {
                    search.time_control.stop();
                }
                self.finish_search();
            }
            "quit" => {
                if let Some(search) = &self.search {
                    search.time_control.stop();
                }
                self.finish_search();
                return false;
            }
            _ => debug!(line, "ignoring unknown command"),
        }
        true
    }

    fn identify(&mut self) {
        let name = self
            .engine
            .as_ref()
            .map_or_else(|| "bitboard-chess".to_string(), |e| e.name().to_string());
        self.send(&format!("id name {name}"));
        self.send("id author bitboard-chess");
        self.send(&format!(
            "option name Hash type spin default {DEFAULT_HASH_MB} min 1 max 4096"
        ));
        self.send("option name Evaluator type combo default material var material var neural");
        self.send(&format!(
            "option name ModelVersion type string default {DEFAULT_MODEL_VERSION}"
        ));
        self.send("uciok");
    }

    fn set_option(&mut self, args: &[&str]) {
        let Some((name, value)) = parse_setoption(args) else {
            warn!(?args, "malformed setoption");
            return;
        };

        match name.to_lowercase().as_str() {
            "evaluator" => match value.to_lowercase().as_str() {
                "material" => self.switch_evaluator(EvaluatorChoice::Material),
                "neural" => self.switch_evaluator(EvaluatorChoice::Neural),
                _ => warn!(%value, "unknown evaluator"),
            },
            "modelversion" => {
                if self.evaluator == EvaluatorChoice::Neural {
                    let loaded = self
                        .engine
                        .as_mut()
                        .is_some_and(|e| e.set_option("ModelVersion", &value));
                    if !loaded {
                        return;
                    }
                }
                self.model_version = value;
            }
            "hash" => {
                let accepted = self.engine.as_mut().is_some_and(|e| e.set_option("Hash", &value));
                if accepted {
                    self.hash_mb = value.trim().parse().ok();
                }
            }
            _ => {
                let accepted = self.engine.as_mut().is_some_and(|e| e.set_option(&name, &value));
                if !accepted {
                    warn!(%name, %value, "unsupported option");
                }
            }
        }
    }

    fn switch_evaluator(&mut self, choice: EvaluatorChoice) {
        if choice == self.evaluator {
            return;
        }
        let engine: Box<dyn Engine> = match choice {
            EvaluatorChoice::Material => {
                Box::new(ClassicalEngine::with_config(self.config.clone()))
            }
            EvaluatorChoice::Neural => match NeuralEngine::with_model_and_config(
                &self.models_dir,
                &self.model_version,
                self.config.clone(),
            ) {
                Ok(engine) => Box::new(engine),
                Err(err) => {
                    warn!(%err, "staying with the material evaluator");
                    return;
                }
            },
        };
        self.install(engine);
        self.evaluator = choice;
        info!(engine = ?self.engine.as_ref().map(|e| e.name()), "switched engine");
    }

    /// Make `engine` current, carrying over the hash size.
    fn install(&mut self, mut engine: Box<dyn Engine>) {
        if let Some(mb) = self.hash_mb {
            engine.set_option("Hash", &mb.to_string());
        }
        self.engine = Some(engine);
    }

    fn start_search(&mut self, limits: SearchLimits) {
        let Some(engine) = self.engine.take() else {
            warn!("no engine available");
            return;
        };
        let time_control = limits.time_control.clone();
        let pos = self.position.clone();
        let out = Arc::clone(&self.out);
        debug!(depth = limits.depth, move_time = ?limits.move_time, "starting search");

        let handle = thread::spawn(move || run_search(engine, pos, limits, out));
        self.search = Some(RunningSearch {
            time_control,
            handle,
        });
    }

    /// Wait for the running search, if any, and take the engine back.
    pub fn finish_search(&mut self) {
        let Some(search) = self.search.take() else {
            return;
        };
        match search.handle.join() {
            Ok(engine) => self.engine = Some(engine),
            Err(_) => {
                warn!("search thread panicked; rebuilding engine");
                self.evaluator = EvaluatorChoice::Material;
                self.install(Box::new(ClassicalEngine::with_config(self.config.clone())));
            }
        }
    }

    fn send(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}").ok();
        out.flush().ok();
    }
}

fn run_search(
    mut engine: Box<dyn Engine>,
    pos: Position,
    limits: SearchLimits,
    out: Output,
) -> Box<dyn Engine> {
    // `go infinite` may not report before `stop`, even once the search is done.
    let infinite = limits.move_time.is_none() && limits.depth >= MAX_DEPTH;
    let time_control = limits.time_control.clone();
    let result = engine.search(&pos, limits);
    if infinite {
        while !time_control.is_stopped() {
            thread::sleep(Duration::from_millis(1));
        }
    }
    let best = result.best_move.map_or_else(|| "0000".to_string(), move_to_uci);

    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    writeln!(out, "{}", info_line(&result)).ok();
    writeln!(out, "bestmove {best}").ok();
    out.flush().ok();
    engine
}

/// The final `info` line for a finished search.
pub fn info_line(result: &SearchResult) -> String {
    let score = if is_mate_score(result.score) {
        let plies = MATE - result.score.abs();
        let moves = (plies + 1) / 2;
        format!("mate {}", if result.score > 0 { moves } else { -moves })
    } else {
        format!("cp {}", result.score)
    };
    let mut line = format!(
        "info depth {} score {score} nodes {} time {} nps {}",
        result.depth,
        result.nodes,
        result.elapsed.as_millis(),
        nodes_per_second(result.nodes, result.elapsed)
    );
    if !result.pv.is_empty() {
        line.push_str(" pv");
        for &mv in &result.pv {
            line.push(' ');
            line.push_str(&move_to_uci(mv));
        }
    }
    line
}

/// Split `name <words...> [value <words...>]`.
pub fn parse_setoption(args: &[&str]) -> Option<(String, String)> {
    let (&first, rest) = args.split_first()?;
    if first != "name" {
        return None;
    }
    let value_at = rest.iter().position(|&w| w == "value");
    let (name, value) = match value_at {
        Some(i) => (&rest[..i], &rest[i + 1..]),
        None => (rest, &[][..]),
    };
    if name.is_empty() {
        return None;
    }
    Some((name.join(" "), value.join(" ")))
}

/// Search limits for `go` arguments; `side` picks the clock to read.
pub fn parse_go(args: &[&str], side: Color) -> SearchLimits {
    let mut depth: Option<u8> = None;
    let mut move_time: Option<u64> = None;
    let mut clock = [None::<u64>; 2];
    let mut increment = [0u64; 2];
    let mut infinite = false;

    let mut iter = args.iter();
    while let Some(&key) = iter.next() {
        let mut number = || iter.next().and_then(|v| v.parse::<u64>().ok());
        match key {
            "depth" => depth = number().map(|d| d.clamp(1, u64::from(MAX_DEPTH)) as u8),
            "movetime" => move_time = number(),
            "wtime" => clock[Color::White.idx()] = number(),
            "btime" => clock[Color::Black.idx()] = number(),
            "winc" => increment[Color::White.idx()] = number().unwrap_or(0),
            "binc" => increment[Color::Black.idx()] = number().unwrap_or(0),
            "infinite" => infinite = true,
            _ => debug!(key, "ignoring go argument"),
        }
    }

    let limits = if let Some(ms) = move_time {
        SearchLimits::move_time(Duration::from_millis(ms))
    } else if let Some(ms) = clock[side.idx()] {
        SearchLimits::from_clock(
            Duration::from_millis(ms),
            Duration::from_millis(increment[side.idx()]),
        )
    } else if infinite {
        SearchLimits::depth(MAX_DEPTH)
    } else {
        SearchLimits::default()
    };
    match depth {
        Some(d) if move_time.is_some() || clock[side.idx()].is_some() => limits.with_depth(d),
        Some(d) => SearchLimits::depth(d),
        None => limits,
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod session_tests;
