//! Iterative-deepening negamax with alpha-beta pruning.
//!
//! The searcher owns its transposition table and ordering tables and works on
//! a private copy of the caller's position. Running out of time surfaces as
//! `Err(Aborted)`, which every frame passes up with `?`; moves are made
//! through [`Position::scoped_move`], so unwinding restores the position on
//! the way out.

use std::time::Duration;

use chess_core::{
    Evaluator, GenMode, Move, Position, SearchLimits, SearchResult, TimeControl, MAX_DEPTH,
};
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::ordering::{HistoryTable, KillerTable, MovePicker};
use crate::tt::{score_from_tt, score_to_tt, Bound, TranspositionTable};

pub const INF: i32 = 32_000;
pub const MATE: i32 = 30_000;
pub const MAX_PLY: usize = 128;
pub const DRAW: i32 = 0;

/// True for scores that encode a forced mate for either side.
#[inline]
pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE - MAX_PLY as i32
}

/// The time budget ran out or a stop was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

type SearchOutcome = Result<i32, Aborted>;

pub struct Searcher<E: Evaluator> {
    evaluator: E,
    config: SearchConfig,
    tt: TranspositionTable,
    killers: KillerTable,
    history: HistoryTable,
    time: TimeControl,
    nodes: u64,
    /// Best move of the root call in progress.
    root_best: Move,
}

impl<E: Evaluator> Searcher<E> {
    pub fn new(evaluator: E, config: SearchConfig) -> Self {
        let tt = TranspositionTable::new(config.tt_size_log2);
        Self {
            evaluator,
            config,
            tt,
            killers: KillerTable::new(),
            history: HistoryTable::new(),
            time: TimeControl::default(),
            nodes: 0,
            root_best: Move::NULL,
        }
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SearchConfig) {
        if config.tt_size_log2 != self.config.tt_size_log2 {
            self.tt = TranspositionTable::new(config.tt_size_log2);
        }
        self.config = config;
    }

    /// Replace the transposition table with one of about `mb` megabytes.
    pub fn resize_tt(&mut self, mb: usize) {
        self.tt = TranspositionTable::with_megabytes(mb);
    }

    pub fn tt(&self) -> &TranspositionTable {
        &self.tt
    }

    /// Forget everything learned in earlier searches.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.killers.clear();
        self.history.clear();
    }

    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Search `pos` within `limits` and report the best move of the deepest
    /// completed iteration.
    pub fn search(&mut self, pos: &Position, mut limits: SearchLimits) -> SearchResult {
        limits.start();
        self.time = limits.time_control.clone();
        self.nodes = 0;
        self.clear();

        let mut pos = pos.clone();
        self.evaluator.prepare(&mut pos);

        let root_moves = pos.generate_legal_moves(GenMode::All);
        if root_moves.is_empty() {
            let score = if pos.in_check() { -MATE } else { DRAW };
            return SearchResult {
                best_move: None,
                score,
                depth: 0,
                nodes: 0,
                stopped: false,
                elapsed: self.time.elapsed(),
                pv: Vec::new(),
            };
        }

        let max_depth = limits.depth.clamp(1, MAX_DEPTH);
        // Without a depth or time bound the search runs until told to stop.
        let bounded = limits.move_time.is_some() || limits.depth < MAX_DEPTH;
        let mut best_move = root_moves[0];
        let mut score = 0;
        let mut completed = 0u8;
        let mut stopped = false;

        for depth in 1..=max_depth {
            if depth > 1 && self.time.check_time() {
                stopped = true;
                break;
            }
            match self.aspiration(&mut pos, i32::from(depth), score) {
                Ok(s) => {
                    score = s;
                    completed = depth;
                    if !self.root_best.is_null() {
                        best_move = self.root_best;
                    }
                    let elapsed = self.time.elapsed();
                    info!(
                        depth,
                        score,
                        nodes = self.nodes,
                        nps = nodes_per_second(self.nodes, elapsed),
                        elapsed_ms = elapsed.as_millis() as u64,
                        best = %best_move,
                        "iteration complete"
                    );
                }
                Err(Aborted) => {
                    debug!(depth, nodes = self.nodes, "iteration aborted");
                    stopped = true;
                    break;
                }
            }

            // A forced mate within the horizon will not change with depth.
            if bounded && is_mate_score(score) && (MATE - score.abs()) <= i32::from(depth) {
                break;
            }
        }

        let pv = self.principal_variation(&mut pos, best_move, completed.max(1));
        SearchResult {
            best_move: Some(best_move),
            score,
            depth: completed,
            nodes: self.nodes,
            stopped,
            elapsed: self.time.elapsed(),
            pv,
        }
    }

    /// Root search, with a narrow window once the score has settled.
    fn aspiration(&mut self, pos: &mut Position, depth: i32, previous: i32) -> SearchOutcome {
        if depth < i32::from(self.config.aspiration_min_depth) {
            return self.root(pos, depth, -INF, INF);
        }

        let mut delta = self.config.aspiration_window.clamp(1, INF);
        let mut alpha = previous.saturating_sub(delta).max(-INF);
        let mut beta = previous.saturating_add(delta).min(INF);
        loop {
            let score = self.root(pos, depth, alpha, beta)?;
            if score <= alpha {
                debug!(depth, score, alpha, "aspiration fail low");
                delta = delta.saturating_mul(2).min(INF);
                alpha = previous.saturating_sub(delta).max(-INF);
            } else if score >= beta {
                debug!(depth, score, beta, "aspiration fail high");
                delta = delta.saturating_mul(2).min(INF);
                beta = previous.saturating_add(delta).min(INF);
            } else {
                return Ok(score);
            }
            if delta >= INF {
                alpha = -INF;
                beta = INF;
            }
        }
    }

    fn root(&mut self, pos: &mut Position, depth: i32, alpha: i32, beta: i32) -> SearchOutcome {
        self.root_best = Move::NULL;
        self.negamax(pos, depth, 0, alpha, beta, true)
    }

    fn negamax(
        &mut self,
        pos: &mut Position,
        depth: i32,
        ply: usize,
        mut alpha: i32,
        beta: i32,
        allow_null: bool,
    ) -> SearchOutcome {
        self.tick()?;

        let root = ply == 0;
        if !root && (pos.threefold_repetition() || pos.is_fifty_move_draw()) {
            return Ok(DRAW);
        }
        if depth <= 0 {
            return self.quiescence(pos, ply, alpha, beta);
        }
        if ply >= MAX_PLY {
            return Ok(self.evaluator.evaluate(pos));
        }

        let key = pos.position_hash();
        let mut hash_move = Move::NULL;
        if let Some(entry) = self.tt.probe(key) {
            hash_move = entry.best_move;
            if !root && i32::from(entry.depth) >= depth {
                let score = score_from_tt(entry.score, ply);
                let usable = match entry.bound {
                    Bound::Exact => true,
                    Bound::Lower => score >= beta,
                    Bound::Upper => score <= alpha,
                };
                if usable {
                    return Ok(score);
                }
            }
        }

        let in_check = pos.in_check();
        let pv_node = beta - alpha > 1;

        if !root && !in_check && !pv_node {
            let eval = self.evaluator.evaluate(pos);

            // Reverse futility: far enough above beta that a shallow search
            // is not going to bring the score back down.
            if depth <= self.config.rfp_max_depth
                && !is_mate_score(beta)
                && eval - self.config.rfp_margin * depth >= beta
            {
                return Ok(eval);
            }

            if self.config.null_move
                && allow_null
                && depth >= self.config.null_move_min_depth
                && eval >= beta
                && pos.has_non_pawn_material(pos.side_to_move())
            {
                let reduced = depth - 1 - self.config.null_move_reduction;
                let score = {
                    let mut child = pos.scoped_null_move();
                    -self.negamax(&mut child, reduced, ply + 1, -beta, -beta + 1, false)?
                };
                if score >= beta {
                    return Ok(if is_mate_score(score) { beta } else { score });
                }
            }
        }

        let moves = pos.generate_legal_moves(GenMode::All);
        if moves.is_empty() {
            return Ok(if in_check { -MATE + ply as i32 } else { DRAW });
        }

        let us = pos.side_to_move();
        let picker = MovePicker::new(moves, pos, hash_move, self.killers.get(ply), &self.history);

        let original_alpha = alpha;
        let mut best_score = -INF;
        let mut best_move = Move::NULL;

        for (index, mv) in picker.enumerate() {
            let quiet = !pos.is_capture(mv) && !mv.is_promotion();
            let score = {
                let mut child = pos.scoped_move(mv);
                let gives_check = child.in_check();

                if index == 0 {
                    -self.negamax(&mut child, depth - 1, ply + 1, -beta, -alpha, true)?
                } else {
                    let reduce = quiet
                        && !in_check
                        && !gives_check
                        && depth >= self.config.lmr_min_depth
                        && index >= self.config.lmr_min_move_index;
                    let mut score = alpha + 1;
                    if reduce {
                        score = -self.negamax(
                            &mut child,
                            depth - 2,
                            ply + 1,
                            -alpha - 1,
                            -alpha,
                            true,
                        )?;
                    }
                    if score > alpha {
                        score = -self.negamax(&mut child, depth - 1, ply + 1, -beta, -alpha, true)?;
                    }
                    score
                }
            };

            if score > best_score {
                best_score = score;
                best_move = mv;
                if score > alpha {
                    alpha = score;
                    if root {
                        self.root_best = mv;
                    }
                    if alpha >= beta {
                        if quiet {
                            self.killers.record(ply, mv);
                            self.history.reward(us, mv, depth);
                        }
                        break;
                    }
                }
            }
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt.store(
            key,
            depth.min(i32::from(u8::MAX)) as u8,
            score_to_tt(best_score, ply),
            bound,
            best_move,
        );
        Ok(best_score)
    }

    /// Captures and promotions until the position is quiet. In check every
    /// evasion is searched, since standing pat is not an option.
    fn quiescence(&mut self, pos: &mut Position, ply: usize, mut alpha: i32, beta: i32) -> SearchOutcome {
        self.tick()?;

        if pos.threefold_repetition() {
            return Ok(DRAW);
        }
        if ply >= MAX_PLY {
            return Ok(self.evaluator.evaluate(pos));
        }

        let in_check = pos.in_check();
        let mut best_score = -INF;
        if !in_check {
            let stand_pat = self.evaluator.evaluate(pos);
            if stand_pat >= beta {
                return Ok(stand_pat);
            }
            alpha = alpha.max(stand_pat);
            best_score = stand_pat;
        }

        let mode = if in_check { GenMode::All } else { GenMode::Captures };
        let moves = pos.generate_legal_moves(mode);
        if moves.is_empty() && in_check {
            return Ok(-MATE + ply as i32);
        }

        for mv in MovePicker::noisy(moves, pos) {
            let score = {
                let mut child = pos.scoped_move(mv);
                -self.quiescence(&mut child, ply + 1, -beta, -alpha)?
            };
            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    if alpha >= beta {
                        break;
                    }
                }
            }
        }
        Ok(best_score)
    }

    /// Count a node and, every few thousand nodes, consult the clock.
    #[inline]
    fn tick(&mut self) -> Result<(), Aborted> {
        self.nodes += 1;
        if TimeControl::should_check_time(self.nodes) && self.time.check_time() {
            return Err(Aborted);
        }
        Ok(())
    }

    /// Follow hash moves from the root, starting with `first`.
    fn principal_variation(&self, pos: &mut Position, first: Move, max_len: u8) -> Vec<Move> {
        let mut pv = vec![first];
        pos.make_move(first);
        while pv.len() < usize::from(max_len) {
            let Some(mv) = self.tt.best_move(pos.position_hash()) else {
                break;
            };
            if pos.threefold_repetition()
                || !pos.generate_legal_moves(GenMode::All).contains(&mv)
            {
                break;
            }
            pos.make_move(mv);
            pv.push(mv);
        }
        for &mv in pv.iter().rev() {
            pos.undo_move(mv);
        }
        pv
    }
}

pub fn nodes_per_second(nodes: u64, elapsed: Duration) -> u64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        (nodes as f64 / secs) as u64
    } else {
        0
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod search_tests;
