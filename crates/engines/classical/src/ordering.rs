//! Move ordering: hash move, captures, promotions, killers, then history.

use chess_core::{Color, Move, MoveKind, MoveList, PieceKind, Position, MAX_MOVES};

use crate::search::MAX_PLY;

const HASH_MOVE_SCORE: i32 = i32::MAX;
const CAPTURE_BASE: i32 = 1 << 28;
const PROMOTION_BASE: i32 = 1 << 27;
const KILLER_SCORES: [i32; 2] = [1 << 26, (1 << 26) - 1];

/// History scores are halved once any entry reaches this, which keeps them
/// below the killer band.
const HISTORY_LIMIT: i32 = 1 << 24;

/// Quiet moves that caused a beta cutoff, two per ply.
#[derive(Clone)]
pub struct KillerTable {
    slots: [[Move; 2]; MAX_PLY],
}

impl KillerTable {
    pub fn new() -> Self {
        Self {
            slots: [[Move::NULL; 2]; MAX_PLY],
        }
    }

    #[inline]
    pub fn get(&self, ply: usize) -> [Move; 2] {
        self.slots[ply]
    }

    pub fn record(&mut self, ply: usize, mv: Move) {
        let slot = &mut self.slots[ply];
        if slot[0] != mv {
            slot[1] = slot[0];
            slot[0] = mv;
        }
    }

    pub fn clear(&mut self) {
        self.slots = [[Move::NULL; 2]; MAX_PLY];
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Cutoff counts per color, origin and destination.
#[derive(Clone)]
pub struct HistoryTable {
    scores: [[[i32; 64]; 64]; 2],
}

impl HistoryTable {
    pub fn new() -> Self {
        Self {
            scores: [[[0; 64]; 64]; 2],
        }
    }

    #[inline]
    pub fn get(&self, color: Color, mv: Move) -> i32 {
        self.scores[color.idx()][mv.from() as usize][mv.to() as usize]
    }

    pub fn reward(&mut self, color: Color, mv: Move, depth: i32) {
        let entry = &mut self.scores[color.idx()][mv.from() as usize][mv.to() as usize];
        *entry += depth * depth;
        if *entry >= HISTORY_LIMIT {
            self.age();
        }
    }

    fn age(&mut self) {
        for v in self.scores.iter_mut().flatten().flatten() {
            *v /= 2;
        }
    }

    pub fn clear(&mut self) {
        self.scores = [[[0; 64]; 64]; 2];
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new()
    }
}

/// MVV-LVA: most valuable victim first, cheapest attacker breaks ties.
fn capture_score(pos: &Position, mv: Move) -> i32 {
    let victim = match mv.kind() {
        MoveKind::EnPassant => PieceKind::Pawn,
        _ => pos.piece_at(mv.to()).map_or(PieceKind::Pawn, |p| p.kind),
    };
    let attacker = pos.piece_at(mv.from()).map_or(PieceKind::Pawn, |p| p.kind);
    CAPTURE_BASE + 8 * victim.idx() as i32 + (5 - attacker.idx() as i32)
}

/// Hands out moves best-first by selection over precomputed scores.
pub struct MovePicker {
    moves: MoveList,
    scores: [i32; MAX_MOVES],
    next: usize,
}

impl MovePicker {
    /// Full ordering for interior nodes.
    pub fn new(
        moves: MoveList,
        pos: &Position,
        hash_move: Move,
        killers: [Move; 2],
        history: &HistoryTable,
    ) -> Self {
        let us = pos.side_to_move();
        let mut scores = [0; MAX_MOVES];
        for (score, &mv) in scores.iter_mut().zip(moves.iter()) {
            *score = if mv == hash_move {
                HASH_MOVE_SCORE
            } else if pos.is_capture(mv) {
                capture_score(pos, mv) + promotion_bonus(mv)
            } else if mv.is_promotion() {
                PROMOTION_BASE + promotion_bonus(mv)
            } else if mv == killers[0] {
                KILLER_SCORES[0]
            } else if mv == killers[1] {
                KILLER_SCORES[1]
            } else {
                history.get(us, mv)
            };
        }
        Self {
            moves,
            scores,
            next: 0,
        }
    }

    /// Captures and promotions only, as searched by quiescence.
    pub fn noisy(moves: MoveList, pos: &Position) -> Self {
        let mut scores = [0; MAX_MOVES];
        for (score, &mv) in scores.iter_mut().zip(moves.iter()) {
            *score = if pos.is_capture(mv) {
                capture_score(pos, mv) + promotion_bonus(mv)
            } else if mv.is_promotion() {
                PROMOTION_BASE + promotion_bonus(mv)
            } else {
                0
            };
        }
        Self {
            moves,
            scores,
            next: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

impl Iterator for MovePicker {
    type Item = Move;

    fn next(&mut self) -> Option<Move> {
        let len = self.moves.len();
        if self.next >= len {
            return None;
        }
        let mut best = self.next;
        for i in self.next + 1..len {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.swap(self.next, best);
        self.scores.swap(self.next, best);
        let mv = self.moves[self.next];
        self.next += 1;
        Some(mv)
    }
}

#[inline]
fn promotion_bonus(mv: Move) -> i32 {
    mv.promotion().map_or(0, |k| k.idx() as i32)
}

#[cfg(test)]
#[path = "ordering_tests.rs"]
mod ordering_tests;
