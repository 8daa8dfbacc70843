//! Transposition table for caching search results.
//!
//! Direct-mapped: each hash maps to exactly one slot, `hash & (len - 1)`,
//! and a store always replaces whatever the slot held. Probes only trust
//! entries whose full key matches.

use chess_core::Move;

use crate::search::{MATE, MAX_PLY};

/// How the stored score relates to the true score of the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    /// The search completed inside the window.
    Exact,
    /// Failed high: true score >= stored score.
    Lower,
    /// Failed low: true score <= stored score.
    Upper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    pub key: u64,
    pub depth: u8,
    /// Mate scores are stored relative to this node, see [`score_to_tt`].
    pub score: i32,
    pub bound: Bound,
    /// `Move::NULL` when no move raised the score.
    pub best_move: Move,
}

pub struct TranspositionTable {
    entries: Vec<Option<TtEntry>>,
    mask: usize,
}

impl TranspositionTable {
    /// A table with `1 << size_log2` entries.
    pub fn new(size_log2: u32) -> Self {
        let len = 1usize << size_log2;
        Self {
            entries: vec![None; len],
            mask: len - 1,
        }
    }

    /// The largest power-of-two table that fits in `mb` megabytes, but never
    /// fewer than 1024 entries.
    pub fn with_megabytes(mb: usize) -> Self {
        let entry_size = std::mem::size_of::<Option<TtEntry>>();
        let fits = (mb * 1024 * 1024 / entry_size).max(1024);
        Self::new(usize::BITS - 1 - fits.leading_zeros())
    }

    #[inline]
    fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    #[inline]
    pub fn probe(&self, key: u64) -> Option<TtEntry> {
        self.entries[self.index(key)].filter(|e| e.key == key)
    }

    /// Best move stored for `key`, if any.
    #[inline]
    pub fn best_move(&self, key: u64) -> Option<Move> {
        self.probe(key)
            .map(|e| e.best_move)
            .filter(|m| !m.is_null())
    }

    pub fn store(&mut self, key: u64, depth: u8, score: i32, bound: Bound, best_move: Move) {
        let idx = self.index(key);
        self.entries[idx] = Some(TtEntry {
            key,
            depth,
            score,
            bound,
            best_move,
        });
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Occupied slots among the first thousand, in permille.
    pub fn hashfull(&self) -> usize {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample].iter().filter(|e| e.is_some()).count();
        used * 1000 / sample
    }
}

/// Mate scores count plies from the root; in the table they count from the
/// node that stored them, so a hit at another ply still reports the right
/// distance.
#[inline]
pub fn score_to_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score >= MATE - MAX_PLY as i32 {
        score + ply
    } else if score <= -(MATE - MAX_PLY as i32) {
        score - ply
    } else {
        score
    }
}

#[inline]
pub fn score_from_tt(score: i32, ply: usize) -> i32 {
    let ply = ply as i32;
    if score >= MATE - MAX_PLY as i32 {
        score - ply
    } else if score <= -(MATE - MAX_PLY as i32) {
        score + ply
    } else {
        score
    }
}

#[cfg(test)]
#[path = "tt_tests.rs"]
mod tt_tests;
