//! Pre-computed attack tables for move generation and attack detection.
//!
//! - Pawn (per color), knight and king attacks are plain per-square lookups.
//! - Bishop, rook and queen attacks are computed on demand from per-square
//!   line masks with the hyperbola quintessence bit trick.
//! - `between` and `line` tables drive pin detection and check evasion.
//!
//! [`AttackTables::new`] is a `const fn`, so the process-wide [`ATTACKS`]
//! instance is built at compile time and is immutable afterwards.

use crate::bitboard::Bitboard;
use crate::types::{Color, Piece, PieceKind, Square};

const RANK: usize = 0;
const FILE: usize = 1;
const DIAGONAL: usize = 2;
const ANTI_DIAGONAL: usize = 3;

/// (file step, rank step) for the eight ray directions.
const DIRECTIONS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Squares reached from `sq` stepping by (df, dr) until the board edge.
const fn ray(sq: Square, df: i8, dr: i8) -> u64 {
    let mut bb = 0u64;
    let mut f = (sq % 8) as i8 + df;
    let mut r = (sq / 8) as i8 + dr;
    while f >= 0 && f < 8 && r >= 0 && r < 8 {
        bb |= 1u64 << (r * 8 + f);
        f += df;
        r += dr;
    }
    bb
}

/// Jump-style attacks: the union of single steps that stay on the board.
const fn leaper(sq: Square, steps: &[(i8, i8)]) -> u64 {
    let mut bb = 0u64;
    let file = (sq % 8) as i8;
    let rank = (sq / 8) as i8;
    let mut i = 0;
    while i < steps.len() {
        let f = file + steps[i].0;
        let r = rank + steps[i].1;
        if f >= 0 && f < 8 && r >= 0 && r < 8 {
            bb |= 1u64 << (r * 8 + f);
        }
        i += 1;
    }
    bb
}

const KNIGHT_STEPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const WHITE_PAWN_STEPS: [(i8, i8); 2] = [(-1, 1), (1, 1)];
const BLACK_PAWN_STEPS: [(i8, i8); 2] = [(-1, -1), (1, -1)];

/// Hyperbola quintessence: attacks of a slider on `sq` along one line mask
/// (the mask excludes `sq` itself).
#[inline(always)]
const fn hyperbola(sq: Square, occupied: u64, mask: u64) -> u64 {
    let piece = 1u64 << sq;
    let o = occupied & mask;
    let forward = o.wrapping_sub(piece << 1);
    let backward = o
        .reverse_bits()
        .wrapping_sub(piece.reverse_bits() << 1)
        .reverse_bits();
    (forward ^ backward) & mask
}

/// Immutable attack lookup tables.
pub struct AttackTables {
    pawn: [[Bitboard; 64]; 2],
    knight: [Bitboard; 64],
    king: [Bitboard; 64],
    /// Rank, file, diagonal and anti-diagonal through each square, square excluded.
    lines: [[Bitboard; 4]; 64],
    between: [[Bitboard; 64]; 64],
    line: [[Bitboard; 64]; 64],
}

impl AttackTables {
    pub const fn new() -> Self {
        let mut pawn = [[Bitboard::EMPTY; 64]; 2];
        let mut knight = [Bitboard::EMPTY; 64];
        let mut king = [Bitboard::EMPTY; 64];
        let mut lines = [[Bitboard::EMPTY; 4]; 64];
        let mut between = [[Bitboard::EMPTY; 64]; 64];
        let mut line = [[Bitboard::EMPTY; 64]; 64];

        let mut sq = 0u8;
        while sq < 64 {
            let s = sq as usize;
            pawn[0][s] = Bitboard(leaper(sq, &WHITE_PAWN_STEPS));
            pawn[1][s] = Bitboard(leaper(sq, &BLACK_PAWN_STEPS));
            knight[s] = Bitboard(leaper(sq, &KNIGHT_STEPS));
            king[s] = Bitboard(leaper(sq, &DIRECTIONS));

            lines[s][RANK] = Bitboard(ray(sq, 1, 0) | ray(sq, -1, 0));
            lines[s][FILE] = Bitboard(ray(sq, 0, 1) | ray(sq, 0, -1));
            lines[s][DIAGONAL] = Bitboard(ray(sq, 1, 1) | ray(sq, -1, -1));
            lines[s][ANTI_DIAGONAL] = Bitboard(ray(sq, -1, 1) | ray(sq, 1, -1));

            let mut d = 0;
            while d < 8 {
                let (df, dr) = DIRECTIONS[d];
                let full = ray(sq, df, dr) | ray(sq, -df, -dr) | (1u64 << sq);
                let mut acc = 0u64;
                let mut f = (sq % 8) as i8 + df;
                let mut r = (sq / 8) as i8 + dr;
                while f >= 0 && f < 8 && r >= 0 && r < 8 {
                    let to = (r * 8 + f) as usize;
                    between[s][to] = Bitboard(acc);
                    line[s][to] = Bitboard(full);
                    acc |= 1u64 << to;
                    f += df;
                    r += dr;
                }
                d += 1;
            }

            sq += 1;
        }

        Self {
            pawn,
            knight,
            king,
            lines,
            between,
            line,
        }
    }

    /// Squares a pawn of `color` on `sq` attacks.
    #[inline(always)]
    pub fn pawn(&self, color: Color, sq: Square) -> Bitboard {
        self.pawn[color.idx()][sq as usize]
    }

    #[inline(always)]
    pub fn knight(&self, sq: Square) -> Bitboard {
        self.knight[sq as usize]
    }

    #[inline(always)]
    pub fn king(&self, sq: Square) -> Bitboard {
        self.king[sq as usize]
    }

    #[inline(always)]
    pub fn bishop(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let lines = &self.lines[sq as usize];
        Bitboard(
            hyperbola(sq, occupied.0, lines[DIAGONAL].0)
                | hyperbola(sq, occupied.0, lines[ANTI_DIAGONAL].0),
        )
    }

    #[inline(always)]
    pub fn rook(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let lines = &self.lines[sq as usize];
        Bitboard(hyperbola(sq, occupied.0, lines[RANK].0) | hyperbola(sq, occupied.0, lines[FILE].0))
    }

    #[inline(always)]
    pub fn queen(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.bishop(sq, occupied) | self.rook(sq, occupied)
    }

    /// Attacks of any piece standing on `sq`.
    pub fn piece(&self, piece: Piece, sq: Square, occupied: Bitboard) -> Bitboard {
        match piece.kind {
            PieceKind::Pawn => self.pawn(piece.color, sq),
            PieceKind::Knight => self.knight(sq),
            PieceKind::Bishop => self.bishop(sq, occupied),
            PieceKind::Rook => self.rook(sq, occupied),
            PieceKind::Queen => self.queen(sq, occupied),
            PieceKind::King => self.king(sq),
        }
    }

    /// Squares strictly between two aligned squares; empty otherwise.
    #[inline(always)]
    pub fn between(&self, a: Square, b: Square) -> Bitboard {
        self.between[a as usize][b as usize]
    }

    /// The whole line through two aligned squares, both included; empty otherwise.
    #[inline(always)]
    pub fn line(&self, a: Square, b: Square) -> Bitboard {
        self.line[a as usize][b as usize]
    }
}

impl Default for AttackTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide attack tables, computed at compile time.
pub static ATTACKS: AttackTables = AttackTables::new();

#[cfg(test)]
#[path = "attacks_tests.rs"]
mod attacks_tests;
