//! Zobrist hashing for chess positions.
//!
//! The position hash is the XOR of random keys for:
//! - each piece on each square (12 pieces × 64 squares)
//! - black to move
//! - each held castling right (4 keys)
//! - the file of the en-passant target, when one is set (8 keys)
//!
//! Move counters are not part of the hash. Keys come from a fixed-seed
//! xorshift generator run in a `const fn`, so [`HASH_KEYS`] is identical on
//! every run and every platform.

use crate::board::CastlingRights;
use crate::types::{Piece, Square, file_of};

/// Random keys for the incremental position hash.
pub struct HashKeys {
    /// Indexed by [color][piece_kind][square].
    pieces: [[[u64; 64]; 6]; 2],
    black_to_move: u64,
    /// One key per castling flag, in bit order (WK, WQ, BK, BQ).
    castling: [u64; 4],
    en_passant: [u64; 8],
}

impl Default for HashKeys {
    fn default() -> Self {
        Self::new()
    }
}

impl HashKeys {
    pub const fn new() -> Self {
        const fn xorshift64(mut state: u64) -> u64 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        }

        let mut state = 0xBEEF_0000_0000_BEEFu64;

        let mut pieces = [[[0u64; 64]; 6]; 2];
        let mut color = 0;
        while color < 2 {
            let mut kind = 0;
            while kind < 6 {
                let mut sq = 0;
                while sq < 64 {
                    state = xorshift64(state);
                    pieces[color][kind][sq] = state;
                    sq += 1;
                }
                kind += 1;
            }
            color += 1;
        }

        state = xorshift64(state);
        let black_to_move = state;

        let mut castling = [0u64; 4];
        let mut i = 0;
        while i < 4 {
            state = xorshift64(state);
            castling[i] = state;
            i += 1;
        }

        let mut en_passant = [0u64; 8];
        let mut i = 0;
        while i < 8 {
            state = xorshift64(state);
            en_passant[i] = state;
            i += 1;
        }

        HashKeys {
            pieces,
            black_to_move,
            castling,
            en_passant,
        }
    }

    #[inline(always)]
    pub fn piece(&self, piece: Piece, sq: Square) -> u64 {
        self.pieces[piece.color.idx()][piece.kind.idx()][sq as usize]
    }

    #[inline(always)]
    pub fn black_to_move(&self) -> u64 {
        self.black_to_move
    }

    /// Combined key of every flag held in `rights`.
    #[inline]
    pub fn castling(&self, rights: CastlingRights) -> u64 {
        let bits = rights.bits();
        let mut key = 0;
        for (i, k) in self.castling.iter().enumerate() {
            if bits & (1 << i) != 0 {
                key ^= k;
            }
        }
        key
    }

    /// Key for an en-passant target square (only its file matters).
    #[inline(always)]
    pub fn en_passant(&self, sq: Square) -> u64 {
        self.en_passant[file_of(sq) as usize]
    }
}

/// Process-wide hash keys, computed at compile time.
pub static HASH_KEYS: HashKeys = HashKeys::new();

#[cfg(test)]
#[path = "zobrist_tests.rs"]
mod zobrist_tests;
