//! Legal move generation.
//!
//! Check and pin information cached on the position lets the generator emit
//! legal moves directly: king moves avoid attacked squares, other pieces are
//! confined to the check-evasion masks, and pinned sliders stay on their pin
//! line. Pawn moves and en passant go through [`Position::is_legal`] before
//! they are emitted.

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::bitboard::Bitboard;
use crate::board::{CastlingRights, Position, en_passant_victim};
use crate::types::*;

/// More than the 218 moves of the richest known legal position.
pub const MAX_MOVES: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenMode {
    All,
    /// Captures, en passant and promotions. Castling is never included.
    Captures,
}

/// Fixed-capacity move buffer living on the stack.
#[derive(Clone)]
pub struct MoveList {
    moves: [Move; MAX_MOVES],
    len: usize,
}

impl MoveList {
    pub const fn new() -> Self {
        Self {
            moves: [Move::NULL; MAX_MOVES],
            len: 0,
        }
    }

    #[inline(always)]
    pub fn push(&mut self, mv: Move) {
        debug_assert!(self.len < MAX_MOVES, "move list overflow");
        self.moves[self.len] = mv;
        self.len += 1;
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn retain(&mut self, mut keep: impl FnMut(Move) -> bool) {
        let mut kept = 0;
        for i in 0..self.len {
            let mv = self.moves[i];
            if keep(mv) {
                self.moves[kept] = mv;
                kept += 1;
            }
        }
        self.len = kept;
    }
}

impl Default for MoveList {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for MoveList {
    type Target = [Move];

    fn deref(&self) -> &[Move] {
        &self.moves[..self.len]
    }
}

impl DerefMut for MoveList {
    fn deref_mut(&mut self) -> &mut [Move] {
        &mut self.moves[..self.len]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for MoveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|m| m.to_string())).finish()
    }
}

const PROMOTIONS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

/// Origin square of a pawn that reached `to` by stepping `delta`.
#[inline(always)]
fn origin(to: Square, delta: i8) -> Square {
    (to as i8 - delta) as Square
}

impl Position {
    /// Every legal move for the side to move. Empty on mate or stalemate.
    pub fn generate_legal_moves(&self, mode: GenMode) -> MoveList {
        let mut list = MoveList::new();
        self.generate_into(mode, &mut list);
        list
    }

    fn generate_into(&self, mode: GenMode, list: &mut MoveList) {
        let us = self.side_to_move();
        let them = us.other();
        let a = self.attack_tables();
        let own = self.all_pieces(us);
        let enemy = self.all_pieces(them);
        let occupied = own | enemy;
        let ksq = self.king_square(us);

        // The king must not hide behind itself from a slider.
        let attacked = self.attacked_by(them, occupied ^ Bitboard::from_square(ksq));

        let mut king_targets = a.king(ksq) & !own & !attacked;
        if mode == GenMode::Captures {
            king_targets &= enemy;
        }
        for to in king_targets {
            list.push(Move::normal(ksq, to));
        }

        let checkers = self.checkers();
        if checkers.more_than_one() {
            return;
        }

        // noisy: squares a capture may land on; block: empty squares a
        // non-king move may land on.
        let (noisy, block) = match checkers.lsb() {
            Some(checker) => (checkers, a.between(ksq, checker)),
            None => (enemy, !occupied),
        };
        let quiet = match mode {
            GenMode::All => block,
            GenMode::Captures => Bitboard::EMPTY,
        };

        self.generate_pawn_moves(list, noisy, quiet, block);

        let pinned = self.pinned_pieces();
        for from in self.pieces(us, PieceKind::Knight) & !pinned {
            for to in a.knight(from) & (noisy | quiet) {
                list.push(Move::normal(from, to));
            }
        }

        for kind in [PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen] {
            for from in self.pieces(us, kind) {
                let mut targets = a.piece(Piece::new(us, kind), from, occupied) & (noisy | quiet);
                if pinned.contains(from) {
                    targets &= a.line(ksq, from);
                }
                for to in targets {
                    list.push(Move::normal(from, to));
                }
            }
        }

        if mode == GenMode::All && checkers.is_empty() {
            self.generate_castles(list, attacked);
        }
    }

    fn generate_pawn_moves(
        &self,
        list: &mut MoveList,
        noisy: Bitboard,
        quiet: Bitboard,
        block: Bitboard,
    ) {
        let us = self.side_to_move();
        let pawns = self.pieces(us, PieceKind::Pawn);
        if pawns.is_empty() {
            return;
        }
        let empty = !self.occupied();
        let (last_rank, double_rank, push, west, east) = match us {
            Color::White => (Bitboard::RANK_8, Bitboard::RANK_3, 8, 7, 9),
            Color::Black => (Bitboard::RANK_1, Bitboard::RANK_6, -8, -9, -7),
        };

        let single = pawns.forward(us) & empty;
        let double = (single & double_rank).forward(us) & empty & quiet;

        for to in single & quiet & !last_rank {
            self.push_if_legal(list, Move::normal(origin(to, push), to));
        }
        for to in double {
            self.push_if_legal(list, Move::normal(origin(to, 2 * push), to));
        }
        // Promotions count as noisy, so pushes onto the last rank are
        // gated by `block` in both modes.
        for to in single & block & last_rank {
            self.push_promotions(list, origin(to, push), to);
        }

        for (targets, delta) in [
            (pawns.forward_west(us) & noisy, west),
            (pawns.forward_east(us) & noisy, east),
        ] {
            for to in targets {
                let from = origin(to, delta);
                if last_rank.contains(to) {
                    self.push_promotions(list, from, to);
                } else {
                    self.push_if_legal(list, Move::normal(from, to));
                }
            }
        }

        if let Some(ep) = self.en_passant() {
            let victim = en_passant_victim(ep, us);
            if noisy.contains(victim) || block.contains(ep) {
                let a = self.attack_tables();
                for from in a.pawn(us.other(), ep) & pawns {
                    self.push_if_legal(list, Move::new(from, ep, MoveKind::EnPassant));
                }
            }
        }
    }

    #[inline(always)]
    fn push_if_legal(&self, list: &mut MoveList, mv: Move) {
        if self.is_legal(mv) {
            list.push(mv);
        }
    }

    fn push_promotions(&self, list: &mut MoveList, from: Square, to: Square) {
        if !self.is_legal(Move::normal(from, to)) {
            return;
        }
        for kind in PROMOTIONS {
            list.push(Move::new(from, to, MoveKind::Promotion(kind)));
        }
    }

    fn generate_castles(&self, list: &mut MoveList, attacked: Bitboard) {
        let us = self.side_to_move();
        let rights = self.castling_rights();
        let occupied = self.occupied();
        let king_from: Square = match us {
            Color::White => 4,
            Color::Black => 60,
        };

        if rights.contains(CastlingRights::king_side(us)) {
            let path = Bitboard::from_square(king_from + 1) | Bitboard::from_square(king_from + 2);
            if (path & (occupied | attacked)).is_empty() {
                list.push(Move::new(king_from, king_from + 2, MoveKind::Castle));
            }
        }
        if rights.contains(CastlingRights::queen_side(us)) {
            let transit =
                Bitboard::from_square(king_from - 1) | Bitboard::from_square(king_from - 2);
            let between = transit | Bitboard::from_square(king_from - 3);
            if (between & occupied).is_empty() && (transit & attacked).is_empty() {
                list.push(Move::new(king_from, king_from - 2, MoveKind::Castle));
            }
        }
    }

    /// Every square `color` attacks, given `occupied`.
    fn attacked_by(&self, color: Color, occupied: Bitboard) -> Bitboard {
        let a = self.attack_tables();
        let pawns = self.pieces(color, PieceKind::Pawn);
        let mut attacked = pawns.forward_west(color) | pawns.forward_east(color);
        for sq in self.pieces(color, PieceKind::Knight) {
            attacked |= a.knight(sq);
        }
        for sq in self.diagonal_sliders(color) {
            attacked |= a.bishop(sq, occupied);
        }
        for sq in self.orthogonal_sliders(color) {
            attacked |= a.rook(sq, occupied);
        }
        attacked | a.king(self.king_square(color))
    }

    /// Whether a pseudo-legal move keeps the mover's king safe.
    ///
    /// Generated moves already satisfy this; the generator calls it for pawn
    /// moves, whose pins it does not resolve in bulk, and for en passant,
    /// where two pawns leave the same rank at once.
    pub fn is_legal(&self, mv: Move) -> bool {
        let us = self.side_to_move();
        let them = us.other();
        let a = self.attack_tables();
        let ksq = self.king_square(us);
        let (from, to) = (mv.from(), mv.to());
        let checkers = self.checkers();

        match mv.kind() {
            MoveKind::EnPassant => {
                let victim = en_passant_victim(to, us);
                let sliders = self.orthogonal_sliders(them) | self.diagonal_sliders(them);
                if (checkers & !sliders & !Bitboard::from_square(victim)).is_nonempty() {
                    return false;
                }
                let occupied = (self.occupied()
                    ^ Bitboard::from_square(from)
                    ^ Bitboard::from_square(victim))
                    | Bitboard::from_square(to);
                (a.rook(ksq, occupied) & self.orthogonal_sliders(them)).is_empty()
                    && (a.bishop(ksq, occupied) & self.diagonal_sliders(them)).is_empty()
            }
            MoveKind::Castle => true,
            _ if from == ksq => {
                let occupied = self.occupied() ^ Bitboard::from_square(from);
                (self.attackers_to(to, occupied) & self.all_pieces(them)).is_empty()
            }
            _ => {
                if checkers.more_than_one() {
                    return false;
                }
                if let Some(checker) = checkers.lsb() {
                    let evasions = checkers | a.between(ksq, checker);
                    if !evasions.contains(to) {
                        return false;
                    }
                }
                !self.pinned_pieces().contains(from) || a.line(ksq, from).contains(to)
            }
        }
    }
}

/// All legal moves, collected into a vector.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    pos.generate_legal_moves(GenMode::All).to_vec()
}

#[cfg(test)]
#[path = "movegen_tests.rs"]
mod movegen_tests;
