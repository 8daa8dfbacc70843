//! Bitboard position model with reversible move application.
//!
//! A [`Position`] keeps a 64-square mailbox and per-color, per-kind
//! bitboards in sync, maintains the position hash incrementally, and caches
//! the checkers and pinned pieces of the side to move. Every `make_*` pushes
//! one [`StateRecord`] that the matching `undo_*` pops, so a position can be
//! walked through a whole search tree in place.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::attacks::{ATTACKS, AttackTables};
use crate::bitboard::Bitboard;
use crate::nnue::{Accumulator, AccumulatorStack, Network};
use crate::types::*;
use crate::zobrist::{HASH_KEYS, HashKeys};

/// The four castling flags as a 4-bit set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const WHITE_KING_SIDE: CastlingRights = CastlingRights(1);
    pub const WHITE_QUEEN_SIDE: CastlingRights = CastlingRights(2);
    pub const BLACK_KING_SIDE: CastlingRights = CastlingRights(4);
    pub const BLACK_QUEEN_SIDE: CastlingRights = CastlingRights(8);
    pub const ALL: CastlingRights = CastlingRights(15);

    #[inline(always)]
    pub const fn from_bits(bits: u8) -> Self {
        CastlingRights(bits & 15)
    }

    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline(always)]
    pub const fn contains(self, other: CastlingRights) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline(always)]
    pub const fn union(self, other: CastlingRights) -> CastlingRights {
        CastlingRights(self.0 | other.0)
    }

    #[inline(always)]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub fn insert(&mut self, other: CastlingRights) {
        self.0 |= other.0;
    }

    #[inline(always)]
    pub fn remove(&mut self, other: CastlingRights) {
        self.0 &= !other.0;
    }

    pub const fn king_side(color: Color) -> CastlingRights {
        match color {
            Color::White => Self::WHITE_KING_SIDE,
            Color::Black => Self::BLACK_KING_SIDE,
        }
    }

    pub const fn queen_side(color: Color) -> CastlingRights {
        match color {
            Color::White => Self::WHITE_QUEEN_SIDE,
            Color::Black => Self::BLACK_QUEEN_SIDE,
        }
    }
}

/// FEN castling field: `KQkq` subset or `-`.
impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        for (flag, c) in [
            (Self::WHITE_KING_SIDE, 'K'),
            (Self::WHITE_QUEEN_SIDE, 'Q'),
            (Self::BLACK_KING_SIDE, 'k'),
            (Self::BLACK_QUEEN_SIDE, 'q'),
        ] {
            if self.contains(flag) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

/// Rights that survive a move from or to each square.
const CASTLING_MASK: [u8; 64] = {
    let mut mask = [15u8; 64];
    mask[0] = 15 & !2; // a1
    mask[4] = 15 & !3; // e1
    mask[7] = 15 & !1; // h1
    mask[56] = 15 & !8; // a8
    mask[60] = 15 & !12; // e8
    mask[63] = 15 & !4; // h8
    mask
};

/// Rook (from, to) for a castle, given the king's destination.
#[inline(always)]
pub(crate) const fn castle_rook_squares(king_to: Square) -> (Square, Square) {
    if file_of(king_to) == 6 {
        (king_to + 1, king_to - 1)
    } else {
        (king_to - 2, king_to + 1)
    }
}

/// Square of the pawn removed by an en-passant capture landing on `to`.
#[inline(always)]
pub(crate) const fn en_passant_victim(to: Square, mover: Color) -> Square {
    match mover {
        Color::White => to - 8,
        Color::Black => to + 8,
    }
}

/// Everything a move destroys, saved so undo can restore it bit for bit.
#[derive(Clone, Copy, Debug)]
struct StateRecord {
    captured: Option<Piece>,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    hash: u64,
    checkers: Bitboard,
    pinned: Bitboard,
}

#[derive(Clone)]
pub struct Position {
    squares: [Option<Piece>; 64],
    pieces: [[Bitboard; 6]; 2],
    colors: [Bitboard; 2],
    side_to_move: Color,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    hash: u64,
    checkers: Bitboard,
    pinned: Bitboard,
    /// One record per ply made on this position, oldest first.
    history: Vec<StateRecord>,
    nnue: Option<AccumulatorStack>,
    attacks: &'static AttackTables,
    keys: &'static HashKeys,
}

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

impl Position {
    /// An empty board wired to the given tables. Callers must place both
    /// kings and call [`Position::finish_setup`] before use.
    pub(crate) fn empty(attacks: &'static AttackTables, keys: &'static HashKeys) -> Self {
        Position {
            squares: [None; 64],
            pieces: [[Bitboard::EMPTY; 6]; 2],
            colors: [Bitboard::EMPTY; 2],
            side_to_move: Color::White,
            castling: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            checkers: Bitboard::EMPTY,
            pinned: Bitboard::EMPTY,
            history: Vec::with_capacity(256),
            nnue: None,
            attacks,
            keys,
        }
    }

    pub fn startpos() -> Self {
        Self::startpos_with(&ATTACKS, &HASH_KEYS)
    }

    /// Start position using caller-supplied tables.
    pub fn startpos_with(attacks: &'static AttackTables, keys: &'static HashKeys) -> Self {
        let mut p = Self::empty(attacks, keys);
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (f, &kind) in back.iter().enumerate() {
            let f = f as Square;
            p.place(Piece::new(Color::White, kind), f);
            p.place(Piece::new(Color::Black, kind), 56 + f);
            p.place(Piece::new(Color::White, PieceKind::Pawn), 8 + f);
            p.place(Piece::new(Color::Black, PieceKind::Pawn), 48 + f);
        }
        p.castling = CastlingRights::ALL;
        p.finish_setup();
        p
    }

    pub(crate) fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    pub(crate) fn set_castling(&mut self, rights: CastlingRights) {
        self.castling = rights;
    }

    pub(crate) fn set_en_passant(&mut self, sq: Option<Square>) {
        self.en_passant = sq;
    }

    pub(crate) fn set_counters(&mut self, halfmove_clock: u32, fullmove_number: u32) {
        self.halfmove_clock = halfmove_clock;
        self.fullmove_number = fullmove_number;
    }

    /// Derive hash and check info once placement and flags are in place.
    pub(crate) fn finish_setup(&mut self) {
        self.hash = self.compute_hash();
        self.history.clear();
        self.refresh_check_info();
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[inline(always)]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq as usize]
    }

    #[inline(always)]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    #[inline(always)]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline(always)]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline(always)]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    #[inline(always)]
    pub fn position_hash(&self) -> u64 {
        self.hash
    }

    #[inline(always)]
    pub fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[color.idx()][kind.idx()]
    }

    #[inline(always)]
    pub fn all_pieces(&self, color: Color) -> Bitboard {
        self.colors[color.idx()]
    }

    #[inline(always)]
    pub fn occupied(&self) -> Bitboard {
        self.colors[0] | self.colors[1]
    }

    /// Rooks and queens of `color`.
    #[inline(always)]
    pub fn orthogonal_sliders(&self, color: Color) -> Bitboard {
        let p = &self.pieces[color.idx()];
        p[PieceKind::Rook.idx()] | p[PieceKind::Queen.idx()]
    }

    /// Bishops and queens of `color`.
    #[inline(always)]
    pub fn diagonal_sliders(&self, color: Color) -> Bitboard {
        let p = &self.pieces[color.idx()];
        p[PieceKind::Bishop.idx()] | p[PieceKind::Queen.idx()]
    }

    #[inline(always)]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces(color, PieceKind::King)
            .lsb()
            .expect("position has no king")
    }

    /// Enemy pieces giving check to the side to move.
    #[inline(always)]
    pub fn checkers(&self) -> Bitboard {
        self.checkers
    }

    /// Pieces of the side to move pinned to their own king.
    #[inline(always)]
    pub fn pinned_pieces(&self) -> Bitboard {
        self.pinned
    }

    #[inline(always)]
    pub fn in_check(&self) -> bool {
        self.checkers.is_nonempty()
    }

    #[inline(always)]
    pub fn attack_tables(&self) -> &'static AttackTables {
        self.attacks
    }

    #[inline]
    pub fn is_capture(&self, mv: Move) -> bool {
        mv.kind() == MoveKind::EnPassant || self.squares[mv.to() as usize].is_some()
    }

    /// Anything besides pawns and the king. Guards null-move pruning.
    #[inline]
    pub fn has_non_pawn_material(&self, color: Color) -> bool {
        let p = &self.pieces[color.idx()];
        (self.colors[color.idx()] & !p[PieceKind::Pawn.idx()] & !p[PieceKind::King.idx()])
            .is_nonempty()
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// True once the current position has occurred three times.
    ///
    /// Only plies since the last capture or pawn move can repeat, so the
    /// scan stops at the halfmove clock.
    pub fn threefold_repetition(&self) -> bool {
        let mut count = 1;
        for record in self
            .history
            .iter()
            .rev()
            .take(self.halfmove_clock as usize)
        {
            if record.hash == self.hash {
                count += 1;
                if count >= 3 {
                    return true;
                }
            }
        }
        false
    }

    /// Number of plies made since setup.
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    // -------------------------------------------------------------------------
    // Attack queries
    // -------------------------------------------------------------------------

    /// Pieces of both colors attacking `sq` given `occupied`.
    pub fn attackers_to(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        let a = self.attacks;
        let knights = self.pieces(Color::White, PieceKind::Knight)
            | self.pieces(Color::Black, PieceKind::Knight);
        let kings =
            self.pieces(Color::White, PieceKind::King) | self.pieces(Color::Black, PieceKind::King);
        let diagonal = self.diagonal_sliders(Color::White) | self.diagonal_sliders(Color::Black);
        let orthogonal =
            self.orthogonal_sliders(Color::White) | self.orthogonal_sliders(Color::Black);

        (a.pawn(Color::White, sq) & self.pieces(Color::Black, PieceKind::Pawn))
            | (a.pawn(Color::Black, sq) & self.pieces(Color::White, PieceKind::Pawn))
            | (a.knight(sq) & knights)
            | (a.king(sq) & kings)
            | (a.bishop(sq, occupied) & diagonal)
            | (a.rook(sq, occupied) & orthogonal)
    }

    pub fn is_square_attacked(&self, sq: Square, by: Color) -> bool {
        (self.attackers_to(sq, self.occupied()) & self.all_pieces(by)).is_nonempty()
    }

    fn compute_pinned(&self, us: Color) -> Bitboard {
        let them = us.other();
        let ksq = self.king_square(us);
        let a = self.attacks;
        let enemy = self.all_pieces(them);
        let snipers = (a.rook(ksq, enemy) & self.orthogonal_sliders(them))
            | (a.bishop(ksq, enemy) & self.diagonal_sliders(them));

        let occupied = self.occupied();
        let mut pinned = Bitboard::EMPTY;
        for sniper in snipers {
            let blockers = a.between(ksq, sniper) & occupied;
            if blockers.popcount() == 1 {
                pinned |= blockers & self.all_pieces(us);
            }
        }
        pinned
    }

    fn refresh_check_info(&mut self) {
        let us = self.side_to_move;
        let ksq = self.king_square(us);
        self.checkers = self.attackers_to(ksq, self.occupied()) & self.all_pieces(us.other());
        self.pinned = self.compute_pinned(us);
    }

    /// Hash of the current placement, side, castling rights and en-passant
    /// target, computed from scratch.
    pub fn compute_hash(&self) -> u64 {
        let mut hash = 0u64;
        for sq in self.occupied() {
            if let Some(piece) = self.squares[sq as usize] {
                hash ^= self.keys.piece(piece, sq);
            }
        }
        if self.side_to_move == Color::Black {
            hash ^= self.keys.black_to_move();
        }
        hash ^= self.keys.castling(self.castling);
        if let Some(ep) = self.en_passant {
            hash ^= self.keys.en_passant(ep);
        }
        hash
    }

    // -------------------------------------------------------------------------
    // Piece placement primitives
    // -------------------------------------------------------------------------

    #[inline(always)]
    pub(crate) fn place(&mut self, piece: Piece, sq: Square) {
        self.squares[sq as usize] = Some(piece);
        self.pieces[piece.color.idx()][piece.kind.idx()].set(sq);
        self.colors[piece.color.idx()].set(sq);
    }

    #[inline(always)]
    fn lift(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.squares[sq as usize].take()?;
        self.pieces[piece.color.idx()][piece.kind.idx()].clear(sq);
        self.colors[piece.color.idx()].clear(sq);
        Some(piece)
    }

    /// `place` plus hash and accumulator bookkeeping.
    #[inline(always)]
    fn add_piece(&mut self, piece: Piece, sq: Square) {
        self.place(piece, sq);
        self.hash ^= self.keys.piece(piece, sq);
        if let Some(nnue) = &mut self.nnue {
            nnue.add(piece, sq);
        }
    }

    /// `lift` plus hash and accumulator bookkeeping.
    #[inline(always)]
    fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        let piece = self.lift(sq)?;
        self.hash ^= self.keys.piece(piece, sq);
        if let Some(nnue) = &mut self.nnue {
            nnue.remove(piece, sq);
        }
        Some(piece)
    }

    #[inline(always)]
    fn move_piece(&mut self, from: Square, to: Square) {
        if let Some(piece) = self.remove_piece(from) {
            self.add_piece(piece, to);
        }
    }

    fn push_record(&mut self, captured: Option<Piece>) {
        self.history.push(StateRecord {
            captured,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            hash: self.hash,
            checkers: self.checkers,
            pinned: self.pinned,
        });
    }

    fn restore(&mut self, record: &StateRecord) {
        self.castling = record.castling;
        self.en_passant = record.en_passant;
        self.halfmove_clock = record.halfmove_clock;
        self.hash = record.hash;
        self.checkers = record.checkers;
        self.pinned = record.pinned;
    }

    // -------------------------------------------------------------------------
    // Make / undo
    // -------------------------------------------------------------------------

    /// Apply a legal move.
    ///
    /// The move must come from [`Position::generate_legal_moves`] (or pass
    /// [`Position::is_legal`]); anything else leaves the position in an
    /// unspecified state.
    pub fn make_move(&mut self, mv: Move) {
        let us = self.side_to_move;
        let (from, to) = (mv.from(), mv.to());
        let moving = self.squares[from as usize].expect("make_move from an empty square");
        debug_assert_eq!(moving.color, us, "make_move with the opponent's piece");

        let kind = mv.kind();
        let captured = match kind {
            MoveKind::EnPassant => self.squares[en_passant_victim(to, us) as usize],
            _ => self.squares[to as usize],
        };
        self.push_record(captured);
        if let Some(nnue) = &mut self.nnue {
            nnue.push();
        }

        if let Some(ep) = self.en_passant.take() {
            self.hash ^= self.keys.en_passant(ep);
        }

        match kind {
            MoveKind::Normal => {
                self.remove_piece(to);
                self.move_piece(from, to);
                if moving.kind == PieceKind::Pawn && from.abs_diff(to) == 16 {
                    let target = (from + to) / 2;
                    self.en_passant = Some(target);
                    self.hash ^= self.keys.en_passant(target);
                }
            }
            MoveKind::Castle => {
                let (rook_from, rook_to) = castle_rook_squares(to);
                self.move_piece(from, to);
                self.move_piece(rook_from, rook_to);
            }
            MoveKind::EnPassant => {
                self.remove_piece(en_passant_victim(to, us));
                self.move_piece(from, to);
            }
            MoveKind::Promotion(promo) => {
                self.remove_piece(to);
                self.remove_piece(from);
                self.add_piece(Piece::new(us, promo), to);
            }
        }

        let rights = CastlingRights::from_bits(
            self.castling.bits() & CASTLING_MASK[from as usize] & CASTLING_MASK[to as usize],
        );
        if rights != self.castling {
            self.hash ^= self.keys.castling(self.castling) ^ self.keys.castling(rights);
            self.castling = rights;
        }

        if moving.kind == PieceKind::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = us.other();
        self.hash ^= self.keys.black_to_move();
        self.refresh_check_info();
    }

    /// Revert the most recent [`Position::make_move`], which must have been `mv`.
    pub fn undo_move(&mut self, mv: Move) {
        let record = self
            .history
            .pop()
            .expect("undo_move without a matching make_move");
        let us = self.side_to_move.other();
        self.side_to_move = us;
        if us == Color::Black {
            self.fullmove_number -= 1;
        }

        let (from, to) = (mv.from(), mv.to());
        match mv.kind() {
            MoveKind::Normal => {
                if let Some(piece) = self.lift(to) {
                    self.place(piece, from);
                }
                if let Some(captured) = record.captured {
                    self.place(captured, to);
                }
            }
            MoveKind::Castle => {
                let (rook_from, rook_to) = castle_rook_squares(to);
                if let Some(rook) = self.lift(rook_to) {
                    self.place(rook, rook_from);
                }
                if let Some(king) = self.lift(to) {
                    self.place(king, from);
                }
            }
            MoveKind::EnPassant => {
                if let Some(pawn) = self.lift(to) {
                    self.place(pawn, from);
                }
                if let Some(captured) = record.captured {
                    self.place(captured, en_passant_victim(to, us));
                }
            }
            MoveKind::Promotion(_) => {
                self.lift(to);
                self.place(Piece::new(us, PieceKind::Pawn), from);
                if let Some(captured) = record.captured {
                    self.place(captured, to);
                }
            }
        }

        self.restore(&record);
        let rebuild = self.nnue.as_mut().is_some_and(|nnue| !nnue.pop());
        if rebuild && let Some(nnue) = self.nnue.take() {
            self.attach_network(Arc::clone(nnue.network()));
        }
    }

    /// Pass the turn. Only for search pruning; never while in check.
    pub fn make_null_move(&mut self) {
        debug_assert!(!self.in_check(), "null move while in check");
        self.push_record(None);
        if let Some(ep) = self.en_passant.take() {
            self.hash ^= self.keys.en_passant(ep);
        }
        self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        self.side_to_move = self.side_to_move.other();
        self.hash ^= self.keys.black_to_move();
        self.refresh_check_info();
    }

    pub fn undo_null_move(&mut self) {
        let record = self
            .history
            .pop()
            .expect("undo_null_move without a matching make_null_move");
        self.side_to_move = self.side_to_move.other();
        self.restore(&record);
    }

    /// Make `mv` and undo it when the returned guard is dropped.
    pub fn scoped_move(&mut self, mv: Move) -> MoveGuard<'_> {
        self.make_move(mv);
        MoveGuard {
            pos: self,
            mv: Some(mv),
        }
    }

    /// Make a null move and undo it when the returned guard is dropped.
    pub fn scoped_null_move(&mut self) -> MoveGuard<'_> {
        self.make_null_move();
        MoveGuard { pos: self, mv: None }
    }

    // -------------------------------------------------------------------------
    // NNUE accumulator
    // -------------------------------------------------------------------------

    /// Track `network`'s accumulator incrementally from now on.
    pub fn attach_network(&mut self, network: Arc<Network>) {
        let stack = AccumulatorStack::new(network, self);
        self.nnue = Some(stack);
    }

    pub fn detach_network(&mut self) {
        self.nnue = None;
    }

    /// The attached network, if any.
    pub fn network(&self) -> Option<&Arc<Network>> {
        self.nnue.as_ref().map(AccumulatorStack::network)
    }

    /// Accumulator for the current ply, if a network is attached.
    pub fn accumulator(&self) -> Option<&Accumulator> {
        self.nnue.as_ref().map(AccumulatorStack::current)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("fen", &self.to_fen())
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("plies", &self.history.len())
            .finish()
    }
}

/// ASCII diagram, rank 8 first.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{} ", rank + 1)?;
            for file in 0..8u8 {
                let c = self.squares[(rank * 8 + file) as usize].map_or('.', Piece::to_char);
                write!(f, " {c}")?;
            }
            writeln!(f)?;
        }
        writeln!(f, "   a b c d e f g h")
    }
}

/// A made move that is undone on drop.
///
/// Dereferences to the position so the child node can be searched through it.
pub struct MoveGuard<'a> {
    pos: &'a mut Position,
    mv: Option<Move>,
}

impl Deref for MoveGuard<'_> {
    type Target = Position;

    fn deref(&self) -> &Position {
        &*self.pos
    }
}

impl DerefMut for MoveGuard<'_> {
    fn deref_mut(&mut self) -> &mut Position {
        &mut *self.pos
    }
}

impl Drop for MoveGuard<'_> {
    fn drop(&mut self) {
        match self.mv {
            Some(mv) => self.pos.undo_move(mv),
            None => self.pos.undo_null_move(),
        }
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod board_tests;
