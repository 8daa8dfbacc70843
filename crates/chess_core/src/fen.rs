//! FEN parsing and serialization.
//!
//! Parsing is strict: anything that could leave the position inconsistent
//! (missing kings, castling rights without the pieces to back them, an
//! impossible en-passant target, the side not to move in check) is rejected
//! with [`ChessError::InvalidFen`]. The halfmove and fullmove fields may be
//! omitted, as in EPD records, and default to `0` and `1`.

use std::fmt::Write;

use crate::attacks::{ATTACKS, AttackTables};
use crate::board::{CastlingRights, Position};
use crate::error::{ChessError, ChessResult};
use crate::types::*;
use crate::zobrist::{HASH_KEYS, HashKeys};

impl Position {
    pub fn from_fen(fen: &str) -> ChessResult<Self> {
        Self::from_fen_with(fen, &ATTACKS, &HASH_KEYS)
    }

    /// Parse `fen` into a position using caller-supplied tables.
    pub fn from_fen_with(
        fen: &str,
        attacks: &'static AttackTables,
        keys: &'static HashKeys,
    ) -> ChessResult<Self> {
        let invalid = |reason: String| ChessError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };

        let fields: Vec<&str> = fen.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(invalid(format!(
                "expected 4 to 6 fields, found {}",
                fields.len()
            )));
        }

        let mut pos = Position::empty(attacks, keys);
        parse_placement(&mut pos, fields[0]).map_err(invalid)?;

        let side = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(invalid(format!("side to move must be 'w' or 'b', got '{other}'"))),
        };
        pos.set_side_to_move(side);

        let castling = parse_castling(&pos, fields[2]).map_err(invalid)?;
        pos.set_castling(castling);

        let en_passant = parse_en_passant(&pos, side, fields[3]).map_err(invalid)?;
        pos.set_en_passant(en_passant);

        let halfmove = parse_counter(fields.get(4).copied(), 0, "halfmove clock").map_err(invalid)?;
        let fullmove = parse_counter(fields.get(5).copied(), 1, "fullmove number").map_err(invalid)?;
        pos.set_counters(halfmove, fullmove);

        pos.finish_setup();

        let them = side.other();
        if pos.is_square_attacked(pos.king_square(them), side) {
            return Err(invalid("side not to move is in check".to_string()));
        }
        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(90);
        for rank in (0..8u8).rev() {
            let mut empty = 0;
            for file in 0..8u8 {
                match self.piece_at(rank * 8 + file) {
                    Some(piece) => {
                        if empty > 0 {
                            let _ = write!(out, "{empty}");
                            empty = 0;
                        }
                        out.push(piece.to_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                let _ = write!(out, "{empty}");
            }
            if rank > 0 {
                out.push('/');
            }
        }

        let side = match self.side_to_move() {
            Color::White => 'w',
            Color::Black => 'b',
        };
        let ep = self.en_passant().map_or_else(|| "-".to_string(), sq_to_coord);
        let _ = write!(
            out,
            " {side} {} {ep} {} {}",
            self.castling_rights(),
            self.halfmove_clock(),
            self.fullmove_number()
        );
        out
    }
}

fn parse_placement(pos: &mut Position, placement: &str) -> Result<(), String> {
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(format!("expected 8 ranks, found {}", ranks.len()));
    }

    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for ch in rank_str.chars() {
            if let Some(d) = ch.to_digit(10) {
                if !(1..=8).contains(&d) {
                    return Err(format!("bad empty-square count '{ch}'"));
                }
                file += d as u8;
            } else {
                let piece = Piece::from_char(ch).ok_or_else(|| format!("unknown piece '{ch}'"))?;
                if file >= 8 {
                    return Err(format!("rank {} is longer than 8 squares", rank + 1));
                }
                if piece.kind == PieceKind::Pawn && (rank == 0 || rank == 7) {
                    return Err(format!("pawn on rank {}", rank + 1));
                }
                pos.place(piece, rank * 8 + file);
                file += 1;
            }
            if file > 8 {
                return Err(format!("rank {} is longer than 8 squares", rank + 1));
            }
        }
        if file != 8 {
            return Err(format!("rank {} has {file} squares", rank + 1));
        }
    }

    for color in Color::ALL {
        let kings = pos.pieces(color, PieceKind::King).popcount();
        if kings != 1 {
            return Err(format!("{color:?} has {kings} kings"));
        }
    }
    Ok(())
}

fn parse_castling(pos: &Position, field: &str) -> Result<CastlingRights, String> {
    let mut rights = CastlingRights::NONE;
    if field == "-" {
        return Ok(rights);
    }
    for ch in field.chars() {
        let (flag, color, rook_sq) = match ch {
            'K' => (CastlingRights::WHITE_KING_SIDE, Color::White, 7),
            'Q' => (CastlingRights::WHITE_QUEEN_SIDE, Color::White, 0),
            'k' => (CastlingRights::BLACK_KING_SIDE, Color::Black, 63),
            'q' => (CastlingRights::BLACK_QUEEN_SIDE, Color::Black, 56),
            _ => return Err(format!("bad castling character '{ch}'")),
        };
        let king_sq = if color == Color::White { 4 } else { 60 };
        if pos.piece_at(king_sq) != Some(Piece::new(color, PieceKind::King))
            || pos.piece_at(rook_sq) != Some(Piece::new(color, PieceKind::Rook))
        {
            return Err(format!("castling right '{ch}' without king and rook at home"));
        }
        rights.insert(flag);
    }
    Ok(rights)
}

fn parse_en_passant(pos: &Position, side: Color, field: &str) -> Result<Option<Square>, String> {
    if field == "-" {
        return Ok(None);
    }
    let target = coord_to_sq(field).ok_or_else(|| format!("bad en-passant square '{field}'"))?;
    let expected_rank = match side {
        Color::White => 5,
        Color::Black => 2,
    };
    if rank_of(target) != expected_rank {
        return Err(format!("en-passant square '{field}' on the wrong rank"));
    }
    // The pawn that just advanced sits one step past the target; the target
    // and the square it came from are empty.
    let (pawn_sq, origin) = match side {
        Color::White => (target - 8, target + 8),
        Color::Black => (target + 8, target - 8),
    };
    let pawn = Piece::new(side.other(), PieceKind::Pawn);
    if pos.piece_at(pawn_sq) != Some(pawn)
        || pos.piece_at(target).is_some()
        || pos.piece_at(origin).is_some()
    {
        return Err(format!("no double pawn push behind en-passant square '{field}'"));
    }
    Ok(Some(target))
}

fn parse_counter(field: Option<&str>, default: u32, name: &str) -> Result<u32, String> {
    match field {
        None => Ok(default),
        Some(text) => text
            .parse()
            .map_err(|_| format!("{name} '{text}' is not a number")),
    }
}

#[cfg(test)]
#[path = "fen_tests.rs"]
mod fen_tests;
