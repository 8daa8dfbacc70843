//! Move text and position commands as they appear on the UCI wire.

use crate::board::Position;
use crate::error::{ChessError, ChessResult};
use crate::movegen::GenMode;
use crate::time_control::SearchLimits;
use crate::types::*;
use crate::Engine;

pub fn move_to_uci(mv: Move) -> String {
    mv.to_string()
}

/// Resolve move text against the legal moves of `pos`.
///
/// Matching against generated moves is what recovers the castle and
/// en-passant kinds, which the text does not carry.
pub fn parse_uci_move(pos: &Position, text: &str) -> ChessResult<Move> {
    let text = text.trim();
    let well_formed = text.is_ascii()
        && match text.len() {
            4 => true,
            5 => PieceKind::from_char(text.as_bytes()[4] as char)
                .is_some_and(|k| !matches!(k, PieceKind::Pawn | PieceKind::King)),
            _ => false,
        };
    if !well_formed || coord_to_sq(&text[0..2]).is_none() || coord_to_sq(&text[2..4]).is_none() {
        return Err(ChessError::InvalidMoveText(text.to_string()));
    }

    let wanted = text.to_ascii_lowercase();
    pos.generate_legal_moves(GenMode::All)
        .iter()
        .copied()
        .find(|m| m.to_string() == wanted)
        .ok_or_else(|| ChessError::IllegalMove {
            mv: text.to_string(),
            fen: pos.to_fen(),
        })
}

/// Build a position from `"startpos"` or a FEN, then play `moves` in order.
pub fn position_from_moves(start: &str, moves: &[&str]) -> ChessResult<Position> {
    let mut pos = match start.trim() {
        "startpos" => Position::startpos(),
        fen => Position::from_fen(fen)?,
    };
    for text in moves {
        let mv = parse_uci_move(&pos, text)?;
        pos.make_move(mv);
    }
    Ok(pos)
}

/// Arguments of a `position` command:
/// `startpos [moves ...]` or `fen <fields> [moves ...]`.
pub fn parse_position_command(args: &[&str]) -> ChessResult<Position> {
    let moves_at = args.iter().position(|&a| a == "moves");
    let (setup, moves) = match moves_at {
        Some(i) => (&args[..i], &args[i + 1..]),
        None => (args, &[][..]),
    };
    let start = match setup {
        ["startpos"] | [] => "startpos".to_string(),
        ["fen", fields @ ..] => fields.join(" "),
        _ => {
            return Err(ChessError::InvalidFen {
                fen: setup.join(" "),
                reason: "expected 'startpos' or 'fen <fields>'".to_string(),
            });
        }
    };
    position_from_moves(&start, moves)
}

/// Search `pos` and return the chosen move as text, `0000` if there is none.
pub fn best_move_text(engine: &mut dyn Engine, pos: &Position, limits: SearchLimits) -> String {
    engine
        .search(pos, limits)
        .best_move
        .unwrap_or(Move::NULL)
        .to_string()
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
