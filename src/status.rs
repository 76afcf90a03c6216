//! Game status classification.
//!
//! Combines check detection, the existence of a legal reply and a coarse
//! material count to decide whether a position is ongoing, check,
//! checkmate, stalemate or a draw by insufficient material.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::movegen::{self, LegalityError};
use crate::types::*;

/// The verdict for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GameStatus {
    Ongoing,
    Check,
    Checkmate { winner: Color },
    Stalemate,
    DrawInsufficientMaterial,
}

impl GameStatus {
    /// Whether the game is over.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            GameStatus::Checkmate { .. } | GameStatus::Stalemate | GameStatus::DrawInsufficientMaterial
        )
    }

    /// The winning side, only ever set for checkmate.
    pub fn winner(self) -> Option<Color> {
        match self {
            GameStatus::Checkmate { winner } => Some(winner),
            _ => None,
        }
    }

    /// Short lowercase label (`"checkmate"`, `"draw"`, ...).
    pub fn label(self) -> &'static str {
        match self {
            GameStatus::Ongoing => "ongoing",
            GameStatus::Check => "check",
            GameStatus::Checkmate { .. } => "checkmate",
            GameStatus::Stalemate => "stalemate",
            GameStatus::DrawInsufficientMaterial => "draw",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Checkmate { winner } => write!(f, "checkmate ({} wins)", winner),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Returns `true` if the king of `side` is attacked by the opponent.
pub fn in_check(position: &Position, side: Color) -> Result<bool, LegalityError> {
    let king_sq = movegen::find_king(position, side)?;
    Ok(movegen::is_square_attacked(position, king_sq, side.opponent()))
}

/// Returns `true` if `side` has at least one legal move.
pub fn has_any_legal_move(position: &Position, side: Color) -> bool {
    !movegen::all_legal_moves(position, side).is_empty()
}

/// Coarse dead-position test: only the two kings remain, or exactly three
/// pieces remain and one of them is a knight or a bishop.
///
/// Many drawn material balances (two knights, same-colored bishops) are
/// not recognised; this is not complete draw detection.
pub fn is_insufficient_material(position: &Position) -> bool {
    match position.piece_count() {
        2 => true,
        3 => position
            .pieces()
            .any(|(_, p)| matches!(p.kind, PieceKind::Knight | PieceKind::Bishop)),
        _ => false,
    }
}

/// Classifies the position for `side_to_move`.
///
/// Checkmate and stalemate are decided first; the material heuristic only
/// applies when the side to move still has a legal move. Fails only when
/// `side_to_move` has no unique king.
pub fn classify(position: &Position, side_to_move: Color) -> Result<GameStatus, LegalityError> {
    let checked = in_check(position, side_to_move)?;
    let has_move = has_any_legal_move(position, side_to_move);

    let status = match (checked, has_move) {
        (true, false) => GameStatus::Checkmate {
            winner: side_to_move.opponent(),
        },
        (false, false) => GameStatus::Stalemate,
        _ if is_insufficient_material(position) => GameStatus::DrawInsufficientMaterial,
        (true, true) => GameStatus::Check,
        (false, true) => GameStatus::Ongoing,
    };

    log::debug!("classified position for {}: {}", side_to_move, status);
    Ok(status)
}
