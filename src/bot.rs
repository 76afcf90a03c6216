//! Greedy move selection for the automated player.
//!
//! The bot never searches: it looks at the legal moves of the current
//! position, sorts them into priority buckets and picks uniformly at random
//! inside the first non-empty bucket.
//!
//! - In check: capture → block (non-king quiet move) → king move.
//! - Otherwise: safe capture → safe move → risky capture → risky move, where
//!   "safe" means the destination is not attacked once the move is played.
//!
//! Pawns reaching the last rank always promote to a queen.

use rand::Rng;
use rand::seq::IndexedRandom;

use crate::movegen;
use crate::status;
use crate::types::*;

/// The bucket a chosen move came from, for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    CheckCapture,
    CheckBlock,
    CheckKingMove,
    SafeCapture,
    SafeMove,
    RiskyCapture,
    RiskyMove,
}

/// Picks a move for `side` using the given random source.
///
/// Returns `None` when `side` has no legal move; the caller tells
/// checkmate from stalemate through [`status::classify`].
pub fn choose<R: Rng + ?Sized>(position: &Position, side: Color, rng: &mut R) -> Option<ChessMove> {
    let legal = movegen::all_legal_moves(position, side);
    if legal.is_empty() {
        log::debug!("bot: {} has no legal move", side);
        return None;
    }

    // A non-empty move list implies a unique king, so this cannot fail.
    let checked = matches!(status::in_check(position, side), Ok(true));
    let buckets = if checked {
        check_buckets(position, &legal)
    } else {
        quiet_buckets(position, side, &legal)
    };

    let (priority, bucket) = buckets.iter().find(|(_, moves)| !moves.is_empty())?;
    let mut mv = *bucket.choose(rng)?;

    if let Some(piece) = position.get(mv.from)
        && piece.kind == PieceKind::Pawn
        && mv.to.rank() == side.promotion_rank()
    {
        mv.promotion = Some(PieceKind::Queen);
    }

    log::debug!(
        "bot: {} plays {} ({:?}, {} candidates)",
        side,
        mv,
        priority,
        bucket.len()
    );
    Some(mv)
}

/// Picks a move for `side` using the thread-local random source.
pub fn choose_bot_move(position: &Position, side: Color) -> Option<ChessMove> {
    choose(position, side, &mut rand::rng())
}

/// Splits check evasions. King moves always land in the king bucket, even
/// when they capture.
fn check_buckets(position: &Position, legal: &[ChessMove]) -> Vec<(Priority, Vec<ChessMove>)> {
    let mut captures = Vec::new();
    let mut blocks = Vec::new();
    let mut king_moves = Vec::new();

    for &mv in legal {
        let is_king = position.get(mv.from).is_some_and(|p| p.kind == PieceKind::King);
        if is_king {
            king_moves.push(mv);
        } else if position.get(mv.to).is_some() {
            captures.push(mv);
        } else {
            blocks.push(mv);
        }
    }

    vec![
        (Priority::CheckCapture, captures),
        (Priority::CheckBlock, blocks),
        (Priority::CheckKingMove, king_moves),
    ]
}

/// Splits moves by capture and by whether the destination is safe after
/// the move is played.
fn quiet_buckets(
    position: &Position,
    side: Color,
    legal: &[ChessMove],
) -> Vec<(Priority, Vec<ChessMove>)> {
    let mut safe_captures = Vec::new();
    let mut safe_moves = Vec::new();
    let mut risky_captures = Vec::new();
    let mut risky_moves = Vec::new();

    for &mv in legal {
        let is_capture = position.get(mv.to).is_some();
        let after = movegen::simulate(position, mv.from, mv.to);
        let is_safe = !movegen::is_square_attacked(&after, mv.to, side.opponent());

        match (is_capture, is_safe) {
            (true, true) => safe_captures.push(mv),
            (false, true) => safe_moves.push(mv),
            (true, false) => risky_captures.push(mv),
            (false, false) => risky_moves.push(mv),
        }
    }

    vec![
        (Priority::SafeCapture, safe_captures),
        (Priority::SafeMove, safe_moves),
        (Priority::RiskyCapture, risky_captures),
        (Priority::RiskyMove, risky_moves),
    ]
}
