//! # chessroom: Chess Rules Engine and Move Bot for Multiplayer Rooms
//!
//! `chessroom` decides whether a requested move is legal, classifies the
//! resulting position and picks replies for an automated opponent. It is
//! built to sit behind a room server that owns transport and persistence:
//! the server hands in a position and a move, and gets back a verdict or a
//! new position.
//!
//! ## Rules
//!
//! - Full piece geometry for pawns, knights, bishops, rooks, queens and
//!   kings, with self-check detection by simulating the move.
//! - A king may never step next to the opposing king.
//! - Promotion on the last rank (queen unless another piece is requested).
//! - Castling, en passant, repetition and fifty-move draws are not part of
//!   the rule set.
//!
//! ## Modules
//!
//! | Module        | Purpose                                            |
//! |---------------|----------------------------------------------------|
//! | `types`       | Squares, pieces, positions and moves               |
//! | `movegen`     | Attack detection, move generation, legality        |
//! | `status`      | Check, checkmate, stalemate and material draws     |
//! | `bot`         | Greedy one-ply move selection                      |
//! | `game`        | Game session with history and results              |
//! | `scheduler`   | Deferred, cancellable bot replies                  |
//! | `matchmaking` | Queue that pairs waiting players into rooms        |
//! | `terminal`    | Interactive human-vs-bot play                      |
//! | `i18n`        | Locale detection for player-facing messages        |

#[macro_use]
extern crate rust_i18n;

i18n!("locales", fallback = "en");

pub mod bot;
pub mod game;
pub mod i18n;
pub mod matchmaking;
pub mod movegen;
pub mod scheduler;
pub mod status;
pub mod terminal;
pub mod types;

pub use movegen::LegalityError;
pub use status::GameStatus;
pub use types::initial_position;

use crate::types::*;

/// Checks a candidate move and returns whether it is legal together with a
/// player-facing reason.
pub fn validate_move(position: &Position, from: Square, to: Square, side: Color) -> (bool, String) {
    match movegen::validate(position, from, to, side) {
        Ok(()) => (true, t!("rules.valid").to_string()),
        Err(e) => (false, e.reason()),
    }
}

/// All legal `(from, to)` pairs for `side`.
pub fn legal_moves(position: &Position, side: Color) -> Vec<(Square, Square)> {
    movegen::all_legal_moves(position, side)
        .into_iter()
        .map(|mv| (mv.from, mv.to))
        .collect()
}

/// Plays a move on a copy of `position`. The move is not validated.
pub fn apply_move(
    position: &Position,
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
) -> Position {
    movegen::apply_move(position, &ChessMove { from, to, promotion })
}

/// Classifies `position` for the side to move, returning the winner on
/// checkmate.
pub fn classify(position: &Position, side: Color) -> Result<(GameStatus, Option<Color>), LegalityError> {
    let status = status::classify(position, side)?;
    Ok((status, status.winner()))
}

/// Picks a reply for `side`, or `None` if it has no legal move.
pub fn choose_bot_move(position: &Position, side: Color) -> Option<ChessMove> {
    bot::choose_bot_move(position, side)
}
