//! Game state management for a chess room.
//!
//! A `Game` owns the authoritative position of one room and is the only
//! place that mutates it: every move is validated, applied, recorded in the
//! move history and followed by a status classification for the side that
//! now has to move. Callers that share a game between tasks must serialize
//! access (see `scheduler`), since validation is only sound against a
//! position that cannot change underneath it.

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bot;
use crate::movegen::{self, LegalityError};
use crate::status::{self, GameStatus};
use crate::types::*;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors returned by game-level operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Game is already over")]
    GameOver,
    #[error("It is not {0}'s turn")]
    NotBotTurn(Color),
    #[error("Invalid move input: {0}")]
    InvalidMove(String),
    #[error(transparent)]
    Illegal(#[from] LegalityError),
}

impl GameError {
    /// Returns the error message in the current locale.
    pub fn reason(&self) -> String {
        match self {
            GameError::GameOver => t!("game.already_over").to_string(),
            GameError::NotBotTurn(color) => {
                t!("game.not_bot_turn", color = color.to_string()).to_string()
            }
            GameError::InvalidMove(input) => {
                t!("game.invalid_move", input = input).to_string()
            }
            GameError::Illegal(e) => e.reason(),
        }
    }
}

// ---------------------------------------------------------------------------
// Game struct
// ---------------------------------------------------------------------------

/// A complete chess game with its position and history.
#[derive(Debug, Clone)]
pub struct Game {
    /// Unique identifier for the game.
    pub id: Uuid,

    /// Current position.
    pub position: Position,

    /// Side to move.
    pub turn: Color,

    /// Classification of the current position for the side to move.
    pub status: GameStatus,

    /// Moves played so far, oldest first.
    pub move_history: Vec<MoveRecord>,

    /// The game result, if the game has ended.
    pub result: Option<GameResult>,

    /// The reason the game ended, if applicable.
    pub end_reason: Option<GameEndReason>,
}

/// A record of a single move in the game history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Full-move number at the time of the move (starts at 1).
    pub move_number: u32,
    /// Which side made the move.
    pub side: Color,
    /// The move in coordinate notation (e.g. "e2e4", "a7a8=Q").
    pub notation: String,
    /// The move itself.
    #[serde(rename = "move")]
    pub mv: ChessMove,
    /// Code of the captured piece, if any (e.g. "bp").
    pub captured: Option<String>,
}

/// Snapshot of a game for storage or transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameStateJson {
    pub game_id: Uuid,
    /// Map of occupied squares to piece codes.
    pub board: Position,
    pub turn: Color,
    pub status: GameStatus,
    pub winner: Option<Color>,
    pub result: Option<GameResult>,
    pub end_reason: Option<GameEndReason>,
    pub move_history: Vec<MoveRecord>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Creates a new game from the standard starting position.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            position: Position::starting_position(),
            turn: Color::White,
            status: GameStatus::Ongoing,
            move_history: Vec::new(),
            result: None,
            end_reason: None,
        }
    }

    /// Creates a game from an arbitrary position with `turn` to move.
    ///
    /// Fails if `turn` has no unique king. A position that is already
    /// decided produces a finished game.
    pub fn from_position(position: Position, turn: Color) -> Result<Self, GameError> {
        let status = status::classify(&position, turn)?;
        let mut game = Self {
            id: Uuid::new_v4(),
            position,
            turn,
            status,
            move_history: Vec::new(),
            result: None,
            end_reason: None,
        };
        game.record_outcome();
        Ok(game)
    }

    /// Returns `true` if the game has ended (has a result).
    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    /// Whether the side to move is currently in check.
    pub fn is_check(&self) -> bool {
        matches!(self.status, GameStatus::Check | GameStatus::Checkmate { .. })
    }

    /// Generates all legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<ChessMove> {
        movegen::all_legal_moves(&self.position, self.turn)
    }

    /// Current full-move number (starts at 1, increments after Black moves).
    pub fn fullmove_number(&self) -> u32 {
        let white_started = self
            .move_history
            .first()
            .is_none_or(|r| r.side == Color::White);
        let plies = self.move_history.len() as u32 + u32::from(!white_started);
        plies / 2 + 1
    }

    /// Validates and plays a move for the side to move.
    ///
    /// On success the turn passes to the opponent and the new status is
    /// returned. A rejected move leaves the game untouched.
    pub fn make_move(&mut self, mv: ChessMove) -> Result<GameStatus, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }

        if let Err(e) = movegen::validate(&self.position, mv.from, mv.to, self.turn) {
            log::debug!("game {}: rejected {} for {}: {}", self.id, mv, self.turn, e);
            return Err(e.into());
        }

        let next = movegen::apply_move(&self.position, &mv);
        let next_turn = self.turn.opponent();
        let next_status = status::classify(&next, next_turn)?;

        // Record the promotion kind actually placed on the board.
        let mut played = mv;
        played.promotion = match (self.position.get(mv.from), next.get(mv.to)) {
            (Some(before), Some(after)) if before.kind != after.kind => Some(after.kind),
            _ => None,
        };

        self.move_history.push(MoveRecord {
            move_number: self.fullmove_number(),
            side: self.turn,
            notation: played.to_string(),
            mv: played,
            captured: self.position.get(mv.to).map(Piece::code),
        });

        self.position = next;
        self.turn = next_turn;
        self.status = next_status;
        self.record_outcome();

        Ok(next_status)
    }

    /// Parses coordinate input (e.g. "e2e4", "e7e8q") and plays it.
    pub fn make_move_str(&mut self, input: &str) -> Result<GameStatus, GameError> {
        let mv = ChessMove::parse(input).ok_or_else(|| GameError::InvalidMove(input.to_string()))?;
        self.make_move(mv)
    }

    /// Ends the game with `side` resigning.
    pub fn resign(&mut self, side: Color) -> Result<(), GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        self.result = Some(GameResult::win_for(side.opponent()));
        self.end_reason = Some(GameEndReason::Resignation);
        log::info!("game {}: {} resigned", self.id, side);
        Ok(())
    }

    /// Lets the bot play for `side`.
    ///
    /// Re-checks that the game is live and that it is `side`'s turn, since
    /// the state may have changed since the reply was requested. Returns
    /// `Ok(None)` when `side` has no legal move.
    pub fn bot_reply<R: Rng + ?Sized>(
        &mut self,
        side: Color,
        rng: &mut R,
    ) -> Result<Option<ChessMove>, GameError> {
        if self.is_over() {
            return Err(GameError::GameOver);
        }
        if self.turn != side {
            return Err(GameError::NotBotTurn(side));
        }

        match bot::choose(&self.position, side, rng) {
            Some(mv) => {
                self.make_move(mv)?;
                // Report the move as recorded, with the promotion filled in.
                Ok(self.move_history.last().map(|r| r.mv))
            }
            None => Ok(None),
        }
    }

    /// Returns a serializable snapshot of the game.
    pub fn to_state_json(&self) -> GameStateJson {
        GameStateJson {
            game_id: self.id,
            board: self.position.clone(),
            turn: self.turn,
            status: self.status,
            winner: self.winner(),
            result: self.result,
            end_reason: self.end_reason,
            move_history: self.move_history.clone(),
        }
    }

    /// The winning side, if the game ended decisively.
    pub fn winner(&self) -> Option<Color> {
        match self.result {
            Some(GameResult::WhiteWins) => Some(Color::White),
            Some(GameResult::BlackWins) => Some(Color::Black),
            _ => None,
        }
    }

    /// Translates a terminal status into result and end reason.
    fn record_outcome(&mut self) {
        let outcome = match self.status {
            GameStatus::Checkmate { winner } => {
                Some((GameResult::win_for(winner), GameEndReason::Checkmate))
            }
            GameStatus::Stalemate => Some((GameResult::Draw, GameEndReason::Stalemate)),
            GameStatus::DrawInsufficientMaterial => {
                Some((GameResult::Draw, GameEndReason::InsufficientMaterial))
            }
            GameStatus::Ongoing | GameStatus::Check => None,
        };

        if let Some((result, reason)) = outcome {
            log::info!("game {} finished: {} ({})", self.id, result, reason);
            self.result = Some(result);
            self.end_reason = Some(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_new_game() {
        let game = Game::new();
        assert_eq!(game.turn, Color::White);
        assert_eq!(game.status, GameStatus::Ongoing);
        assert_eq!(game.legal_moves().len(), 20);
        assert!(!game.is_over());
        assert_eq!(game.fullmove_number(), 1);
    }

    #[test]
    fn test_moves_alternate_and_are_recorded() {
        let mut game = Game::new();
        game.make_move_str("e2e4").unwrap();
        assert_eq!(game.turn, Color::Black);
        game.make_move_str("e7e5").unwrap();
        assert_eq!(game.turn, Color::White);
        assert_eq!(game.fullmove_number(), 2);

        assert_eq!(game.move_history.len(), 2);
        assert_eq!(game.move_history[0].notation, "e2e4");
        assert_eq!(game.move_history[0].side, Color::White);
        assert_eq!(game.move_history[1].move_number, 1);
        assert_eq!(game.move_history[1].side, Color::Black);
    }

    #[test]
    fn test_rejected_move_leaves_game_untouched() {
        let mut game = Game::new();
        let before = game.position.clone();
        assert_eq!(
            game.make_move_str("e7e5"),
            Err(GameError::Illegal(LegalityError::WrongSideToMove(Color::White)))
        );
        assert_eq!(
            game.make_move_str("e2e5"),
            Err(GameError::Illegal(LegalityError::GeometricallyIllegal))
        );
        assert!(matches!(game.make_move_str("zz"), Err(GameError::InvalidMove(_))));
        assert_eq!(game.position, before);
        assert_eq!(game.turn, Color::White);
        assert!(game.move_history.is_empty());
    }

    #[test]
    fn test_fools_mate_ends_game() {
        let mut game = Game::new();
        for mv in ["f2f3", "e7e5", "g2g4"] {
            game.make_move_str(mv).unwrap();
        }
        let status = game.make_move_str("d8h4").unwrap();
        assert_eq!(status, GameStatus::Checkmate { winner: Color::Black });
        assert!(game.is_over());
        assert_eq!(game.result, Some(GameResult::BlackWins));
        assert_eq!(game.end_reason, Some(GameEndReason::Checkmate));
        assert_eq!(game.winner(), Some(Color::Black));
        assert_eq!(game.make_move_str("e1f2"), Err(GameError::GameOver));
    }

    #[test]
    fn test_capture_is_recorded() {
        let mut game = Game::new();
        for mv in ["e2e4", "d7d5", "e4d5"] {
            game.make_move_str(mv).unwrap();
        }
        assert_eq!(game.move_history[2].captured.as_deref(), Some("bp"));
        assert_eq!(game.position.piece_count(), 31);
    }

    #[test]
    fn test_promotion_recorded_in_history() {
        let mut position = Position::default();
        position.place("a7", Piece::from_code("wp").unwrap());
        position.place("e1", Piece::from_code("wk").unwrap());
        position.place("h5", Piece::from_code("bk").unwrap());
        let mut game = Game::from_position(position, Color::White).unwrap();

        game.make_move_str("a7a8").unwrap();
        assert_eq!(game.move_history[0].notation, "a7a8=Q");
        assert_eq!(
            game.position.get(Square::from_algebraic("a8").unwrap()),
            Some(Piece::from_code("wq").unwrap())
        );
    }

    #[test]
    fn test_resignation() {
        let mut game = Game::new();
        game.resign(Color::White).unwrap();
        assert_eq!(game.result, Some(GameResult::BlackWins));
        assert_eq!(game.end_reason, Some(GameEndReason::Resignation));
        assert_eq!(game.resign(Color::Black), Err(GameError::GameOver));
    }

    #[test]
    fn test_bot_reply_checks_turn() {
        let mut game = Game::new();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            game.bot_reply(Color::Black, &mut rng),
            Err(GameError::NotBotTurn(Color::Black))
        );
        let mv = game.bot_reply(Color::White, &mut rng).unwrap().unwrap();
        assert_eq!(game.turn, Color::Black);
        assert_eq!(game.move_history[0].mv, mv);
    }

    #[test]
    fn test_bare_kings_start_as_draw() {
        let mut position = Position::default();
        position.place("e1", Piece::from_code("wk").unwrap());
        position.place("e8", Piece::from_code("bk").unwrap());
        let game = Game::from_position(position, Color::Black).unwrap();
        assert!(game.is_over());
        assert_eq!(game.result, Some(GameResult::Draw));
        assert_eq!(game.end_reason, Some(GameEndReason::InsufficientMaterial));
    }

    #[test]
    fn test_from_position_requires_king() {
        let mut position = Position::default();
        position.place("e8", Piece::from_code("bk").unwrap());
        assert_eq!(
            Game::from_position(position, Color::White).unwrap_err(),
            GameError::Illegal(LegalityError::KingNotFound(Color::White))
        );
    }

    #[test]
    fn test_state_json_shape() {
        let mut game = Game::new();
        game.make_move_str("e2e4").unwrap();
        let json = serde_json::to_value(game.to_state_json()).unwrap();
        assert_eq!(json["turn"], "black");
        assert_eq!(json["board"]["e4"], "wp");
        assert_eq!(json["status"]["status"], "ongoing");
        assert_eq!(json["move_history"][0]["move"]["from"], "e2");
        assert!(json["winner"].is_null());
    }
}
