//! Deferred bot replies.
//!
//! The bot answers after an artificial "thinking" delay. The reply runs as
//! a tokio task that reads the game when it wakes up, not when it was
//! scheduled, and does nothing if the game ended or the turn moved on in
//! the meantime.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::game::{Game, GameError};
use crate::types::*;

/// What a scheduled reply ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The bot played this move.
    Moved(ChessMove),
    /// The bot's side had no legal move.
    NoLegalMove,
    /// The game ended or it was no longer the bot's turn.
    Stale,
    /// The reply was cancelled before it acted.
    Cancelled,
}

/// Handle to a scheduled bot reply.
#[derive(Debug)]
pub struct PendingReply {
    handle: JoinHandle<ReplyOutcome>,
}

impl PendingReply {
    /// Aborts the reply. Has no effect once the move has been played.
    pub fn cancel(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the reply to finish.
    pub async fn outcome(self) -> ReplyOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => ReplyOutcome::Cancelled,
            Err(e) => {
                log::error!("bot reply task failed: {}", e);
                ReplyOutcome::Cancelled
            }
        }
    }
}

/// Schedules the bot to move for `side` after `delay`.
///
/// With a `seed` the choice among equally ranked moves is reproducible.
pub fn schedule_bot_reply(
    game: Arc<Mutex<Game>>,
    side: Color,
    delay: Duration,
    seed: Option<u64>,
) -> PendingReply {
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let mut game = game.lock().unwrap_or_else(PoisonError::into_inner);
        match game.bot_reply(side, &mut rng) {
            Ok(Some(mv)) => ReplyOutcome::Moved(mv),
            Ok(None) => {
                log::warn!("game {}: bot has no legal move for {}", game.id, side);
                ReplyOutcome::NoLegalMove
            }
            Err(GameError::GameOver) | Err(GameError::NotBotTurn(_)) => {
                log::debug!("game {}: dropping stale reply for {}", game.id, side);
                ReplyOutcome::Stale
            }
            Err(e) => {
                log::warn!("game {}: bot reply rejected: {}", game.id, e);
                ReplyOutcome::Stale
            }
        }
    });

    PendingReply { handle }
}
