//! Matchmaking coordinator.
//!
//! A single task owns the queue of waiting players. Handles talk to it
//! over a bounded channel, so there is no shared mutable queue, and the
//! queue itself never holds more than `capacity` players. Players are
//! paired in arrival order; the earlier arrival plays white.

use std::collections::VecDeque;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Errors returned by the matchmaking coordinator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatchmakingError {
    #[error("Matchmaking queue is full")]
    QueueFull,
    #[error("Player is already waiting for a match")]
    AlreadyQueued,
    #[error("Player left the queue")]
    LeftQueue,
    #[error("Matchmaking coordinator has shut down")]
    CoordinatorClosed,
}

/// Two players paired into a new room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Eight upper-case hex characters.
    pub room_code: String,
    pub white: String,
    pub black: String,
}

/// Resolves once the player has been paired.
#[derive(Debug)]
pub struct MatchTicket {
    rx: oneshot::Receiver<Result<Match, MatchmakingError>>,
}

impl MatchTicket {
    pub async fn matched(self) -> Result<Match, MatchmakingError> {
        self.rx
            .await
            .unwrap_or(Err(MatchmakingError::CoordinatorClosed))
    }
}

enum Command {
    Join {
        player: String,
        admitted: oneshot::Sender<Result<(), MatchmakingError>>,
        reply: oneshot::Sender<Result<Match, MatchmakingError>>,
    },
    Leave {
        player: String,
        reply: oneshot::Sender<bool>,
    },
    Waiting {
        reply: oneshot::Sender<usize>,
    },
}

struct Waiting {
    player: String,
    reply: oneshot::Sender<Result<Match, MatchmakingError>>,
}

/// Cloneable handle to the coordinator task.
#[derive(Debug, Clone)]
pub struct MatchmakingCoordinator {
    tx: mpsc::Sender<Command>,
}

impl MatchmakingCoordinator {
    /// Starts the coordinator task. At most `capacity` players may wait at
    /// once; pairing needs a capacity of at least two. The task stops once
    /// every handle is dropped.
    pub fn spawn(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        tokio::spawn(run(rx, capacity));
        Self { tx }
    }

    /// Puts `player` in the queue and returns a ticket for the match.
    ///
    /// Fails with `QueueFull` when `capacity` players are already waiting
    /// and with `AlreadyQueued` when `player` is one of them.
    pub async fn join(&self, player: impl Into<String>) -> Result<MatchTicket, MatchmakingError> {
        let (admitted, admitted_rx) = oneshot::channel();
        let (reply, rx) = oneshot::channel();
        self.send(Command::Join {
            player: player.into(),
            admitted,
            reply,
        })
        .await?;
        admitted_rx
            .await
            .map_err(|_| MatchmakingError::CoordinatorClosed)??;
        Ok(MatchTicket { rx })
    }

    /// Removes a waiting player. Returns `false` if they were not waiting.
    pub async fn leave(&self, player: impl Into<String>) -> Result<bool, MatchmakingError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Leave {
            player: player.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| MatchmakingError::CoordinatorClosed)
    }

    /// Number of players currently waiting.
    pub async fn waiting(&self) -> Result<usize, MatchmakingError> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Waiting { reply }).await?;
        rx.await.map_err(|_| MatchmakingError::CoordinatorClosed)
    }

    async fn send(&self, command: Command) -> Result<(), MatchmakingError> {
        self.tx
            .send(command)
            .await
            .map_err(|_| MatchmakingError::CoordinatorClosed)
    }
}

async fn run(mut rx: mpsc::Receiver<Command>, capacity: usize) {
    let mut queue: VecDeque<Waiting> = VecDeque::new();

    while let Some(command) = rx.recv().await {
        // Players whose ticket was dropped no longer wait.
        queue.retain(|w| !w.reply.is_closed());

        match command {
            Command::Join {
                player,
                admitted,
                reply,
            } => {
                if queue.iter().any(|w| w.player == player) {
                    let _ = admitted.send(Err(MatchmakingError::AlreadyQueued));
                    continue;
                }
                if queue.len() >= capacity {
                    log::warn!("matchmaking: queue full, rejecting {}", player);
                    let _ = admitted.send(Err(MatchmakingError::QueueFull));
                    continue;
                }
                log::debug!("matchmaking: {} joined ({} waiting)", player, queue.len());
                queue.push_back(Waiting { player, reply });
                let _ = admitted.send(Ok(()));
                pair_waiting(&mut queue);
            }
            Command::Leave { player, reply } => {
                let position = queue.iter().position(|w| w.player == player);
                if let Some(waiting) = position.and_then(|i| queue.remove(i)) {
                    log::debug!("matchmaking: {} left", waiting.player);
                    let _ = waiting.reply.send(Err(MatchmakingError::LeftQueue));
                }
                let _ = reply.send(position.is_some());
            }
            Command::Waiting { reply } => {
                let _ = reply.send(queue.len());
            }
        }
    }

    log::debug!("matchmaking coordinator stopped with {} waiting", queue.len());
}

fn pair_waiting(queue: &mut VecDeque<Waiting>) {
    while queue.len() >= 2 {
        let (Some(white), Some(black)) = (queue.pop_front(), queue.pop_front()) else {
            break;
        };

        let found = Match {
            room_code: new_room_code(),
            white: white.player,
            black: black.player,
        };
        log::info!(
            "matched {} (white) vs {} (black) in room {}",
            found.white,
            found.black,
            found.room_code
        );

        let _ = white.reply.send(Ok(found.clone()));
        let _ = black.reply.send(Ok(found));
    }
}

fn new_room_code() -> String {
    let mut code = Uuid::new_v4().simple().to_string();
    code.truncate(8);
    code.to_ascii_uppercase()
}
