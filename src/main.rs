//! # chessroom: Chess Rules Engine and Move Bot
//!
//! Command-line front end for the `chessroom` library: play against the
//! bot in the terminal, watch the bot play itself, or analyze a stored
//! position.
//!
//! ## Usage
//!
//! ```bash
//! # Play White against the bot
//! chessroom play
//!
//! # Play Black with a reproducible bot
//! chessroom play --color black --seed 7
//!
//! # Let the bot play both sides
//! chessroom selfplay --max-moves 200
//!
//! # Analyze a position stored as {"e1":"wk","e8":"bk",...}
//! chessroom analyze --position room.json --side black
//! ```
//!
//! `CHESSROOM_LANG` selects the message language (`en`, `de`), `RUST_LOG`
//! the log level.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chessroom::game::Game;
use chessroom::scheduler::{self, ReplyOutcome};
use chessroom::terminal::{self, PlayOptions};
use chessroom::types::{Color, Position};

/// chessroom: chess rules engine and greedy move bot.
#[derive(Parser, Debug)]
#[command(name = "chessroom")]
#[command(about = "Chess rules engine and greedy move bot for multiplayer rooms")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play against the bot in the terminal.
    Play {
        /// The side you play (white or black).
        #[arg(short, long, default_value_t = Color::White)]
        color: Color,

        /// Bot thinking delay in milliseconds.
        #[arg(long, default_value_t = 500)]
        delay_ms: u64,

        /// Seed for reproducible bot choices.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Let the bot play both sides.
    Selfplay {
        /// Stop after this many moves if the game is still running.
        #[arg(long, default_value_t = 300)]
        max_moves: u32,

        /// Delay before each move in milliseconds.
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,

        /// Seed for reproducible games.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show legal moves, status and the bot's choice for a position file.
    Analyze {
        /// JSON file mapping squares to piece codes.
        #[arg(short, long)]
        position: PathBuf,

        /// The side to move.
        #[arg(short, long, default_value_t = Color::White)]
        side: Color,
    },
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    chessroom::i18n::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            color,
            delay_ms,
            seed,
        } => {
            let options = PlayOptions {
                human: color,
                bot_delay: Duration::from_millis(delay_ms),
                seed,
            };
            let runtime = tokio::runtime::Handle::current();
            tokio::task::spawn_blocking(move || terminal::run_terminal_game(options, runtime))
                .await
                .map_err(std::io::Error::other)
        }
        Commands::Selfplay {
            max_moves,
            delay_ms,
            seed,
        } => run_selfplay(max_moves, Duration::from_millis(delay_ms), seed).await,
        Commands::Analyze { position, side } => {
            let data = std::fs::read_to_string(&position)?;
            let position: Position = serde_json::from_str(&data)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            terminal::print_analysis(&position, side).map_err(std::io::Error::other)?;
            Ok(())
        }
    }
}

fn lock(game: &Mutex<Game>) -> MutexGuard<'_, Game> {
    game.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Plays a bot-vs-bot game through the deferred reply scheduler.
async fn run_selfplay(max_moves: u32, delay: Duration, seed: Option<u64>) -> std::io::Result<()> {
    let game = Arc::new(Mutex::new(Game::new()));
    log::info!("self-play game {} started", lock(&game).id);

    let mut played = 0u32;
    loop {
        let (over, side) = {
            let game = lock(&game);
            (game.is_over(), game.turn)
        };
        if over {
            break;
        }
        if played >= max_moves {
            log::info!("move limit of {} reached", max_moves);
            break;
        }

        let seed = seed.map(|s| s.wrapping_add(u64::from(played)));
        let pending = scheduler::schedule_bot_reply(game.clone(), side, delay, seed);
        match pending.outcome().await {
            ReplyOutcome::Moved(_) => {
                played += 1;
                if let Some(record) = lock(&game).move_history.last() {
                    terminal::print_move(record);
                }
            }
            other => {
                log::warn!("self-play stopped: {:?}", other);
                break;
            }
        }
    }

    let game = lock(&game);
    terminal::print_board(&game.position);
    terminal::print_status(&game);
    terminal::print_game_result(&game);
    Ok(())
}
