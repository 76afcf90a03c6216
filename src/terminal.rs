//! Terminal interface for chessroom.
//!
//! This module provides a command-line interface for playing against the
//! bot directly in the terminal. It supports:
//!
//! - Colored board display
//! - Interactive move input (coordinate notation)
//! - Game state display (check, move number, legal move count)
//! - Hints and resignation
//!
//! It also holds the printers used by the `selfplay` and `analyze`
//! subcommands.

use colored::Colorize;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::bot;
use crate::game::{Game, MoveRecord};
use crate::movegen;
use crate::scheduler::{self, ReplyOutcome};
use crate::status::{self, GameStatus};
use crate::types::*;

/// Settings for an interactive game.
#[derive(Debug, Clone)]
pub struct PlayOptions {
    /// The side the human plays.
    pub human: Color,
    /// How long the bot "thinks" before replying.
    pub bot_delay: Duration,
    /// Seed for the bot's tie-breaking.
    pub seed: Option<u64>,
}

/// Renders the board to the terminal with colors and piece symbols.
///
/// The board is displayed from White's perspective (rank 8 at top).
pub fn print_board(position: &Position) {
    println!();
    println!("  +---+---+---+---+---+---+---+---+");

    for rank in (0..8u8).rev() {
        print!("{} ", rank + 1);
        for file in 0..8u8 {
            let Some(sq) = Square::new(file, rank) else {
                continue;
            };
            let is_dark_square = (file + rank) % 2 == 0;

            let piece_str = match position.get(sq) {
                Some(piece) => {
                    let symbol = piece_symbol(piece).to_string();
                    if piece.color == Color::White {
                        symbol.white().bold().to_string()
                    } else {
                        symbol.blue().bold().to_string()
                    }
                }
                None if is_dark_square => "·".dimmed().to_string(),
                None => " ".to_string(),
            };

            print!("| {} ", piece_str);
        }
        println!("|");
        println!("  +---+---+---+---+---+---+---+---+");
    }
    println!("    a   b   c   d   e   f   g   h");
    println!();
}

/// Upper case for White, lower case for Black.
fn piece_symbol(piece: Piece) -> char {
    let c = piece.kind.code();
    match piece.color {
        Color::White => c.to_ascii_uppercase(),
        Color::Black => c,
    }
}

fn side_label(color: Color) -> colored::ColoredString {
    match color {
        Color::White => "White".white().bold(),
        Color::Black => "Black".blue().bold(),
    }
}

/// Prints the game status bar (turn, check, move number).
pub fn print_status(game: &Game) {
    print!(
        "{}",
        t!(
            "terminal.move_status",
            num = game.fullmove_number(),
            color = side_label(game.turn)
        ),
    );

    if game.is_check() {
        print!("  {}", t!("terminal.check").to_string().red().bold());
    }

    println!(
        "  {}",
        t!("terminal.legal_moves_count", count = game.legal_moves().len())
    );
    println!();
}

/// Prints the game result when the game ends.
pub fn print_game_result(game: &Game) {
    if let (Some(result), Some(reason)) = (&game.result, &game.end_reason) {
        println!();
        println!("{}", "═══════════════════════════════════".yellow());
        println!(
            "  {}: {}",
            t!("terminal.game_over_label").to_string().yellow().bold(),
            reason
        );
        println!(
            "{}",
            t!("terminal.result_label", result = result.to_string().green().bold())
        );
        println!("{}", "═══════════════════════════════════".yellow());
        println!();
    }
}

/// Prints available commands in the terminal.
pub fn print_help() {
    println!("{}", t!("terminal.cmd_header").to_string().yellow().bold());
    println!("  {}      - {}", "e2e4".green(), t!("terminal.cmd_move"));
    println!("  {}     - {}", "moves".green(), t!("terminal.cmd_moves"));
    println!("  {}      - {}", "board".green(), t!("terminal.cmd_board"));
    println!("  {}      - {}", "hint".green(), t!("terminal.cmd_hint"));
    println!("  {}    - {}", "resign".green(), t!("terminal.cmd_resign"));
    println!("  {}   - {}", "history".green(), t!("terminal.cmd_history"));
    println!("  {}      - {}", "json".green(), t!("terminal.cmd_json"));
    println!("  {}      - {}", "help".green(), t!("terminal.cmd_help"));
    println!("  {}      - {}", "quit".green(), t!("terminal.cmd_quit"));
    println!();
}

/// Prints one history entry as `12. Black e7e5 (x wp)`.
pub fn print_move(record: &MoveRecord) {
    let captured = record
        .captured
        .as_deref()
        .map(|c| format!(" (x {})", c))
        .unwrap_or_default();
    println!(
        "  {}. {} {}{}",
        record.move_number,
        side_label(record.side),
        record.notation.green(),
        captured
    );
}

/// Prints the move history.
pub fn print_history(game: &Game) {
    if game.move_history.is_empty() {
        println!("{}", t!("terminal.no_moves_yet"));
        return;
    }

    println!("{}", t!("terminal.move_history_label").to_string().yellow().bold());
    for record in &game.move_history {
        print_move(record);
    }
    println!();
}

fn print_moves(moves: &[ChessMove]) {
    println!(
        "{} {}",
        t!("terminal.legal_moves_header").to_string().yellow().bold(),
        t!("terminal.moves_count", count = moves.len())
    );
    for (i, mv) in moves.iter().enumerate() {
        if i > 0 && i % 8 == 0 {
            println!();
        }
        print!("  {}", mv.to_string().green());
    }
    println!();
    println!();
}

/// Prints legal moves, status and the bot's suggestion for `side`.
pub fn print_analysis(position: &Position, side: Color) -> Result<GameStatus, movegen::LegalityError> {
    let status = status::classify(position, side)?;

    print_board(position);
    println!("{}", t!("terminal.analysis_header", color = side_label(side)));
    println!("{}", t!("terminal.status_label", status = status.to_string().yellow()));
    print_moves(&movegen::all_legal_moves(position, side));

    match bot::choose_bot_move(position, side) {
        Some(mv) => println!("{}", t!("terminal.bot_suggestion", mv = mv.to_string().green())),
        None => println!("{}", t!("terminal.bot_no_move")),
    }
    Ok(status)
}

fn lock(game: &Mutex<Game>) -> MutexGuard<'_, Game> {
    game.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs the interactive terminal game against the bot.
///
/// Must be called from a blocking context; the bot's replies are scheduled
/// on `runtime`.
pub fn run_terminal_game(options: PlayOptions, runtime: tokio::runtime::Handle) {
    println!();
    println!("{}", "╔═══════════════════════════════════════╗".cyan());
    println!("{}", format!("║     {:<34}║", t!("terminal.banner_title")).cyan());
    println!("{}", format!("║     {:<34}║", t!("terminal.banner_subtitle")).cyan());
    println!("{}", "╚═══════════════════════════════════════╝".cyan());
    println!();
    println!("{}", t!("terminal.playing_as", color = side_label(options.human)));
    println!();

    let game = Arc::new(Mutex::new(Game::new()));
    let bot_side = options.human.opponent();
    let mut bot_plies = 0u64;

    print_help();
    {
        let game = lock(&game);
        print_board(&game.position);
        print_status(&game);
    }

    loop {
        let (over, turn) = {
            let game = lock(&game);
            (game.is_over(), game.turn)
        };

        if over {
            print_game_result(&lock(&game));
            break;
        }

        if turn == bot_side {
            println!("{}", t!("terminal.bot_thinking").to_string().dimmed());
            let seed = options.seed.map(|s| s.wrapping_add(bot_plies));
            bot_plies += 1;
            let pending = scheduler::schedule_bot_reply(game.clone(), bot_side, options.bot_delay, seed);

            match runtime.block_on(pending.outcome()) {
                ReplyOutcome::Moved(mv) => {
                    println!("{}", t!("terminal.bot_played", mv = mv.to_string().green()));
                    let game = lock(&game);
                    print_board(&game.position);
                    print_status(&game);
                }
                ReplyOutcome::NoLegalMove => {
                    println!("{}", t!("terminal.bot_no_move"));
                    break;
                }
                ReplyOutcome::Stale | ReplyOutcome::Cancelled => {}
            }
            continue;
        }

        print!("{} > ", side_label(turn));
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => {
                println!("{}", t!("terminal.input_error"));
                continue;
            }
        }
        let input = input.trim().to_lowercase();

        if input.is_empty() {
            continue;
        }

        let mut game = lock(&game);
        match input.as_str() {
            "quit" | "exit" | "q" => {
                println!("{}", t!("terminal.goodbye"));
                break;
            }
            "help" | "h" | "?" => print_help(),
            "board" | "b" => {
                print_board(&game.position);
                print_status(&game);
            }
            "moves" | "m" => print_moves(&game.legal_moves()),
            "hint" => match bot::choose_bot_move(&game.position, game.turn) {
                Some(mv) => println!("{}", t!("terminal.bot_suggestion", mv = mv.to_string().green())),
                None => println!("{}", t!("terminal.bot_no_move")),
            },
            "resign" | "r" => match game.resign(options.human) {
                Ok(()) => {}
                Err(e) => println!(
                    "{}: {}",
                    t!("terminal.error_label").to_string().red().bold(),
                    e.reason()
                ),
            },
            "history" => print_history(&game),
            "json" | "j" => match serde_json::to_string_pretty(&game.to_state_json()) {
                Ok(json) => println!("{}\n", json),
                Err(e) => println!("{}: {}", t!("terminal.error_label").to_string().red().bold(), e),
            },
            _ => {
                if ChessMove::parse(&input).is_none() {
                    println!(
                        "{}",
                        t!("terminal.unknown_cmd_hint", cmd = &input, help = "help".green())
                    );
                    continue;
                }
                match game.make_move_str(&input) {
                    Ok(_) => {
                        print_board(&game.position);
                        print_status(&game);
                    }
                    Err(e) => println!(
                        "{}: {}",
                        t!("terminal.illegal_move").to_string().red().bold(),
                        e.reason()
                    ),
                }
            }
        }
    }
}
