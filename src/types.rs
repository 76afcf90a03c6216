//! Core types for the chessroom engine.
//!
//! This module defines the data model every other component reasons about:
//! colors, piece kinds, squares, positions and moves. Positions are stored as
//! a flat 64-slot array, so "at most one piece per square" holds by
//! construction, and they serialize as the square → two-character-code map
//! used by room state (`{"e1": "wk", "e8": "bk"}`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// Piece & Color
// ---------------------------------------------------------------------------

/// Represents the color (side) of a chess piece or player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// The White side (starts on ranks 1–2, moves first).
    White,
    /// The Black side (starts on ranks 7–8).
    Black,
}

impl Color {
    /// Returns the opposite color.
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Returns the home rank index (0-based) for pawns of this color.
    /// White pawns start on rank 2 (index 1), Black on rank 7 (index 6).
    pub fn pawn_start_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Returns the promotion rank index (0-based), i.e. the opponent's back rank.
    pub fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Returns the direction pawns move: +1 for White, -1 for Black.
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// The first character of a piece code for this color.
    pub fn code(self) -> char {
        match self {
            Color::White => 'w',
            Color::Black => 'b',
        }
    }

    fn from_code(c: char) -> Option<Color> {
        match c {
            'w' => Some(Color::White),
            'b' => Some(Color::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

impl std::str::FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            other => Err(format!("Invalid color: {}", other)),
        }
    }
}

/// Represents a chess piece type (without color information).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// The second character of a piece code for this kind.
    pub fn code(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    fn from_code(c: char) -> Option<PieceKind> {
        match c {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Parses a promotion letter (`Q`, `R`, `B`, `N`, case-insensitive).
    pub fn from_promotion_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_uppercase() {
            'Q' => Some(PieceKind::Queen),
            'R' => Some(PieceKind::Rook),
            'B' => Some(PieceKind::Bishop),
            'N' => Some(PieceKind::Knight),
            _ => None,
        }
    }

    /// Whether a pawn may become this kind on promotion.
    pub fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceKind::Queen | PieceKind::Rook | PieceKind::Bishop | PieceKind::Knight
        )
    }
}

/// A chess piece with both kind and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    /// Creates a new piece.
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// Returns the two-character piece code, color first (e.g. `"wp"`, `"bk"`).
    pub fn code(self) -> String {
        let mut s = String::with_capacity(2);
        s.push(self.color.code());
        s.push(self.kind.code());
        s
    }

    /// Parses a two-character piece code.
    /// Returns `None` if the code is malformed.
    pub fn from_code(code: &str) -> Option<Self> {
        let mut chars = code.chars();
        let color = Color::from_code(chars.next()?)?;
        let kind = PieceKind::from_code(chars.next()?)?;
        if chars.next().is_some() {
            return None;
        }
        Some(Piece { kind, color })
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// Represents a square on the chessboard using 0-based file and rank indices.
///
/// - `file`: 0 (a) to 7 (h)
/// - `rank`: 0 (rank 1) to 7 (rank 8)
///
/// Fields are private so every `Square` is on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Creates a square from 0-based file and rank, or `None` if either is
    /// outside 0..8.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    /// 0 (a) to 7 (h).
    pub fn file(self) -> u8 {
        self.file
    }

    /// 0 (rank 1) to 7 (rank 8).
    pub fn rank(self) -> u8 {
        self.rank
    }

    /// Parses an algebraic notation string (e.g. "e4") into a `Square`.
    /// Returns `None` for invalid input.
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Square { file, rank })
        } else {
            None
        }
    }

    /// Converts the square to its algebraic notation string (e.g. "e4").
    pub fn to_algebraic(self) -> String {
        format!("{}{}", (b'a' + self.file) as char, self.rank + 1)
    }

    /// Returns a new square offset by `(df, dr)`, or `None` if it falls off the board.
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let f = self.file as i8 + df;
        let r = self.rank as i8 + dr;
        if (0..8).contains(&f) && (0..8).contains(&r) {
            Some(Square {
                file: f as u8,
                rank: r as u8,
            })
        } else {
            None
        }
    }

    /// Returns a flat index (0..63) for the square.
    pub fn index(self) -> usize {
        (self.rank as usize) * 8 + self.file as usize
    }

    /// Iterates over all 64 squares, a1, b1, ..., h8.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|rank| (0..8u8).map(move |file| Square { file, rank }))
    }

    /// Whether the two squares touch (including diagonally). A square is
    /// not adjacent to itself.
    pub fn is_adjacent(self, other: Square) -> bool {
        self != other && self.file.abs_diff(other.file) <= 1 && self.rank.abs_diff(other.rank) <= 1
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

// Squares serialize as their algebraic name so moves read naturally in JSON.
impl Serialize for Square {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_algebraic())
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Square::from_algebraic(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid square: {}", s)))
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A board position: which piece stands on which square.
///
/// Each element is `Option<Piece>`; `None` means the square is empty.
/// Index mapping: `rank * 8 + file` (both 0-based). The side to move is not
/// part of the position; callers pass it alongside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, String>",
    into = "BTreeMap<String, String>"
)]
pub struct Position {
    squares: [Option<Piece>; 64],
}

impl Default for Position {
    /// Returns an empty board.
    fn default() -> Self {
        Self {
            squares: [None; 64],
        }
    }
}

impl Position {
    /// Returns the piece at the given square, if any.
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// Sets (or clears) the piece at the given square.
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index()] = piece;
    }

    /// Places a piece on the square named in algebraic notation.
    /// Convenience for building positions by hand; invalid names are ignored.
    pub fn place(&mut self, square: &str, piece: Piece) {
        if let Some(sq) = Square::from_algebraic(square) {
            self.set(sq, Some(piece));
        }
    }

    /// Iterates over every occupied square and its piece.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.get(sq).map(|p| (sq, p)))
    }

    /// Number of pieces on the board.
    pub fn piece_count(&self) -> usize {
        self.squares.iter().filter(|s| s.is_some()).count()
    }

    /// Creates the standard starting position.
    pub fn starting_position() -> Self {
        let mut position = Position::default();

        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for (file, kind) in back_rank.into_iter().enumerate() {
            let file = file as u8;
            position.set(Square { file, rank: 0 }, Some(Piece::new(kind, Color::White)));
            position.set(Square { file, rank: 1 }, Some(Piece::new(PieceKind::Pawn, Color::White)));
            position.set(Square { file, rank: 6 }, Some(Piece::new(PieceKind::Pawn, Color::Black)));
            position.set(Square { file, rank: 7 }, Some(Piece::new(kind, Color::Black)));
        }

        position
    }

    /// Converts the position to the square → piece-code map (only occupied squares).
    pub fn to_map(&self) -> BTreeMap<String, String> {
        self.pieces()
            .map(|(sq, piece)| (sq.to_algebraic(), piece.code()))
            .collect()
    }

    /// Creates a position from the square → piece-code map.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, String> {
        let mut position = Position::default();
        for (sq_str, code) in map {
            let sq = Square::from_algebraic(sq_str)
                .ok_or_else(|| format!("Invalid square: {}", sq_str))?;
            let piece = Piece::from_code(code)
                .ok_or_else(|| format!("Invalid piece code '{}' on {}", code, sq_str))?;
            position.set(sq, Some(piece));
        }
        Ok(position)
    }
}

impl TryFrom<BTreeMap<String, String>> for Position {
    type Error = String;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Position::from_map(&map)
    }
}

impl From<Position> for BTreeMap<String, String> {
    fn from(position: Position) -> Self {
        position.to_map()
    }
}

/// Returns the standard starting layout.
pub fn initial_position() -> Position {
    Position::starting_position()
}

// ---------------------------------------------------------------------------
// Game result
// ---------------------------------------------------------------------------

/// The result of a completed game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// White wins (by checkmate or Black resignation).
    WhiteWins,
    /// Black wins (by checkmate or White resignation).
    BlackWins,
    /// The game is a draw.
    Draw,
}

impl GameResult {
    /// The result in which `color` wins.
    pub fn win_for(color: Color) -> Self {
        match color {
            Color::White => GameResult::WhiteWins,
            Color::Black => GameResult::BlackWins,
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::WhiteWins => write!(f, "1-0 (White wins)"),
            GameResult::BlackWins => write!(f, "0-1 (Black wins)"),
            GameResult::Draw => write!(f, "1/2-1/2 (Draw)"),
        }
    }
}

/// The reason a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEndReason {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    Resignation,
}

impl fmt::Display for GameEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEndReason::Checkmate => write!(f, "Checkmate"),
            GameEndReason::Stalemate => write!(f, "Stalemate"),
            GameEndReason::InsufficientMaterial => write!(f, "Insufficient material"),
            GameEndReason::Resignation => write!(f, "Resignation"),
        }
    }
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

/// A move from one square to another, with an optional promotion kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChessMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl ChessMove {
    /// Creates a move without a promotion choice.
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Parses coordinate input such as `e2e4`, `e2 e4` or `e7e8q`.
    pub fn parse(input: &str) -> Option<Self> {
        let input: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        if input.len() < 4 || input.len() > 5 || !input.is_ascii() {
            return None;
        }

        let from = Square::from_algebraic(&input[0..2].to_ascii_lowercase())?;
        let to = Square::from_algebraic(&input[2..4].to_ascii_lowercase())?;
        let promotion = match input.chars().nth(4) {
            Some(c) => Some(PieceKind::from_promotion_char(c)?),
            None => None,
        };

        Some(ChessMove {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for ChessMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "={}", promo.code().to_ascii_uppercase())?;
        }
        Ok(())
    }
}
