//! Move generation and validation for the chessroom engine.
//!
//! This module implements the rules layer the rest of the crate builds on:
//!
//! - Attack detection for every piece pattern (pawn, knight, king, sliders)
//! - Pseudo-legal destinations per piece, including the rule that a king may
//!   never step next to the enemy king
//! - Single-move validation with a distinct rejection reason per failure
//! - Full legal-move enumeration (same verdicts as `validate`)
//! - Applying a move, with pawn promotion
//!
//! Castling and en passant are not part of this rule set.

use crate::types::*;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a candidate move was rejected.
///
/// Validation stops at the first failing check, so each move maps to exactly
/// one variant. `KingNotFound` means the position itself is corrupt (zero or
/// several kings of one color) and should be reported as a data-integrity
/// problem rather than as a bad move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LegalityError {
    #[error("No piece at starting position {0}")]
    NoPieceAtSource(Square),
    #[error("Not your piece: it is {0}'s turn")]
    WrongSideToMove(Color),
    #[error("Must move to a different square")]
    NullMove,
    #[error("Cannot capture your own piece")]
    SelfCapture,
    #[error("Illegal move for this piece")]
    GeometricallyIllegal,
    #[error("Move leaves king in check")]
    ExposesKingToCheck,
    #[error("No unique {0} king on the board")]
    KingNotFound(Color),
}

impl LegalityError {
    /// Returns the rejection reason in the current locale.
    pub fn reason(&self) -> String {
        match self {
            LegalityError::NoPieceAtSource(sq) => {
                t!("rules.no_piece", square = sq.to_algebraic()).to_string()
            }
            LegalityError::WrongSideToMove(turn) => {
                t!("rules.wrong_side", color = turn.to_string()).to_string()
            }
            LegalityError::NullMove => t!("rules.null_move").to_string(),
            LegalityError::SelfCapture => t!("rules.self_capture").to_string(),
            LegalityError::GeometricallyIllegal => t!("rules.illegal_for_piece").to_string(),
            LegalityError::ExposesKingToCheck => t!("rules.exposes_king").to_string(),
            LegalityError::KingNotFound(color) => {
                t!("rules.king_not_found", color = color.to_string()).to_string()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Attack detection
// ---------------------------------------------------------------------------

/// Direction vectors for sliding pieces.
const ROOK_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DIRS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const QUEEN_DIRS: [(i8, i8); 8] = [
    (-1, 0), (1, 0), (0, -1), (0, 1),
    (-1, -1), (-1, 1), (1, -1), (1, 1),
];

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1), (0, -1),
    (0, 1), (1, -1), (1, 0), (1, 1),
];

/// Returns `true` if the given square is attacked by any piece of `attacker_color`.
///
/// The square need not be occupied. Attacks are purely geometric: a pinned
/// piece still attacks, and this never recurses into legality.
pub fn is_square_attacked(position: &Position, sq: Square, attacker_color: Color) -> bool {
    let is_attacker = |from: Square, kinds: &[PieceKind]| {
        matches!(
            position.get(from),
            Some(piece) if piece.color == attacker_color && kinds.contains(&piece.kind)
        )
    };

    // Pawns attack diagonally forward, so an attacking pawn sits one rank
    // behind the target from its own point of view.
    let dir = attacker_color.pawn_direction();
    for df in [-1i8, 1] {
        if let Some(from) = sq.offset(df, -dir)
            && is_attacker(from, &[PieceKind::Pawn])
        {
            return true;
        }
    }

    for &(df, dr) in &KNIGHT_OFFSETS {
        if let Some(from) = sq.offset(df, dr)
            && is_attacker(from, &[PieceKind::Knight])
        {
            return true;
        }
    }

    for &(df, dr) in &KING_OFFSETS {
        if let Some(from) = sq.offset(df, dr)
            && is_attacker(from, &[PieceKind::King])
        {
            return true;
        }
    }

    let rook_like = [PieceKind::Rook, PieceKind::Queen];
    let bishop_like = [PieceKind::Bishop, PieceKind::Queen];
    ROOK_DIRS
        .iter()
        .any(|&dir| first_piece_on_ray(position, sq, dir).is_some_and(|from| is_attacker(from, &rook_like)))
        || BISHOP_DIRS
            .iter()
            .any(|&dir| first_piece_on_ray(position, sq, dir).is_some_and(|from| is_attacker(from, &bishop_like)))
}

/// Walks from `sq` along `(df, dr)` and returns the first occupied square.
fn first_piece_on_ray(position: &Position, sq: Square, (df, dr): (i8, i8)) -> Option<Square> {
    let mut cur = sq;
    while let Some(next) = cur.offset(df, dr) {
        if position.get(next).is_some() {
            return Some(next);
        }
        cur = next;
    }
    None
}

/// Locates the king of the given color.
///
/// Zero kings and more than one king are both reported as `KingNotFound`.
pub fn find_king(position: &Position, color: Color) -> Result<Square, LegalityError> {
    let mut kings = position
        .pieces()
        .filter(|(_, p)| p.kind == PieceKind::King && p.color == color)
        .map(|(sq, _)| sq);

    match (kings.next(), kings.next()) {
        (Some(sq), None) => Ok(sq),
        (None, _) => Err(LegalityError::KingNotFound(color)),
        (Some(_), Some(_)) => {
            log::warn!("Position holds more than one {} king", color);
            Err(LegalityError::KingNotFound(color))
        }
    }
}

// ---------------------------------------------------------------------------
// Pseudo-legal move generation (before king-safety filtering)
// ---------------------------------------------------------------------------

/// Returns the geometrically reachable destinations of the piece on `from`.
///
/// Moves that would leave the mover's own king attacked are still included,
/// with one exception: a king never steps onto a square adjacent to the
/// enemy king. An empty `from` yields no destinations.
pub fn pseudo_moves(position: &Position, from: Square) -> Vec<Square> {
    let Some(piece) = position.get(from) else {
        return Vec::new();
    };

    let mut targets = Vec::with_capacity(16);
    match piece.kind {
        PieceKind::Pawn => pawn_targets(position, from, piece.color, &mut targets),
        PieceKind::Knight => step_targets(position, from, piece.color, &KNIGHT_OFFSETS, &mut targets),
        PieceKind::Bishop => sliding_targets(position, from, piece.color, &BISHOP_DIRS, &mut targets),
        PieceKind::Rook => sliding_targets(position, from, piece.color, &ROOK_DIRS, &mut targets),
        PieceKind::Queen => sliding_targets(position, from, piece.color, &QUEEN_DIRS, &mut targets),
        PieceKind::King => {
            step_targets(position, from, piece.color, &KING_OFFSETS, &mut targets);
            let enemy_king = Piece::new(PieceKind::King, piece.color.opponent());
            let enemy_kings: Vec<Square> = position
                .pieces()
                .filter(|&(_, p)| p == enemy_king)
                .map(|(sq, _)| sq)
                .collect();
            targets.retain(|to| !enemy_kings.iter().any(|&k| to.is_adjacent(k)));
        }
    }
    targets
}

/// Generates sliding piece targets (rook, bishop, queen).
fn sliding_targets(
    position: &Position,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
    targets: &mut Vec<Square>,
) {
    for &(df, dr) in directions {
        let mut cur = from;
        while let Some(to) = cur.offset(df, dr) {
            match position.get(to) {
                None => {
                    targets.push(to);
                    cur = to;
                }
                Some(blocker) => {
                    if blocker.color != color {
                        targets.push(to); // capture
                    }
                    break;
                }
            }
        }
    }
}

/// Generates single-step targets (knight and king patterns).
fn step_targets(
    position: &Position,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
    targets: &mut Vec<Square>,
) {
    for &(df, dr) in offsets {
        if let Some(to) = from.offset(df, dr) {
            match position.get(to) {
                Some(occupant) if occupant.color == color => {}
                _ => targets.push(to),
            }
        }
    }
}

/// Generates pawn targets (single and double advance, diagonal captures).
fn pawn_targets(position: &Position, from: Square, color: Color, targets: &mut Vec<Square>) {
    let dir = color.pawn_direction();

    if let Some(one_ahead) = from.offset(0, dir)
        && position.get(one_ahead).is_none()
    {
        targets.push(one_ahead);

        if from.rank() == color.pawn_start_rank()
            && let Some(two_ahead) = from.offset(0, dir * 2)
            && position.get(two_ahead).is_none()
        {
            targets.push(two_ahead);
        }
    }

    for df in [-1i8, 1] {
        if let Some(to) = from.offset(df, dir)
            && let Some(target) = position.get(to)
            && target.color != color
        {
            targets.push(to);
        }
    }
}

// ---------------------------------------------------------------------------
// Legality
// ---------------------------------------------------------------------------

/// Validates a single candidate move for `side`.
///
/// The checks run in a fixed order and the first failure is returned:
/// source occupied, right side, non-null, no self-capture, geometrically
/// reachable, and finally king safety on a simulated copy of the position.
/// The given position is never modified.
pub fn validate(
    position: &Position,
    from: Square,
    to: Square,
    side: Color,
) -> Result<(), LegalityError> {
    let piece = position
        .get(from)
        .ok_or(LegalityError::NoPieceAtSource(from))?;

    if piece.color != side {
        return Err(LegalityError::WrongSideToMove(side));
    }

    if from == to {
        return Err(LegalityError::NullMove);
    }

    if position.get(to).is_some_and(|target| target.color == side) {
        return Err(LegalityError::SelfCapture);
    }

    if !pseudo_moves(position, from).contains(&to) {
        return Err(LegalityError::GeometricallyIllegal);
    }

    king_safe_after(position, from, to, side)
}

/// Simulates `from → to` (without promotion) and checks that `side`'s king
/// is not attacked afterwards.
fn king_safe_after(
    position: &Position,
    from: Square,
    to: Square,
    side: Color,
) -> Result<(), LegalityError> {
    let simulated = simulate(position, from, to);
    let king_sq = find_king(&simulated, side)?;
    if is_square_attacked(&simulated, king_sq, side.opponent()) {
        Err(LegalityError::ExposesKingToCheck)
    } else {
        Ok(())
    }
}

/// Returns a copy of the position with the piece on `from` moved to `to`.
pub(crate) fn simulate(position: &Position, from: Square, to: Square) -> Position {
    let mut copy = position.clone();
    let piece = copy.get(from);
    copy.set(from, None);
    copy.set(to, piece);
    copy
}

/// Generates all legal moves for `side`.
///
/// Every pseudo-move of every piece of `side` is kept iff it passes the
/// king-safety check, which makes the result identical to calling
/// [`validate`] on each candidate. A position without a unique king for
/// `side` has no legal moves.
pub fn all_legal_moves(position: &Position, side: Color) -> Vec<ChessMove> {
    let mut legal = Vec::with_capacity(48);

    for (from, piece) in position.pieces() {
        if piece.color != side {
            continue;
        }
        for to in pseudo_moves(position, from) {
            if king_safe_after(position, from, to, side).is_ok() {
                legal.push(ChessMove::new(from, to));
            }
        }
    }

    legal
}

// ---------------------------------------------------------------------------
// Applying moves
// ---------------------------------------------------------------------------

/// Applies a move to a position in place.
///
/// The piece on `mv.from` replaces whatever stands on `mv.to`. A pawn that
/// reaches its promotion rank becomes `mv.promotion` when that is a valid
/// promotion kind, and a queen otherwise; a promotion on any other move is
/// ignored. An empty source square leaves the position untouched. Callers
/// are expected to have validated the move first.
pub fn apply_move_to_position(position: &mut Position, mv: &ChessMove) {
    let Some(piece) = position.get(mv.from) else {
        log::warn!("apply_move called with empty source square {}", mv.from);
        return;
    };

    let placed = if piece.kind == PieceKind::Pawn && mv.to.rank() == piece.color.promotion_rank() {
        let kind = mv
            .promotion
            .filter(|k| k.is_promotion_target())
            .unwrap_or(PieceKind::Queen);
        Piece::new(kind, piece.color)
    } else {
        piece
    };

    position.set(mv.from, None);
    position.set(mv.to, Some(placed));
}

/// Returns the position that results from playing `mv`.
pub fn apply_move(position: &Position, mv: &ChessMove) -> Position {
    let mut next = position.clone();
    apply_move_to_position(&mut next, mv);
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn piece(code: &str) -> Piece {
        Piece::from_code(code).unwrap()
    }

    fn board(pieces: &[(&str, &str)]) -> Position {
        let mut position = Position::default();
        for (s, code) in pieces {
            position.place(s, piece(code));
        }
        position
    }

    #[test]
    fn test_starting_position_has_20_moves() {
        let position = Position::starting_position();
        let moves = all_legal_moves(&position, Color::White);
        assert_eq!(moves.len(), 20, "White should have 20 legal moves in starting position");

        let pawn_moves = moves
            .iter()
            .filter(|m| position.get(m.from).unwrap().kind == PieceKind::Pawn)
            .count();
        assert_eq!(pawn_moves, 16);
    }

    #[test]
    fn test_black_has_20_moves_after_e4() {
        let position = apply_move(
            &Position::starting_position(),
            &ChessMove::new(sq("e2"), sq("e4")),
        );
        assert_eq!(all_legal_moves(&position, Color::Black).len(), 20);
    }

    #[test]
    fn test_pawn_does_not_attack_forward() {
        let position = board(&[("e4", "wp")]);
        assert!(!is_square_attacked(&position, sq("e5"), Color::White));
        assert!(is_square_attacked(&position, sq("d5"), Color::White));
        assert!(is_square_attacked(&position, sq("f5"), Color::White));
        assert!(!is_square_attacked(&position, sq("d3"), Color::White));
    }

    #[test]
    fn test_black_pawn_attacks_downward() {
        let position = board(&[("e5", "bp")]);
        assert!(is_square_attacked(&position, sq("d4"), Color::Black));
        assert!(is_square_attacked(&position, sq("f4"), Color::Black));
        assert!(!is_square_attacked(&position, sq("d6"), Color::Black));
    }

    #[test]
    fn test_slider_attack_blocked() {
        let position = board(&[("a1", "wr"), ("a4", "bp"), ("h8", "wb")]);
        assert!(is_square_attacked(&position, sq("a4"), Color::White));
        assert!(!is_square_attacked(&position, sq("a5"), Color::White));
        assert!(is_square_attacked(&position, sq("h1"), Color::White));
        assert!(is_square_attacked(&position, sq("b2"), Color::White));
        assert!(!is_square_attacked(&position, sq("b3"), Color::White));
    }

    #[test]
    fn test_knight_attack_at_edge() {
        let position = board(&[("a1", "bn")]);
        assert!(is_square_attacked(&position, sq("b3"), Color::Black));
        assert!(is_square_attacked(&position, sq("c2"), Color::Black));
        assert!(!is_square_attacked(&position, sq("c3"), Color::Black));
        assert!(!is_square_attacked(&position, sq("b3"), Color::White));
    }

    #[test]
    fn test_pawn_double_step_blocked() {
        let position = board(&[("e2", "wp"), ("e4", "bn")]);
        assert_eq!(pseudo_moves(&position, sq("e2")), vec![sq("e3")]);

        let position = board(&[("e2", "wp"), ("e3", "bn")]);
        assert!(pseudo_moves(&position, sq("e2")).is_empty());
    }

    #[test]
    fn test_pawn_captures_only_enemies() {
        let position = board(&[("e4", "wp"), ("d5", "bp"), ("f5", "wn"), ("e5", "bp")]);
        assert_eq!(pseudo_moves(&position, sq("e4")), vec![sq("d5")]);
    }

    #[test]
    fn test_slider_stops_at_blockers() {
        let position = board(&[("d4", "wr"), ("d6", "bp"), ("f4", "wp")]);
        let targets = pseudo_moves(&position, sq("d4"));
        assert!(targets.contains(&sq("d5")));
        assert!(targets.contains(&sq("d6")));
        assert!(!targets.contains(&sq("d7")));
        assert!(targets.contains(&sq("e4")));
        assert!(!targets.contains(&sq("f4")));
        assert!(targets.contains(&sq("a4")));
        assert!(targets.contains(&sq("d1")));
    }

    #[test]
    fn test_empty_square_has_no_pseudo_moves() {
        let position = Position::starting_position();
        assert!(pseudo_moves(&position, sq("e4")).is_empty());
    }

    #[test]
    fn test_king_cannot_approach_enemy_king() {
        let position = board(&[("e4", "wk"), ("e6", "bk")]);
        let targets = pseudo_moves(&position, sq("e4"));
        assert!(!targets.contains(&sq("d5")));
        assert!(!targets.contains(&sq("e5")));
        assert!(!targets.contains(&sq("f5")));
        assert!(targets.contains(&sq("e3")));
        assert_eq!(
            validate(&position, sq("e4"), sq("e5"), Color::White),
            Err(LegalityError::GeometricallyIllegal)
        );
    }

    #[test]
    fn test_king_proximity_at_board_edge() {
        let position = board(&[("a1", "wk"), ("c2", "bk")]);
        assert_eq!(pseudo_moves(&position, sq("a1")), vec![sq("a2")]);
        assert_eq!(
            validate(&position, sq("a1"), sq("b2"), Color::White),
            Err(LegalityError::GeometricallyIllegal)
        );
    }

    #[test]
    fn test_validation_order() {
        let position = Position::starting_position();
        assert_eq!(
            validate(&position, sq("e4"), sq("e5"), Color::White),
            Err(LegalityError::NoPieceAtSource(sq("e4")))
        );
        assert_eq!(
            validate(&position, sq("e7"), sq("e5"), Color::White),
            Err(LegalityError::WrongSideToMove(Color::White))
        );
        assert_eq!(
            validate(&position, sq("e2"), sq("e2"), Color::White),
            Err(LegalityError::NullMove)
        );
        assert_eq!(
            validate(&position, sq("d1"), sq("e1"), Color::White),
            Err(LegalityError::SelfCapture)
        );
        assert_eq!(
            validate(&position, sq("e2"), sq("e5"), Color::White),
            Err(LegalityError::GeometricallyIllegal)
        );
        assert_eq!(validate(&position, sq("g1"), sq("f3"), Color::White), Ok(()));
    }

    #[test]
    fn test_pinned_piece_exposes_king() {
        let position = board(&[("e1", "wk"), ("e2", "wr"), ("e8", "bq"), ("a8", "bk")]);
        assert_eq!(
            validate(&position, sq("e2"), sq("d2"), Color::White),
            Err(LegalityError::ExposesKingToCheck)
        );
        assert_eq!(validate(&position, sq("e2"), sq("e5"), Color::White), Ok(()));
        assert_eq!(validate(&position, sq("e2"), sq("e8"), Color::White), Ok(()));
    }

    #[test]
    fn test_missing_king_is_reported() {
        let position = board(&[("a1", "wr"), ("h8", "bk")]);
        assert_eq!(
            validate(&position, sq("a1"), sq("a2"), Color::White),
            Err(LegalityError::KingNotFound(Color::White))
        );
        assert!(all_legal_moves(&position, Color::White).is_empty());
        assert_eq!(
            find_king(&position, Color::White),
            Err(LegalityError::KingNotFound(Color::White))
        );
    }

    #[test]
    fn test_two_kings_are_not_a_unique_king() {
        let position = board(&[("a1", "wk"), ("c1", "wk"), ("h8", "bk")]);
        assert_eq!(
            find_king(&position, Color::White),
            Err(LegalityError::KingNotFound(Color::White))
        );
        assert_eq!(find_king(&position, Color::Black), Ok(sq("h8")));
    }

    #[test]
    fn test_validate_does_not_mutate() {
        let position = board(&[("e1", "wk"), ("e2", "wr"), ("e8", "bq"), ("a8", "bk")]);
        let before = position.clone();
        let _ = validate(&position, sq("e2"), sq("d2"), Color::White);
        let _ = validate(&position, sq("e2"), sq("e8"), Color::White);
        let _ = all_legal_moves(&position, Color::White);
        assert_eq!(position, before);
    }

    #[test]
    fn test_enumeration_matches_validation() {
        let position = board(&[
            ("e1", "wk"), ("d1", "wq"), ("c4", "wb"), ("e4", "wp"), ("f3", "wn"),
            ("e8", "bk"), ("d8", "bq"), ("b4", "bb"), ("e5", "bp"), ("c6", "bn"),
        ]);
        for side in [Color::White, Color::Black] {
            let legal = all_legal_moves(&position, side);
            for from in Square::all() {
                for to in Square::all() {
                    let accepted = validate(&position, from, to, side).is_ok();
                    let listed = legal.contains(&ChessMove::new(from, to));
                    assert_eq!(accepted, listed, "{}{} for {}", from, to, side);
                }
            }
        }
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let position = board(&[("a7", "wp"), ("e1", "wk"), ("h8", "bk")]);
        let next = apply_move(&position, &ChessMove::new(sq("a7"), sq("a8")));
        assert_eq!(next.get(sq("a8")), Some(piece("wq")));
        assert_eq!(next.get(sq("a7")), None);

        let mut mv = ChessMove::new(sq("a7"), sq("a8"));
        mv.promotion = Some(PieceKind::Knight);
        assert_eq!(apply_move(&position, &mv).get(sq("a8")), Some(piece("wn")));

        mv.promotion = Some(PieceKind::King);
        assert_eq!(apply_move(&position, &mv).get(sq("a8")), Some(piece("wq")));
    }

    #[test]
    fn test_promotion_ignored_off_back_rank() {
        let position = board(&[("a2", "wp"), ("e1", "wk"), ("h8", "bk")]);
        let mut mv = ChessMove::new(sq("a2"), sq("a3"));
        mv.promotion = Some(PieceKind::Queen);
        assert_eq!(apply_move(&position, &mv).get(sq("a3")), Some(piece("wp")));
    }

    #[test]
    fn test_apply_capture_replaces_piece() {
        let position = board(&[("d4", "wr"), ("d6", "bp"), ("e1", "wk"), ("h8", "bk")]);
        let next = apply_move(&position, &ChessMove::new(sq("d4"), sq("d6")));
        assert_eq!(next.get(sq("d6")), Some(piece("wr")));
        assert_eq!(next.piece_count(), 3);
    }
}
