use std::collections::HashSet;

use chessroom::bot;
use chessroom::movegen::{self, LegalityError};
use chessroom::status::{self, GameStatus};
use chessroom::types::*;
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

/// Every square pair for `side`'s pieces, checked against the legal list.
fn assert_enumeration_matches_validation(position: &Position, side: Color) {
    let legal: HashSet<(Square, Square)> = movegen::all_legal_moves(position, side)
        .into_iter()
        .map(|mv| (mv.from, mv.to))
        .collect();

    for (from, piece) in position.pieces() {
        if piece.color != side {
            continue;
        }
        for to in Square::all() {
            let ok = movegen::validate(position, from, to, side).is_ok();
            assert_eq!(
                ok,
                legal.contains(&(from, to)),
                "{}{} disagrees with the legal move list",
                from,
                to
            );
        }
    }
}

fn arb_piece() -> impl Strategy<Value = Piece> {
    let kind = prop::sample::select(vec![
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
    ]);
    let color = prop::sample::select(vec![Color::White, Color::Black]);
    (kind, color).prop_map(|(kind, color)| Piece::new(kind, color))
}

/// Two kings that do not touch, plus up to ten other pieces.
fn arb_position() -> impl Strategy<Value = Position> {
    (
        0usize..64,
        0usize..64,
        prop::collection::vec((0usize..64, arb_piece()), 0..10),
    )
        .prop_filter_map("kings must not touch", |(wk, bk, others)| {
            let squares: Vec<Square> = Square::all().collect();
            let (wk, bk) = (squares[wk], squares[bk]);
            if wk == bk || wk.is_adjacent(bk) {
                return None;
            }
            let mut position = Position::default();
            for (i, piece) in others {
                let sq = squares[i];
                if sq != wk && sq != bk {
                    position.set(sq, Some(piece));
                }
            }
            position.set(wk, Some(Piece::new(PieceKind::King, Color::White)));
            position.set(bk, Some(Piece::new(PieceKind::King, Color::Black)));
            Some(position)
        })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 24, .. ProptestConfig::default() })]

    #[test]
    fn prop_random_playout_stays_consistent(seed in any::<u64>(), plies in 1usize..60) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut position = initial_position();
        let mut side = Color::White;

        for _ in 0..plies {
            let before = position.clone();
            assert_enumeration_matches_validation(&position, side);
            prop_assert_eq!(&position, &before);

            let legal = movegen::all_legal_moves(&position, side);
            let status = status::classify(&position, side).unwrap();
            if legal.is_empty() {
                prop_assert!(status.is_terminal());
                prop_assert_eq!(bot::choose(&position, side, &mut rng), None);
                break;
            }

            let bot_move = bot::choose(&position, side, &mut rng).unwrap();
            prop_assert!(legal.iter().any(|mv| mv.from == bot_move.from && mv.to == bot_move.to));
            prop_assert_eq!(&position, &before);

            let next = *legal.choose(&mut rng).unwrap();
            position = movegen::apply_move(&position, &next);
            side = side.opponent();

            // The mover's king is never left attacked.
            prop_assert_eq!(status::in_check(&position, side.opponent()), Ok(false));
            prop_assert!(
                !matches!(status, GameStatus::Checkmate { .. } | GameStatus::Stalemate),
                "playout continued past terminal status {:?}",
                status
            );
        }
    }

    #[test]
    fn prop_arbitrary_positions_stay_consistent(position in arb_position(), white in any::<bool>()) {
        let side = if white { Color::White } else { Color::Black };
        let before = position.clone();

        assert_enumeration_matches_validation(&position, side);
        prop_assert_eq!(&position, &before);

        let legal = movegen::all_legal_moves(&position, side);
        let status = status::classify(&position, side).unwrap();
        match status {
            GameStatus::Checkmate { winner } => {
                prop_assert!(legal.is_empty());
                prop_assert_eq!(winner, side.opponent());
                prop_assert_eq!(status::in_check(&position, side), Ok(true));
            }
            GameStatus::Stalemate => {
                prop_assert!(legal.is_empty());
                prop_assert_eq!(status::in_check(&position, side), Ok(false));
            }
            _ => prop_assert!(!legal.is_empty()),
        }

        let mut rng = StdRng::seed_from_u64(0);
        match bot::choose(&position, side, &mut rng) {
            Some(mv) => prop_assert!(legal.iter().any(|l| l.from == mv.from && l.to == mv.to)),
            None => prop_assert!(legal.is_empty()),
        }
    }

    #[test]
    fn prop_king_never_steps_next_to_enemy_king(position in arb_position()) {
        for side in [Color::White, Color::Black] {
            let enemy_king = movegen::find_king(&position, side.opponent()).unwrap();
            for mv in movegen::all_legal_moves(&position, side) {
                if position.get(mv.from).is_some_and(|p| p.kind == PieceKind::King) {
                    prop_assert!(!mv.to.is_adjacent(enemy_king));
                }
            }
        }
    }
}

#[test]
fn missing_king_is_reported_not_panicked() {
    let mut position = Position::default();
    position.place("a1", Piece::new(PieceKind::Rook, Color::White));
    position.place("h8", Piece::new(PieceKind::King, Color::Black));

    assert_eq!(
        status::classify(&position, Color::White),
        Err(LegalityError::KingNotFound(Color::White))
    );
    assert!(movegen::all_legal_moves(&position, Color::White).is_empty());
    assert_eq!(
        movegen::validate(
            &position,
            Square::from_algebraic("a1").unwrap(),
            Square::from_algebraic("a2").unwrap(),
            Color::White
        ),
        Err(LegalityError::KingNotFound(Color::White))
    );
}
