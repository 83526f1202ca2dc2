pub mod board;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod game;
pub mod movegen;
pub mod notation;
pub mod protocol;
pub mod search;

pub use board::{Board, Color, Coord, Piece};
pub use error::{EngineError, EngineResult};
pub use movegen::{Move, MoveGenerator, Rules};
pub use search::Search;

#[cfg(test)]
mod tests {
    use super::*;
    use evaluation::Evaluator;
    use movegen::perft;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn sq(s: &str) -> Coord {
        s.parse().unwrap()
    }

    fn board_with(pieces: &[(&str, Piece)], to_move: Color) -> Board {
        let mut board = Board::empty();
        for (square, piece) in pieces {
            board.place_piece(sq(square), *piece).unwrap();
        }
        board.set_side_to_move(to_move);
        board
    }

    #[test]
    fn test_initial_position() {
        let board = Board::new();
        let generator = MoveGenerator::new();

        assert_eq!(board.piece_count(Color::White), 12);
        assert_eq!(board.piece_count(Color::Black), 12);
        assert_eq!(board.side_to_move(), Color::White);

        // Both sides have the same seven opening moves, mirrored
        let white = generator.legal_moves(&board, Color::White);
        let black = generator.legal_moves(&board, Color::Black);
        assert_eq!(white.len(), 7);
        assert_eq!(black.len(), 7);

        for mv in &white {
            assert!(generator.is_legal(&board, mv, Color::White));
            assert_eq!(mv.from.row() - mv.to.row(), 1);
        }
        for mv in &black {
            assert_eq!(mv.to.row() - mv.from.row(), 1);
        }
    }

    #[test]
    fn test_perft_initial_position() {
        let board = Board::new();
        let generator = MoveGenerator::new();

        assert_eq!(perft(&generator, &board, Color::White, 1), 7);
        assert_eq!(perft(&generator, &board, Color::White, 2), 49);
        assert_eq!(perft(&generator, &board, Color::White, 3), 302);
    }

    fn rotated_with_colors_swapped(board: &Board) -> Board {
        let mut rotated = Board::empty();
        for coord in Coord::all() {
            if let Some(piece) = board.piece_at(coord) {
                let color = piece.color().opposite();
                let swapped = if piece.is_king() { Piece::king(color) } else { Piece::man(color) };
                let target = Coord::new(7 - coord.row(), 7 - coord.col()).unwrap();
                rotated.place_piece(target, swapped).unwrap();
            }
        }
        rotated.set_side_to_move(board.side_to_move().opposite());
        rotated
    }

    #[test]
    fn test_opening_moves_are_color_symmetric() {
        let board = Board::new();
        let generator = MoveGenerator::new();
        assert_eq!(rotated_with_colors_swapped(&board), {
            let mut black_first = board.clone();
            black_first.set_side_to_move(Color::Black);
            black_first
        });

        for mv in generator.legal_moves(&board, Color::White) {
            let flip = |c: Coord| Coord::new(7 - c.row(), 7 - c.col()).unwrap();
            let mirrored = Move::new(flip(mv.from), flip(mv.to));
            assert!(generator.is_legal(&board, &mirrored, Color::Black));

            let mut white_after = board.clone();
            white_after.apply_move(&mv);
            let mut black_after = board.clone();
            black_after.set_side_to_move(Color::Black);
            black_after.apply_move(&mirrored);
            assert_eq!(rotated_with_colors_swapped(&white_after), black_after);
        }
    }

    #[test]
    fn test_board_editing_and_highlights() {
        let mut board = Board::new();
        let c3 = sq("c3");

        board.set_highlighted(c3, true);
        assert!(board.tile(c3).is_highlighted());
        assert!(board.tile(c3).has_piece());
        board.clear_highlights();
        assert!(!board.tile(c3).is_highlighted());

        assert_eq!(board.remove_piece(c3), Some(Piece::man(Color::White)));
        assert!(board.is_empty(c3));
        assert!(!board.promote(c3));
        assert!(board.promote(sq("a1")));
        assert_eq!(board.piece_at(sq("a1")).map(|p| p.rank()), Some(board::Rank::King));

        assert!(matches!(
            board.place_piece(sq("a2"), Piece::man(Color::Black)),
            Err(EngineError::InvalidCoordinate { row: 6, col: 0 })
        ));
        assert!(Coord::new(8, 0).is_err());
        assert!(Coord::new(-1, 3).is_err());
    }

    #[test]
    fn test_legal_moves_are_idempotent() {
        let board = Board::new();
        let generator = MoveGenerator::new();
        assert_eq!(
            generator.legal_moves(&board, Color::Black),
            generator.legal_moves(&board, Color::Black)
        );
    }

    #[test]
    fn test_generated_moves_validate_during_random_playouts() {
        let generator = MoveGenerator::new();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..20 {
            let mut board = Board::new();
            for _ in 0..120 {
                let color = board.side_to_move();
                let moves = generator.legal_moves(&board, color);
                for mv in &moves {
                    assert!(
                        generator.is_legal(&board, mv, color),
                        "{} rejected on\n{}",
                        mv,
                        board
                    );
                }
                assert!(
                    moves.iter().all(Move::is_capture) || !generator.has_capture(&board, color),
                    "quiet move offered while a capture exists on\n{}",
                    board
                );
                let Some(mv) = moves.choose(&mut rng) else {
                    break;
                };
                board.apply_move(mv);
            }
        }
    }

    #[test]
    fn test_capture_is_mandatory() {
        let board = board_with(
            &[
                ("d4", Piece::man(Color::White)),
                ("a1", Piece::man(Color::White)),
                ("e5", Piece::man(Color::Black)),
            ],
            Color::White,
        );
        let generator = MoveGenerator::new();

        let moves = generator.legal_moves(&board, Color::White);
        assert_eq!(moves, vec![Move::with_captures(sq("d4"), sq("f6"), vec![sq("e5")])]);

        let quiet = Move::new(sq("a1"), sq("b2"));
        assert!(matches!(
            generator.validate(&board, &quiet, Color::White),
            Err(EngineError::IllegalMove { .. })
        ));
    }

    #[test]
    fn test_man_chains_three_captures() {
        let board = board_with(
            &[
                ("a1", Piece::man(Color::White)),
                ("b2", Piece::man(Color::Black)),
                ("b4", Piece::man(Color::Black)),
                ("b6", Piece::man(Color::Black)),
            ],
            Color::White,
        );
        let generator = MoveGenerator::new();

        let chain = Move::with_captures(sq("a1"), sq("c7"), vec![sq("b2"), sq("b4"), sq("b6")]);
        assert_eq!(generator.legal_moves(&board, Color::White), vec![chain.clone()]);

        // Stopping halfway is not a complete move
        let partial = Move::with_captures(sq("a1"), sq("c3"), vec![sq("b2")]);
        assert!(!generator.is_legal(&board, &partial, Color::White));

        let mut after = board.clone();
        after.apply_move(&chain);
        assert_eq!(after.piece_count(Color::Black), 0);
        assert_eq!(after.piece_at(sq("c7")), Some(Piece::man(Color::White)));
        assert_eq!(after.side_to_move(), Color::Black);
    }

    #[test]
    fn test_men_capture_forward_only_by_default() {
        let pieces = [
            ("c5", Piece::man(Color::White)),
            ("d4", Piece::man(Color::Black)),
        ];
        let board = board_with(&pieces, Color::White);

        let default_rules = MoveGenerator::new();
        let moves = default_rules.legal_moves(&board, Color::White);
        assert!(moves.iter().all(|mv| !mv.is_capture()));
        assert_eq!(moves.len(), 2);

        let backwards = MoveGenerator::with_rules(Rules {
            men_capture_backwards: true,
            ..Rules::default()
        });
        assert_eq!(
            backwards.legal_moves(&board, Color::White),
            vec![Move::with_captures(sq("c5"), sq("e3"), vec![sq("d4")])]
        );
    }

    #[test]
    fn test_longest_capture_rule() {
        let board = board_with(
            &[
                ("a1", Piece::man(Color::White)),
                ("b2", Piece::man(Color::Black)),
                ("b4", Piece::man(Color::Black)),
                ("b6", Piece::man(Color::Black)),
                ("g3", Piece::man(Color::White)),
                ("f4", Piece::man(Color::Black)),
            ],
            Color::White,
        );
        let short = Move::with_captures(sq("g3"), sq("e5"), vec![sq("f4")]);
        let long = Move::with_captures(sq("a1"), sq("c7"), vec![sq("b2"), sq("b4"), sq("b6")]);

        let free_choice = MoveGenerator::new();
        let moves = free_choice.legal_moves(&board, Color::White);
        assert_eq!(moves.len(), 2);
        assert!(moves.contains(&short) && moves.contains(&long));

        let longest = MoveGenerator::with_rules(Rules {
            longest_capture_mandatory: true,
            ..Rules::default()
        });
        assert_eq!(longest.legal_moves(&board, Color::White), vec![long]);
        assert!(!longest.is_legal(&board, &short, Color::White));
    }

    #[test]
    fn test_promotion_then_king_slides() {
        let mut board = board_with(
            &[
                ("c7", Piece::man(Color::White)),
                ("g1", Piece::man(Color::Black)),
            ],
            Color::White,
        );
        let generator = MoveGenerator::new();

        board.apply_move(&Move::new(sq("c7"), sq("d8")));
        assert_eq!(board.piece_at(sq("d8")), Some(Piece::king(Color::White)));

        let slides = generator.legal_moves(&board, Color::White);
        assert_eq!(slides.len(), 7);
        assert!(slides.contains(&Move::new(sq("d8"), sq("h4"))));
        assert!(slides.contains(&Move::new(sq("d8"), sq("a5"))));
    }

    #[test]
    fn test_capture_onto_far_row_crowns() {
        let mut board = board_with(
            &[
                ("b6", Piece::man(Color::White)),
                ("c7", Piece::man(Color::Black)),
            ],
            Color::White,
        );
        board.apply_move(&Move::with_captures(sq("b6"), sq("d8"), vec![sq("c7")]));
        assert!(board.piece_at(sq("d8")).unwrap().is_king());
        assert!(board.is_empty(sq("c7")));
    }

    #[test]
    fn test_king_capture_offers_every_landing() {
        let board = board_with(
            &[
                ("a1", Piece::king(Color::White)),
                ("c3", Piece::man(Color::Black)),
            ],
            Color::White,
        );
        let generator = MoveGenerator::new();

        let moves = generator.legal_moves(&board, Color::White);
        let landings: Vec<String> = moves.iter().map(|mv| mv.to.to_string()).collect();
        assert_eq!(landings, vec!["d4", "e5", "f6", "g7", "h8"]);
        assert!(moves.iter().all(|mv| mv.captured == vec![sq("c3")]));
    }

    #[test]
    fn test_king_cannot_jump_two_pieces_in_a_row() {
        let board = board_with(
            &[
                ("a1", Piece::king(Color::White)),
                ("c3", Piece::man(Color::Black)),
                ("d4", Piece::man(Color::Black)),
            ],
            Color::White,
        );
        let generator = MoveGenerator::new();
        assert!(generator
            .legal_moves(&board, Color::White)
            .iter()
            .all(|mv| !mv.is_capture()));
    }

    #[test]
    fn test_king_chain_cannot_return_to_its_own_square() {
        // Four men around b4: the king's own square stays occupied until the
        // move completes, so the loop back onto b4 is closed.
        let board = board_with(
            &[
                ("b4", Piece::king(Color::White)),
                ("c5", Piece::man(Color::Black)),
                ("e5", Piece::man(Color::Black)),
                ("e3", Piece::man(Color::Black)),
                ("c3", Piece::man(Color::Black)),
            ],
            Color::White,
        );
        let generator = MoveGenerator::new();

        let moves = generator.legal_moves(&board, Color::White);
        assert!(moves.iter().all(|mv| mv.to != sq("b4")));
        assert_eq!(moves.iter().map(|mv| mv.captured.len()).max(), Some(3));
        assert!(moves.contains(&Move::with_captures(
            sq("b4"),
            sq("d2"),
            vec![sq("c5"), sq("e5"), sq("e3")]
        )));

        let full_loop = Move::with_captures(
            sq("b4"),
            sq("b4"),
            vec![sq("c5"), sq("e5"), sq("e3"), sq("c3")],
        );
        assert!(matches!(
            generator.validate(&board, &full_loop, Color::White),
            Err(EngineError::IllegalMove { .. })
        ));
    }

    #[test]
    fn test_evaluation_sentinels() {
        let evaluator = Evaluator::new();
        let weights = evaluator.weights().clone();

        let only_black = board_with(&[("b6", Piece::man(Color::Black))], Color::White);
        assert_eq!(evaluator.evaluate(&only_black), weights.win_score);

        let only_white = board_with(&[("c3", Piece::man(Color::White))], Color::Black);
        assert_eq!(evaluator.evaluate(&only_white), weights.loss_score);

        // Black is stuck on White's back row
        let blocked = board_with(
            &[
                ("a1", Piece::man(Color::Black)),
                ("h8", Piece::man(Color::White)),
            ],
            Color::Black,
        );
        assert_eq!(evaluator.evaluate(&blocked), weights.loss_score);
    }

    #[test]
    fn test_evaluation_prefers_material() {
        let evaluator = Evaluator::new();
        assert_eq!(evaluator.evaluate(&Board::new()), 0);

        let even = board_with(
            &[
                ("b6", Piece::man(Color::Black)),
                ("g3", Piece::man(Color::White)),
            ],
            Color::Black,
        );
        let crowned = board_with(
            &[
                ("b6", Piece::king(Color::Black)),
                ("g3", Piece::man(Color::White)),
            ],
            Color::Black,
        );
        assert!(evaluator.evaluate(&crowned) > evaluator.evaluate(&even));
    }

    #[test]
    fn test_best_move_takes_the_only_capture() {
        let board = board_with(
            &[
                ("b6", Piece::man(Color::Black)),
                ("h8", Piece::man(Color::Black)),
                ("c5", Piece::man(Color::White)),
                ("a1", Piece::man(Color::White)),
            ],
            Color::Black,
        );
        let mut search = Search::new();
        let best = search.best_move(&board, 1).unwrap();
        assert_eq!(best, Move::with_captures(sq("b6"), sq("d4"), vec![sq("c5")]));
    }

    #[test]
    fn test_search_from_start_for_black() {
        let board = Board::new();
        let before = board.clone();
        let mut search = Search::new();

        let best = search.best_move_for(&board, Color::Black, 4).unwrap();
        assert_eq!(board.piece_at(best.from).map(|p| p.color()), Some(Color::Black));
        assert!(search.get_nodes_searched() > 0);
        assert_eq!(board, before);
    }

    fn plain_minimax(
        generator: &MoveGenerator,
        evaluator: &Evaluator,
        board: &Board,
        depth: u32,
        side: Color,
    ) -> i32 {
        let moves = generator.legal_moves(board, side);
        if depth == 0 || moves.is_empty() {
            return evaluator.evaluate(board);
        }
        let scores = moves.iter().map(|mv| {
            let mut child = board.clone();
            child.apply_move(mv);
            plain_minimax(generator, evaluator, &child, depth - 1, side.opposite())
        });
        if side == evaluator.maximizing() {
            scores.max().unwrap()
        } else {
            scores.min().unwrap()
        }
    }

    #[test]
    fn test_pruning_keeps_the_minimax_value() {
        let generator = MoveGenerator::new();
        let evaluator = Evaluator::new();
        let mut rng = StdRng::seed_from_u64(11);
        let depth = 3;
        let mut checked = 0;

        for _ in 0..6 {
            let mut board = Board::new();
            for ply in 0..60 {
                let color = board.side_to_move();
                let moves = generator.legal_moves(&board, color);
                if moves.is_empty() {
                    break;
                }

                if ply % 6 == 0 {
                    let perspective = if color == evaluator.maximizing() { 1 } else { -1 };
                    let expected = moves
                        .iter()
                        .map(|mv| {
                            let mut child = board.clone();
                            child.apply_move(mv);
                            perspective
                                * plain_minimax(&generator, &evaluator, &child, depth - 1, color.opposite())
                        })
                        .max()
                        .unwrap();

                    let mut search = Search::new();
                    let outcome = search.search(&board, color, depth).unwrap();
                    assert_eq!(outcome.score, expected, "on\n{}", board);
                    checked += 1;
                }

                let mv = moves.choose(&mut rng).unwrap().clone();
                board.apply_move(&mv);
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_search_is_deterministic() {
        let board = Board::new();
        let mut first = Search::new();
        let mut second = Search::new();
        assert_eq!(
            first.search(&board, Color::White, 3).unwrap(),
            second.search(&board, Color::White, 3).unwrap()
        );
    }

    #[test]
    fn test_search_without_moves_or_depth() {
        let mut search = Search::new();
        assert_eq!(
            search.best_move(&Board::new(), 0),
            Err(EngineError::NoLegalMoves { color: Color::White })
        );

        let no_white = board_with(&[("b6", Piece::man(Color::Black))], Color::White);
        assert_eq!(
            search.best_move(&no_white, 3),
            Err(EngineError::NoLegalMoves { color: Color::White })
        );
    }

    #[test]
    fn test_search_avoids_hanging_a_piece() {
        // c5-d4 walks into e3xc5
        let board = board_with(
            &[
                ("c5", Piece::man(Color::Black)),
                ("h8", Piece::man(Color::Black)),
                ("e3", Piece::man(Color::White)),
            ],
            Color::Black,
        );
        let mut search = Search::new();
        let outcome = search.search(&board, Color::Black, 2).unwrap();
        assert_ne!(outcome.best_move, Move::new(sq("c5"), sq("d4")));
        assert!(outcome.score > 0);
    }
}
