//! Turn orchestration on top of the rules engine.
//!
//! Tracks whose turn it is and whether a capture must be continued by the
//! piece that just moved. A chain found by the generator is one move, but
//! removing its captured pieces can open a new jump for the same piece; in
//! that case the same side moves again with that piece only.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::board::{Board, Color, Coord};
use crate::error::{EngineError, EngineResult};
use crate::movegen::{Move, MoveGenerator};
use crate::search::Search;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress { to_move: Color },
    /// The loser had no legal move on their turn.
    Won { winner: Color },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub played: Move,
    /// The same side must move again with the piece on `played.to`.
    pub continues: bool,
    pub status: GameStatus,
}

#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    move_generator: MoveGenerator,
    pending: Option<Coord>,
    history: Vec<Move>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::from_board(Board::new(), MoveGenerator::new())
    }

    /// Starts from an arbitrary position; the board's side to move moves first.
    pub fn from_board(board: Board, move_generator: MoveGenerator) -> Self {
        Self {
            board,
            move_generator,
            pending: None,
            history: Vec::new(),
        }
    }

    pub fn reset(&mut self) {
        self.board.initialize();
        self.pending = None;
        self.history.clear();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    /// Square of the piece that has to keep capturing, if any.
    pub fn pending_continuation(&self) -> Option<Coord> {
        self.pending
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn legal_moves(&self) -> Vec<Move> {
        match self.pending {
            Some(coord) => self
                .move_generator
                .legal_moves_from(&self.board, coord)
                .into_iter()
                .filter(Move::is_capture)
                .collect(),
            None => self.move_generator.legal_moves(&self.board, self.side_to_move()),
        }
    }

    pub fn status(&self) -> GameStatus {
        let to_move = self.side_to_move();
        if self.legal_moves().is_empty() {
            GameStatus::Won {
                winner: to_move.opposite(),
            }
        } else {
            GameStatus::InProgress { to_move }
        }
    }

    /// Validates and plays `mv` for the side to move. A rejected move leaves
    /// the game untouched.
    pub fn play(&mut self, mv: &Move) -> EngineResult<TurnOutcome> {
        let color = self.side_to_move();
        if !self.legal_moves().contains(mv) {
            self.move_generator.validate(&self.board, mv, color)?;
            let reason = match self.pending {
                Some(_) => "the piece that just captured must keep capturing",
                None => "not among the legal moves",
            };
            return Err(EngineError::illegal(mv, reason));
        }

        self.board.apply_move(mv);
        self.history.push(mv.clone());
        self.pending = None;

        let mut continues = false;
        if mv.is_capture() {
            let follow_ups = self.move_generator.legal_moves_from(&self.board, mv.to);
            if follow_ups.iter().any(Move::is_capture) {
                self.board.set_side_to_move(color);
                self.pending = Some(mv.to);
                continues = true;
                debug!(%color, square = %mv.to, "capture continues");
            }
        }

        Ok(TurnOutcome {
            played: mv.clone(),
            continues,
            status: self.status(),
        })
    }

    /// Lets the search pick and play a move for the side to move.
    pub fn engine_move(&mut self, search: &mut Search, depth: u32) -> EngineResult<TurnOutcome> {
        let color = self.side_to_move();
        let outcome = search.search_among(&self.board, color, depth, self.legal_moves())?;
        self.play(&outcome.best_move)
    }

    /// Uniformly random legal move, for diagnostics and as a sparring opponent.
    pub fn random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Move> {
        self.legal_moves().choose(rng).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sq(s: &str) -> Coord {
        s.parse().unwrap()
    }

    #[test]
    fn test_rejected_move_leaves_game_unchanged() {
        let mut game = Game::new();
        let before = game.board().clone();

        let backwards = Move::new(sq("c3"), sq("d2"));
        assert!(matches!(game.play(&backwards), Err(EngineError::IllegalMove { .. })));
        assert_eq!(game.board(), &before);
        assert!(game.history().is_empty());
        assert_eq!(game.side_to_move(), Color::White);
    }

    #[test]
    fn test_turn_passes_after_quiet_move() {
        let mut game = Game::new();
        let outcome = game.play(&Move::new(sq("c3"), sq("d4"))).unwrap();
        assert!(!outcome.continues);
        assert_eq!(outcome.status, GameStatus::InProgress { to_move: Color::Black });
        assert_eq!(game.side_to_move(), Color::Black);
    }

    #[test]
    fn test_capture_continues_when_removal_opens_a_jump() {
        // Jumping e5 and landing on f6 leaves e5 standing until the move is
        // done, so the long diagonal back toward b2 stays blocked. Once e5 is
        // lifted the king can take b2 as well.
        let board = Board::from_diagram(
            "......../......../......../....b.../......../..W...../.b....../......../w",
        )
        .unwrap();
        let mut game = Game::from_board(board, MoveGenerator::new());

        let first = Move::with_captures(sq("c3"), sq("f6"), vec![sq("e5")]);
        assert!(game.legal_moves().contains(&first));

        let outcome = game.play(&first).unwrap();
        assert!(outcome.continues);
        assert_eq!(game.pending_continuation(), Some(sq("f6")));
        assert_eq!(game.side_to_move(), Color::White);

        let follow_up = Move::with_captures(sq("f6"), sq("a1"), vec![sq("b2")]);
        assert_eq!(game.legal_moves(), vec![follow_up.clone()]);

        let outcome = game.play(&follow_up).unwrap();
        assert!(!outcome.continues);
        assert_eq!(game.pending_continuation(), None);
        assert_eq!(outcome.status, GameStatus::Won { winner: Color::White });
    }

    #[test]
    fn test_pending_continuation_restricts_moves() {
        let board = Board::from_diagram(
            "......../......../......../....b.../......../..W...../.b....../....w.../w",
        )
        .unwrap();
        let mut game = Game::from_board(board, MoveGenerator::new());
        game.play(&Move::with_captures(sq("c3"), sq("f6"), vec![sq("e5")]))
            .unwrap();

        let other_piece = Move::new(sq("e1"), sq("d2"));
        assert!(matches!(game.play(&other_piece), Err(EngineError::IllegalMove { .. })));
        assert_eq!(game.pending_continuation(), Some(sq("f6")));
    }

    #[test]
    fn test_other_capture_is_refused_while_a_chain_is_pending() {
        let board = Board::from_diagram(
            "......../......../......../....b.../......../..W...b./.b.....w/......../w",
        )
        .unwrap();
        let mut game = Game::from_board(board, MoveGenerator::new());
        let elsewhere = Move::with_captures(sq("h2"), sq("f4"), vec![sq("g3")]);
        assert!(game.legal_moves().contains(&elsewhere));

        game.play(&Move::with_captures(sq("c3"), sq("f6"), vec![sq("e5")]))
            .unwrap();
        assert_eq!(game.pending_continuation(), Some(sq("f6")));

        match game.play(&elsewhere) {
            Err(EngineError::IllegalMove { reason, .. }) => {
                assert!(reason.contains("keep capturing"), "{}", reason)
            }
            other => panic!("expected an illegal move, got {:?}", other),
        }
    }

    #[test]
    fn test_random_playout_reaches_a_result_or_keeps_going_legally() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut game = Game::new();
        for _ in 0..200 {
            let Some(mv) = game.random_move(&mut rng) else {
                break;
            };
            let outcome = game.play(&mv).unwrap();
            if let GameStatus::Won { winner } = outcome.status {
                assert_eq!(game.legal_moves().len(), 0);
                assert_eq!(winner, game.side_to_move().opposite());
                break;
            }
        }
    }

    #[test]
    fn test_engine_move_plays_for_side_to_move() {
        let mut game = Game::new();
        let mut search = Search::new();
        let outcome = game.engine_move(&mut search, 2).unwrap();
        assert_eq!(game.history().len(), 1);
        assert_eq!(game.board().piece_at(outcome.played.to).map(|p| p.color()), Some(Color::White));
    }
}
