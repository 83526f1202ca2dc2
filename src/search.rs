use tracing::{debug, trace};

use crate::board::{Board, Color};
use crate::error::{EngineError, EngineResult};
use crate::evaluation::Evaluator;
use crate::movegen::{Move, MoveGenerator};

/// Outside the range of every score the evaluator can produce.
const SCORE_INFINITY: i32 = i32::MAX;

pub const DEFAULT_DEPTH: u32 = 6;

/// Result of one root search. `score` is from the mover's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub best_move: Move,
    pub score: i32,
    pub nodes: u64,
}

/// Fixed-depth minimax with alpha-beta pruning.
///
/// Every explored move is applied to a private copy of the board, so the
/// caller's position is never touched.
#[derive(Debug, Clone)]
pub struct Search {
    evaluator: Evaluator,
    move_generator: MoveGenerator,
    max_depth: u32,
    nodes_searched: u64,
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Search {
    pub fn new() -> Self {
        Self::with_evaluator(Evaluator::new(), MoveGenerator::new())
    }

    pub fn with_evaluator(evaluator: Evaluator, move_generator: MoveGenerator) -> Self {
        Self {
            evaluator,
            move_generator,
            max_depth: DEFAULT_DEPTH,
            nodes_searched: 0,
        }
    }

    /// Best move for the side whose turn it is on `board`, at the configured depth.
    pub fn find_best_move(&mut self, board: &Board) -> EngineResult<Move> {
        self.best_move(board, self.max_depth)
    }

    pub fn best_move(&mut self, board: &Board, depth: u32) -> EngineResult<Move> {
        self.best_move_for(board, board.side_to_move(), depth)
    }

    pub fn best_move_for(&mut self, board: &Board, color: Color, depth: u32) -> EngineResult<Move> {
        self.search(board, color, depth).map(|outcome| outcome.best_move)
    }

    /// Scores every root move by searching the reply at `depth - 1` and keeps
    /// the first one with the strictly greatest score.
    pub fn search(&mut self, board: &Board, color: Color, depth: u32) -> EngineResult<SearchOutcome> {
        let moves = self.move_generator.legal_moves(board, color);
        self.search_among(board, color, depth, moves)
    }

    /// Root search restricted to `moves`, e.g. the continuations of a pending capture.
    pub fn search_among(
        &mut self,
        board: &Board,
        color: Color,
        depth: u32,
        moves: Vec<Move>,
    ) -> EngineResult<SearchOutcome> {
        self.nodes_searched = 0;

        if depth == 0 || moves.is_empty() {
            return Err(EngineError::NoLegalMoves { color });
        }

        let perspective = if color == self.evaluator.maximizing() { 1 } else { -1 };
        let mut best: Option<(Move, i32)> = None;

        for mv in moves {
            let mut board_copy = board.clone();
            board_copy.apply_move(&mv);

            let score = perspective
                * self.minimax(&board_copy, depth - 1, -SCORE_INFINITY, SCORE_INFINITY, color.opposite());
            trace!(%mv, score, "root move scored");

            if best.as_ref().map_or(true, |(_, best_score)| score > *best_score) {
                best = Some((mv, score));
            }
        }

        let (best_move, score) = best.ok_or(EngineError::NoLegalMoves { color })?;
        debug!(
            %color,
            depth,
            score,
            nodes = self.nodes_searched,
            best = %best_move,
            "search finished"
        );

        Ok(SearchOutcome {
            best_move,
            score,
            nodes: self.nodes_searched,
        })
    }

    fn minimax(&mut self, board: &Board, depth: u32, mut alpha: i32, mut beta: i32, side: Color) -> i32 {
        self.nodes_searched += 1;

        if depth == 0 {
            return self.evaluator.evaluate(board);
        }

        let moves = self.move_generator.legal_moves(board, side);
        if moves.is_empty() {
            return self.evaluator.evaluate(board);
        }

        if side == self.evaluator.maximizing() {
            let mut best_score = -SCORE_INFINITY;
            for mv in moves {
                let mut board_copy = board.clone();
                board_copy.apply_move(&mv);

                let score = self.minimax(&board_copy, depth - 1, alpha, beta, side.opposite());
                best_score = best_score.max(score);
                alpha = alpha.max(score);

                // Alpha-beta pruning
                if beta <= alpha {
                    break;
                }
            }
            best_score
        } else {
            let mut best_score = SCORE_INFINITY;
            for mv in moves {
                let mut board_copy = board.clone();
                board_copy.apply_move(&mv);

                let score = self.minimax(&board_copy, depth - 1, alpha, beta, side.opposite());
                best_score = best_score.min(score);
                beta = beta.min(score);

                if beta <= alpha {
                    break;
                }
            }
            best_score
        }
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn move_generator(&self) -> &MoveGenerator {
        &self.move_generator
    }

    pub fn set_max_depth(&mut self, depth: u32) {
        self.max_depth = depth;
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn get_nodes_searched(&self) -> u64 {
        self.nodes_searched
    }
}
