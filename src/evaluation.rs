use serde::Deserialize;

use crate::board::{Board, Color, Coord, Piece, BOARD_SIZE};
use crate::error::{EngineError, EngineResult};
use crate::movegen::MoveGenerator;

/// Most pieces one side ever has on the board.
pub const PIECES_PER_SIDE: i64 = 12;

/// Quiet-move ceiling for one piece; a king on a long diagonal reaches 13 squares.
pub const MAX_MOVES_PER_PIECE: i64 = 13;

/// Evaluation weights. Scores are from `maximizing`'s point of view.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    // Material
    pub man_value: i32,
    pub king_value: i32,

    // Per-square desirability, higher toward the centre
    pub position_table: [[i32; 8]; 8],
    pub center_control_weight: i32,

    // Men only
    pub advancement_weight: i32,
    pub edge_penalty: i32,
    pub back_row_bonus: i32,

    pub mobility_weight: i32,

    // Piece-count difference, once few pieces remain
    pub endgame_threshold: i32,
    pub endgame_multiplier: i32,

    // Terminal sentinels
    pub win_score: i32,
    pub loss_score: i32,

    pub maximizing: Color,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            man_value: 100,
            king_value: 300,

            position_table: [
                [0, 1, 0, 1, 0, 1, 0, 1],
                [1, 0, 2, 0, 2, 0, 2, 0],
                [0, 2, 0, 3, 0, 3, 0, 2],
                [1, 0, 3, 0, 4, 0, 3, 0],
                [0, 3, 0, 4, 0, 3, 0, 1],
                [2, 0, 3, 0, 3, 0, 2, 0],
                [0, 2, 0, 2, 0, 2, 0, 1],
                [1, 0, 1, 0, 1, 0, 1, 0],
            ],
            center_control_weight: 2,

            advancement_weight: 3,
            edge_penalty: -10,
            back_row_bonus: 5,

            mobility_weight: 5,

            endgame_threshold: 8,
            endgame_multiplier: 50,

            win_score: 10_000,
            loss_score: -10_000,

            maximizing: Color::Black,
        }
    }
}

impl EvalWeights {
    /// Upper bound on the magnitude of any non-terminal score.
    ///
    /// Mobility is bounded by quiet-move counts; capture chains are assumed
    /// not to outnumber them.
    pub fn max_additive_score(&self) -> i64 {
        let table_peak = self
            .position_table
            .iter()
            .flatten()
            .map(|v| (*v as i64).abs())
            .max()
            .unwrap_or(0);
        let position = table_peak * (self.center_control_weight as i64).abs();

        let man = (self.man_value as i64).abs()
            + position
            + (BOARD_SIZE as i64 - 1) * (self.advancement_weight as i64).abs()
            + (self.edge_penalty as i64).abs()
            + (self.back_row_bonus as i64).abs();
        let king = (self.king_value as i64).abs() + position;

        let material = 2 * PIECES_PER_SIDE * man.max(king);
        let mobility = (self.mobility_weight as i64).abs() * PIECES_PER_SIDE * MAX_MOVES_PER_PIECE;
        let endgame =
            (self.endgame_multiplier as i64).abs() * (self.endgame_threshold as i64).max(0);

        material + mobility + endgame
    }

    /// Checks that the win/loss sentinels dominate every additive score.
    pub fn validate(&self) -> EngineResult<()> {
        let bound = self.max_additive_score();
        if (self.win_score as i64) <= bound {
            return Err(EngineError::InvalidConfig(format!(
                "win_score {} does not exceed the largest additive score {}",
                self.win_score, bound
            )));
        }
        if (self.loss_score as i64) >= -bound {
            return Err(EngineError::InvalidConfig(format!(
                "loss_score {} is not below the smallest additive score {}",
                self.loss_score, -bound
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Evaluator {
    weights: EvalWeights,
    move_generator: MoveGenerator,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            weights: EvalWeights::default(),
            move_generator: MoveGenerator::new(),
        }
    }

    /// Builds an evaluator, refusing weights whose sentinels can be outscored.
    pub fn with_weights(weights: EvalWeights, move_generator: MoveGenerator) -> EngineResult<Self> {
        weights.validate()?;
        Ok(Self {
            weights,
            move_generator,
        })
    }

    pub fn weights(&self) -> &EvalWeights {
        &self.weights
    }

    pub fn maximizing(&self) -> Color {
        self.weights.maximizing
    }

    pub fn evaluate(&self, board: &Board) -> i32 {
        let w = &self.weights;
        let max_side = w.maximizing;
        let min_side = max_side.opposite();

        let mut score = 0;
        let mut max_pieces = 0;
        let mut min_pieces = 0;

        for coord in Coord::all() {
            if let Some(piece) = board.piece_at(coord) {
                let value = self.piece_value(piece, coord);
                if piece.color() == max_side {
                    score += value;
                    max_pieces += 1;
                } else {
                    score -= value;
                    min_pieces += 1;
                }
            }
        }

        if max_pieces == 0 {
            return w.loss_score;
        }
        if min_pieces == 0 {
            return w.win_score;
        }

        // Mobility doubles as the stalemate check
        let max_moves = self.move_generator.legal_moves(board, max_side).len() as i32;
        let min_moves = self.move_generator.legal_moves(board, min_side).len() as i32;
        if max_moves == 0 {
            return w.loss_score;
        }
        if min_moves == 0 {
            return w.win_score;
        }
        score += (max_moves - min_moves) * w.mobility_weight;

        if max_pieces + min_pieces <= w.endgame_threshold {
            score += (max_pieces - min_pieces) * w.endgame_multiplier;
        }

        score
    }

    fn piece_value(&self, piece: Piece, coord: Coord) -> i32 {
        let w = &self.weights;
        let position = w.position_table[coord.row() as usize][coord.col() as usize]
            * w.center_control_weight;

        if piece.is_king() {
            return w.king_value + position;
        }

        let home_row = piece.color().home_row();
        let advancement = (coord.row() - home_row).abs() * w.advancement_weight;
        let edge = if coord.col() == 0 || coord.col() == BOARD_SIZE - 1 {
            w.edge_penalty
        } else {
            0
        };
        let back_row = if coord.row() == home_row {
            w.back_row_bonus
        } else {
            0
        };

        w.man_value + position + advancement + edge + back_row
    }
}
