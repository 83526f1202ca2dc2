//! Error types for the rules and search engine.
//!
//! Move generation and evaluation are total over well-formed boards and never
//! fail; these errors come from boundary validation, notation parsing,
//! configuration and the search entry point.

use crate::board::Color;

/// Errors surfaced by the engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Coordinate outside the 8x8 board, or a light square where no piece may stand.
    #[error("invalid coordinate ({row}, {col})")]
    InvalidCoordinate { row: i32, col: i32 },

    /// A proposed move does not hold for the current board and color.
    #[error("illegal move {mv}: {reason}")]
    IllegalMove { mv: String, reason: String },

    /// The search was asked to move for a side that cannot move.
    #[error("no legal moves for {color}")]
    NoLegalMoves { color: Color },

    /// Square, move or diagram text could not be parsed.
    #[error("invalid notation: {0}")]
    InvalidNotation(String),

    /// Evaluation weights or configuration file are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    pub(crate) fn illegal(mv: impl ToString, reason: impl Into<String>) -> Self {
        EngineError::IllegalMove {
            mv: mv.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
