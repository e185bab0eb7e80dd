//! Error types for malformed boards and illegal moves.

use thiserror::Error;

/// Errors raised while building or mutating a board.
///
/// A full board is not an error: move selection reports it as "no move".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EngineError {
    #[error("board must have 9 cells, got {got}")]
    InvalidBoardLength { got: usize },

    #[error("invalid marker '{marker}' at cell {index} (expected \"X\", \"O\" or empty)")]
    InvalidMarker { index: usize, marker: String },

    #[error("coordinate ({row}, {col}) is outside the 3x3 grid")]
    OutOfBounds { row: usize, col: usize },

    #[error("cell ({row}, {col}) is already occupied")]
    CellOccupied { row: usize, col: usize },

    #[error("invalid piece counts: X={x_count}, O={o_count} (must differ by at most one)")]
    InvalidPieceCounts { x_count: usize, o_count: usize },
}

pub type Result<T> = std::result::Result<T, EngineError>;
