use thiserror::Error;

use crate::board::Square;

/// Errors surfaced at the public boundary of `checkers_core`.
///
/// Board mutation primitives (`move_piece`, `remove`, `promote`) trust their
/// caller and never report errors; only the Explorer and `Game`, which
/// construct those calls themselves from validated state, need a typed
/// failure mode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    #[error("square {square} has no piece on it")]
    NotOccupied { square: Square },

    #[error("coordinates out of range: file {file}, rank {rank}")]
    InvalidCoordinates { file: i32, rank: i32 },
}
