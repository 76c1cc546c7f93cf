//! Error types for the Slate document model.

use slate_engine::{ParseError, Position};
use thiserror::Error;

/// Errors crossing the public sheet API. Evaluation failures never appear
/// here; they are values (`CellValue::Error`) inside cells.
#[derive(Error, Debug)]
pub enum SheetError {
    /// The given position lies outside the sheet bounds. Raised before any
    /// mutation.
    #[error("invalid position {0:?}")]
    InvalidPosition(Position),

    /// The text began with `=` and the rest failed to parse. The target
    /// cell keeps its previous state.
    #[error("formula error: {0}")]
    Formula(#[from] ParseError),

    /// The edit would close a reference cycle. The target cell keeps its
    /// previous state.
    #[error("circular dependency detected")]
    CircularDependency,
}

pub type Result<T> = std::result::Result<T, SheetError>;
