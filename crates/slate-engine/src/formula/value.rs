//! Evaluated cell values and their error kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why a formula failed to produce a number. The display strings are the
/// stable spreadsheet mnemonics and appear verbatim in printed output.
#[derive(Clone, Copy, Debug, Error, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum EvalError {
    /// A reference points outside the sheet bounds.
    #[error("#REF!")]
    Ref,
    /// A referenced text cell could not be read as a number.
    #[error("#VALUE!")]
    Value,
    /// Division by zero, or a non-finite arithmetic result.
    #[error("#ARITHM!")]
    Arithm,
}

/// The evaluated value of a cell: literal text, a number, or the error a
/// formula ran into. Formulas only ever produce `Number` or `Error`; `Text`
/// comes from literal cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Error(EvalError),
}

impl From<EvalError> for CellValue {
    fn from(error: EvalError) -> CellValue {
        CellValue::Error(error)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Error(e) => write!(f, "{}", e),
        }
    }
}
