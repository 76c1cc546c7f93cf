//! slate-engine - formula subsystem for the Slate spreadsheet.
//!
//! Provides everything a sheet needs to work with formulas without knowing
//! how cells are stored:
//!
//! - [`Position`] - A1-notation cell references (parsing, formatting, bounds)
//! - [`CellValue`] / [`EvalError`] - the evaluated value of a cell
//! - [`Formula`] - a parsed arithmetic expression over cell references
//! - [`ValueSource`] - the lookup seam the sheet implements for evaluation

pub mod formula;

pub use formula::{CellValue, EvalError, Formula, ParseError, Position, ValueSource};
