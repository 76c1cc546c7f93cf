//! Formula compilation and evaluation against a cell-value source.

use super::ast::Expr;
use super::parser::{self, ParseError};
use super::position::Position;
use super::value::{CellValue, EvalError};

/// Read-only access to evaluated cell values, implemented by the sheet.
/// This is the only seam between the formula subsystem and cell storage.
pub trait ValueSource {
    /// The evaluated value of the cell at `pos`, or `None` when nothing is
    /// stored there.
    fn cell_value(&self, pos: Position) -> Option<CellValue>;
}

/// A parsed formula: the expression tree behind a `=`-prefixed cell.
#[derive(Clone, Debug, PartialEq)]
pub struct Formula {
    ast: Expr,
}

impl Formula {
    /// Parse `expression`, the formula text with the leading `=` already
    /// stripped.
    pub fn parse(expression: &str) -> Result<Formula, ParseError> {
        Ok(Formula { ast: parser::parse(expression)? })
    }

    /// Evaluate against `source`. Always returns `Number` or `Error`: any
    /// reference, coercion, or arithmetic failure is captured as a value
    /// rather than escaping as a Rust error.
    pub fn evaluate(&self, source: &dyn ValueSource) -> CellValue {
        let lookup = |pos: Position| -> Result<f64, EvalError> {
            if !pos.is_valid() {
                return Err(EvalError::Ref);
            }
            match source.cell_value(pos) {
                None => Ok(0.0),
                Some(CellValue::Number(n)) => Ok(n),
                Some(CellValue::Text(s)) => {
                    if s.is_empty() {
                        Ok(0.0)
                    } else {
                        // The whole string must read as a number; trailing
                        // garbage is a coercion failure, not a prefix parse.
                        s.parse::<f64>().map_err(|_| EvalError::Value)
                    }
                }
                Some(CellValue::Error(e)) => Err(e),
            }
        };
        match self.ast.evaluate(&lookup) {
            Ok(n) => CellValue::Number(n),
            Err(e) => CellValue::Error(e),
        }
    }

    /// Canonical textual form of the expression, without the leading `=`.
    pub fn expression(&self) -> String {
        self.ast.to_string()
    }

    /// The in-bounds positions the formula reads, in tree order. Duplicates
    /// are kept; the sheet deduplicates when wiring graph edges.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.ast
            .referenced_cells()
            .into_iter()
            .filter(|pos| pos.is_valid())
            .collect()
    }
}
