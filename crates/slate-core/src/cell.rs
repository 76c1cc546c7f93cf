//! Cell content variants and their dependency edges.
//!
//! A cell is one of three contents - empty, literal text, or a formula with
//! a memoized result - plus both directions of the reference graph, keyed by
//! position and resolved through the sheet.

use std::cell::RefCell;
use std::collections::HashSet;

use slate_engine::{CellValue, Formula, ParseError, Position};

use crate::sheet::Sheet;

/// Marks input as a formula when it leads at least two characters.
pub const FORMULA_SIGN: char = '=';
/// Forces text interpretation of a literal that would otherwise read as a
/// formula or a number.
pub const ESCAPE_SIGN: char = '\'';

/// What a cell holds.
#[derive(Clone, Debug, Default)]
pub(crate) enum Content {
    #[default]
    Empty,
    /// The raw input string, never empty (empty input empties the cell).
    Text(String),
    Formula {
        formula: Formula,
        /// Memoized evaluation result. `GetValue` is semantically a read, so
        /// the cache mutates behind a shared reference; the engine is
        /// single-threaded by contract.
        cache: RefCell<Option<CellValue>>,
    },
}

impl Content {
    /// Build the candidate content for raw user input. A parse failure
    /// leaves the owning cell untouched because no cell is involved yet.
    pub(crate) fn from_input(input: &str) -> Result<Content, ParseError> {
        if input.is_empty() {
            Ok(Content::Empty)
        } else if input.len() >= 2 && input.starts_with(FORMULA_SIGN) {
            let formula = Formula::parse(&input[1..])?;
            Ok(Content::Formula { formula, cache: RefCell::new(None) })
        } else {
            // A lone "=" is ordinary text.
            Ok(Content::Text(input.to_string()))
        }
    }

    pub(crate) fn referenced_cells(&self) -> Vec<Position> {
        match self {
            Content::Formula { formula, .. } => formula.referenced_cells(),
            _ => Vec::new(),
        }
    }
}

/// A stored cell: content plus its edges in the dependency graph.
#[derive(Clone, Debug, Default)]
pub struct Cell {
    pub(crate) content: Content,
    /// Outgoing edges: positions this cell's formula reads.
    pub(crate) references: HashSet<Position>,
    /// Incoming edges: positions whose formulas read this cell.
    pub(crate) dependents: HashSet<Position>,
}

impl Cell {
    /// The evaluated value. Formula results are memoized until this cell or
    /// anything it reads is edited.
    pub fn value(&self, sheet: &Sheet) -> CellValue {
        match &self.content {
            Content::Empty => CellValue::Text(String::new()),
            Content::Text(raw) => match raw.strip_prefix(ESCAPE_SIGN) {
                Some(rest) => CellValue::Text(rest.to_string()),
                None => CellValue::Text(raw.clone()),
            },
            Content::Formula { formula, cache } => {
                if let Some(value) = cache.borrow().clone() {
                    return value;
                }
                let value = formula.evaluate(sheet);
                *cache.borrow_mut() = Some(value.clone());
                value
            }
        }
    }

    /// The text that reproduces this cell when set again: `""` for empty
    /// cells, the raw input for text, `=` plus the canonical expression for
    /// formulas.
    pub fn text(&self) -> String {
        match &self.content {
            Content::Empty => String::new(),
            Content::Text(raw) => raw.clone(),
            Content::Formula { formula, .. } => {
                format!("{}{}", FORMULA_SIGN, formula.expression())
            }
        }
    }

    /// The in-bounds positions this cell's formula reads, in formula order,
    /// duplicates included.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.content.referenced_cells()
    }

    /// Whether any formula in the sheet reads this cell.
    pub fn is_referenced(&self) -> bool {
        !self.dependents.is_empty()
    }

    /// Positions whose formulas read this cell.
    pub fn dependents(&self) -> impl Iterator<Item = Position> + '_ {
        self.dependents.iter().copied()
    }

    /// Positions this cell's formula reads, deduplicated.
    pub fn references(&self) -> impl Iterator<Item = Position> + '_ {
        self.references.iter().copied()
    }

    pub(crate) fn is_empty(&self) -> bool {
        matches!(self.content, Content::Empty)
    }

    /// Drops a memoized formula result. Returns true when dependents may
    /// still hold values derived from this cell and must be walked too:
    /// always for empty and text cells (they carry no cache of their own),
    /// and for formula cells only when there was a cache to drop - a
    /// cache-less formula already propagated its invalidation.
    pub(crate) fn invalidate_cache(&self) -> bool {
        match &self.content {
            Content::Formula { cache, .. } => cache.borrow_mut().take().is_some(),
            _ => true,
        }
    }

    #[cfg(test)]
    pub(crate) fn has_cache(&self) -> bool {
        match &self.content {
            Content::Formula { cache, .. } => cache.borrow().is_some(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Content;

    #[test]
    fn test_from_input_dispatch() {
        assert!(matches!(Content::from_input("").unwrap(), Content::Empty));
        assert!(matches!(Content::from_input("hello").unwrap(), Content::Text(_)));
        assert!(matches!(Content::from_input("42").unwrap(), Content::Text(_)));
        assert!(matches!(
            Content::from_input("=A1+1").unwrap(),
            Content::Formula { .. }
        ));
    }

    #[test]
    fn test_lone_equals_is_text() {
        match Content::from_input("=").unwrap() {
            Content::Text(raw) => assert_eq!(raw, "="),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_formula_is_an_error() {
        assert!(Content::from_input("=1+").is_err());
        assert!(Content::from_input("=)").is_err());
    }
}
