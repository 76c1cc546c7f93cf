//! Cell position parsing and formatting.
//!
//! Provides bidirectional conversion between spreadsheet-style cell names
//! (e.g., "A1", "AB27") and zero-indexed row/column coordinates, plus the
//! bounds check that decides whether a position can hold a real cell.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Exclusive upper bound for valid rows.
pub const MAX_ROWS: usize = 16_384;
/// Exclusive upper bound for valid columns.
pub const MAX_COLS: usize = 16_384;

/// A grid location as zero-indexed row and column.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Position {
        Position { row, col }
    }

    /// Whether the position lies inside the sheet bounds.
    pub fn is_valid(self) -> bool {
        self.row < MAX_ROWS && self.col < MAX_COLS
    }

    /// Parse a cell name, accepting only positions inside the sheet bounds.
    /// Returns None for lowercase letters, leading zeros, embedded
    /// whitespace, or coordinates at or past the bounds.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<Position> {
        Self::parse_a1(name).filter(|pos| pos.is_valid())
    }

    /// Shape-only parse of an A1-style name.
    ///
    /// Accepts any uppercase-letters-then-digits token without a leading
    /// zero and decodes it even when the coordinates fall outside the sheet
    /// bounds (saturating on overflow). The formula lexer needs this: a
    /// reference like `AAAAA1000000` must survive parsing and surface as
    /// `#REF!` at evaluation, so validity is left to the caller.
    pub(crate) fn parse_a1(name: &str) -> Option<Position> {
        let caps = a1_re().captures(name)?;
        let letters = &caps["letters"];
        let digits = &caps["digits"];

        let mut col_acc = 0usize;
        for c in letters.bytes() {
            let digit = (c - b'A') as usize + 1;
            col_acc = col_acc.saturating_mul(26).saturating_add(digit);
        }

        let mut row_acc = 0usize;
        for c in digits.bytes() {
            let digit = (c - b'0') as usize;
            row_acc = row_acc.saturating_mul(10).saturating_add(digit);
        }

        // The regex guarantees at least one letter and a nonzero row.
        Some(Position::new(row_acc - 1, col_acc - 1))
    }

    /// Convert a column index to spreadsheet-style letters (0 -> A, 25 -> Z,
    /// 26 -> AA).
    pub fn col_to_letters(col: usize) -> String {
        let mut result = String::new();
        let mut n = col as u128 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Z]+)(?<digits>[1-9][0-9]*)$")
            .expect("cell name regex must compile")
    })
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s)
            .filter(|pos| pos.is_valid())
            .ok_or_else(|| format!("Invalid cell name: {}", s))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Saturating keeps Display total for out-of-range positions; exact
        // round-tripping is only promised inside the bounds.
        write!(
            f,
            "{}{}",
            Position::col_to_letters(self.col),
            self.row.saturating_add(1)
        )
    }
}
