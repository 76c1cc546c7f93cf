//! The sheet: cell storage, dependency-graph maintenance, and printing.
//!
//! Every edit runs the same three steps - cycle check, content swap, edge
//! rewire plus cache invalidation - and nothing observes the sheet between
//! them. Two invariants fall out: the reference graph is acyclic after
//! every public call, and a memoized formula result always matches a fresh
//! evaluation.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};

use log::{debug, trace};
use slate_engine::{CellValue, Position, ValueSource};

use crate::cell::{Cell, Content};
use crate::error::{Result, SheetError};

/// The printable bounding box of a sheet.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Size {
    pub rows: usize,
    pub cols: usize,
}

/// An in-memory spreadsheet. Owns every cell, keyed by position; cells link
/// to each other by position only, never by reference.
#[derive(Debug, Default)]
pub struct Sheet {
    cells: HashMap<Position, Cell>,
}

impl Sheet {
    pub fn new() -> Sheet {
        Sheet::default()
    }

    /// Set the cell at `pos` from raw input text.
    ///
    /// `""` empties the cell, a leading `=` with at least one character
    /// after it is parsed as a formula, anything else is literal text. On a
    /// parse or cycle error the sheet is left exactly as it was.
    pub fn set_cell(&mut self, pos: Position, text: &str) -> Result<()> {
        self.check_position(pos)?;

        let candidate = Content::from_input(text)?;
        let refs: HashSet<Position> = candidate.referenced_cells().into_iter().collect();
        if self.creates_cycle(pos, &refs) {
            return Err(SheetError::CircularDependency);
        }

        self.commit(pos, candidate, refs);
        debug!("set {pos} to {text:?}");
        Ok(())
    }

    /// The cell stored at `pos`, if any.
    pub fn get_cell(&self, pos: Position) -> Result<Option<&Cell>> {
        self.check_position(pos)?;
        Ok(self.cells.get(&pos))
    }

    /// The evaluated value at `pos`, if a cell is stored there.
    pub fn get_value(&self, pos: Position) -> Result<Option<CellValue>> {
        self.check_position(pos)?;
        Ok(self.cells.get(&pos).map(|cell| cell.value(self)))
    }

    /// Empty the cell at `pos` and release it unless some formula still
    /// reads it - references must keep resolving to a real cell, even an
    /// empty one. Emptying runs through the same commit path as an edit so
    /// the old outgoing edges unwire and dependent caches drop.
    pub fn clear_cell(&mut self, pos: Position) -> Result<()> {
        self.check_position(pos)?;
        if !self.cells.contains_key(&pos) {
            return Ok(());
        }

        self.commit(pos, Content::Empty, HashSet::new());
        self.release_unreferenced([pos]);
        debug!("cleared {pos}");
        Ok(())
    }

    /// The bounding box `(1 + max row, 1 + max col)` over stored cells, or
    /// zero for an empty sheet. Empty cells retained for their dependents
    /// count too.
    pub fn printable_size(&self) -> Size {
        let mut size = Size::default();
        for pos in self.cells.keys() {
            size.rows = size.rows.max(pos.row + 1);
            size.cols = size.cols.max(pos.col + 1);
        }
        size
    }

    /// Write the evaluated values as a tab-separated grid covering the
    /// printable size. Cells that are absent or print as empty text emit
    /// nothing between the separators.
    pub fn print_values<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_grid(out, |sheet, cell| cell.value(sheet).to_string())
    }

    /// Write the raw cell texts as a tab-separated grid covering the
    /// printable size.
    pub fn print_texts<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.print_grid(out, |_, cell| cell.text())
    }

    /// Iterate over all stored cells in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (Position, &Cell)> + '_ {
        self.cells.iter().map(|(&pos, cell)| (pos, cell))
    }

    fn check_position(&self, pos: Position) -> Result<()> {
        if pos.is_valid() {
            Ok(())
        } else {
            Err(SheetError::InvalidPosition(pos))
        }
    }

    /// Swap `content` into the cell at `pos` (materializing it on first
    /// write), rewire both edge directions, and drop every cache the edit
    /// could have staled. Callers have already cycle-checked `refs`.
    fn commit(&mut self, pos: Position, content: Content, refs: HashSet<Position>) {
        let cell = self.cells.entry(pos).or_default();
        cell.content = content;

        self.rewire_references(pos, refs);
        self.invalidate_from(pos);
    }

    /// Whether pointing `pos` at `refs` would close a cycle: walks incoming
    /// `dependents` edges from `pos` looking for any member of `refs`. A
    /// self-reference is caught on the first visit. Referenced positions
    /// with no cell yet cannot sit on such a path; they fall out of the walk
    /// naturally.
    fn creates_cycle(&self, pos: Position, refs: &HashSet<Position>) -> bool {
        if refs.is_empty() {
            return false;
        }

        let mut visited = HashSet::new();
        let mut stack = vec![pos];
        while let Some(current) = stack.pop() {
            if refs.contains(&current) {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(cell) = self.cells.get(&current) {
                stack.extend(cell.dependents.iter().copied());
            }
        }
        false
    }

    /// Point `pos` at exactly `new_refs`: drop the old outgoing edges from
    /// both sides, add each new edge once, and materialize referenced cells
    /// that do not exist yet. Former targets left empty and unreferenced are
    /// released.
    fn rewire_references(&mut self, pos: Position, new_refs: HashSet<Position>) {
        let Some(cell) = self.cells.get_mut(&pos) else {
            return;
        };
        let old_refs = std::mem::take(&mut cell.references);

        for target in &old_refs {
            if let Some(target_cell) = self.cells.get_mut(target) {
                target_cell.dependents.remove(&pos);
            }
        }

        for &target in &new_refs {
            self.cells.entry(target).or_default().dependents.insert(pos);
        }
        if let Some(cell) = self.cells.get_mut(&pos) {
            cell.references = new_refs;
        }

        self.release_unreferenced(old_refs);
    }

    /// Release cells that are empty and no longer read by any formula.
    /// Candidates that regained an edge, hold content, or were never stored
    /// survive untouched.
    fn release_unreferenced(&mut self, candidates: impl IntoIterator<Item = Position>) {
        for pos in candidates {
            if let Some(cell) = self.cells.get(&pos) {
                if cell.is_empty() && !cell.is_referenced() {
                    self.cells.remove(&pos);
                    trace!("released empty cell {pos}");
                }
            }
        }
    }

    /// Drop memoized results of `origin` and everything that transitively
    /// depends on it. `origin` always forwards the walk even without a
    /// cache of its own; further up, a formula cell that had no cache stops
    /// the walk there - its dependents lost their caches when it lost its.
    /// Acyclicity bounds the traversal.
    fn invalidate_from(&self, origin: Position) {
        let mut stack = vec![(origin, true)];
        while let Some((pos, forced)) = stack.pop() {
            let Some(cell) = self.cells.get(&pos) else {
                continue;
            };
            if cell.invalidate_cache() || forced {
                stack.extend(cell.dependents.iter().map(|&dep| (dep, false)));
            }
        }
    }

    fn print_grid<W: Write>(
        &self,
        out: &mut W,
        render: impl Fn(&Sheet, &Cell) -> String,
    ) -> io::Result<()> {
        let size = self.printable_size();
        for row in 0..size.rows {
            for col in 0..size.cols {
                if col > 0 {
                    write!(out, "\t")?;
                }
                if let Some(cell) = self.cells.get(&Position::new(row, col)) {
                    if !cell.text().is_empty() {
                        write!(out, "{}", render(self, cell))?;
                    }
                }
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

impl ValueSource for Sheet {
    fn cell_value(&self, pos: Position) -> Option<CellValue> {
        self.cells.get(&pos).map(|cell| cell.value(self))
    }
}
