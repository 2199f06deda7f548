//! Read-only view of a notebook as an ordered sequence of typed cells
//!
//! The host owns the cells. Everything in this crate reads them through the
//! [`CellSource`] trait so an editor integration can expose its own document
//! model without copying it into a [`Notebook`].

mod address;
mod ipynb;

use std::path::Path;

pub use address::{resolve_absolute, resolve_relative, resolve_this, CellAddress};
pub use ipynb::NotebookLoadError;

/// Kind of a notebook cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    Code,
    Markup,
}

impl CellKind {
    /// Short filter suffix used in cell-reference keys (`cd` / `md`)
    pub fn filter_suffix(self) -> &'static str {
        match self {
            CellKind::Code => "cd",
            CellKind::Markup => "md",
        }
    }
}

/// A single notebook cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    pub text: String,
}

impl Cell {
    pub fn new(kind: CellKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    /// Create a code cell
    pub fn code(text: impl Into<String>) -> Self {
        Self::new(CellKind::Code, text)
    }

    /// Create a markup cell
    pub fn markup(text: impl Into<String>) -> Self {
        Self::new(CellKind::Markup, text)
    }
}

/// Host-side access to the cells of a notebook
///
/// Indices are 0-based document positions and must stay stable for the
/// duration of one resolve/fill pair.
pub trait CellSource {
    /// Number of cells in the notebook
    fn cell_count(&self) -> usize;

    /// Cell at a 0-based position
    fn cell_at(&self, index: usize) -> Option<&Cell>;

    /// Text of the cell at a position
    fn text_at(&self, index: usize) -> Option<&str> {
        self.cell_at(index).map(|c| c.text.as_str())
    }

    /// Kind of the cell at a position
    fn kind_at(&self, index: usize) -> Option<CellKind> {
        self.cell_at(index).map(|c| c.kind)
    }
}

impl CellSource for [Cell] {
    fn cell_count(&self) -> usize {
        self.len()
    }

    fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.get(index)
    }
}

impl CellSource for Vec<Cell> {
    fn cell_count(&self) -> usize {
        self.len()
    }

    fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.get(index)
    }
}

/// An owned notebook snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Notebook {
    cells: Vec<Cell>,
}

impl Notebook {
    /// Create a notebook from cells in document order
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// Append a cell at the end of the notebook
    pub fn push(&mut self, cell: Cell) {
        self.cells.push(cell);
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Mutable access to one cell, for hosts applying edits between passes
    pub fn cell_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Parse a notebook from nbformat (`.ipynb`) JSON
    pub fn from_ipynb_str(content: &str) -> Result<Self, NotebookLoadError> {
        ipynb::parse(content)
    }

    /// Load a notebook from an nbformat file on disk
    pub fn from_file(path: &Path) -> Result<Self, NotebookLoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ipynb_str(&content)
    }
}

impl From<Vec<Cell>> for Notebook {
    fn from(cells: Vec<Cell>) -> Self {
        Self::new(cells)
    }
}

impl CellSource for Notebook {
    fn cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_source_accessors() {
        let nb = Notebook::new(vec![Cell::markup("# Title"), Cell::code("x = 1")]);
        assert_eq!(nb.cell_count(), 2);
        assert_eq!(nb.text_at(1), Some("x = 1"));
        assert_eq!(nb.kind_at(0), Some(CellKind::Markup));
        assert_eq!(nb.cell_at(2), None);
    }

    #[test]
    fn test_slice_is_a_cell_source() {
        let cells = [Cell::code("a"), Cell::code("b")];
        let source: &[Cell] = &cells;
        assert_eq!(source.cell_count(), 2);
        assert_eq!(source.text_at(0), Some("a"));
    }

    #[test]
    fn test_cell_mut_edits_text() {
        let mut nb = Notebook::new(vec![Cell::code("old")]);
        nb.cell_mut(0).unwrap().text = "new".to_string();
        assert_eq!(nb.text_at(0), Some("new"));
    }

    #[test]
    fn test_filter_suffix() {
        assert_eq!(CellKind::Code.filter_suffix(), "cd");
        assert_eq!(CellKind::Markup.filter_suffix(), "md");
    }
}
