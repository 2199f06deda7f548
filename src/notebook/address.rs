//! Cell addresses and their resolution against a notebook

use std::fmt;
use std::str::FromStr;

use crate::error::AddressError;
use crate::parser::parse_address;

use super::{CellKind, CellSource};

/// A reference to a cell, absolute or relative to the current cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellAddress {
    /// `cell:this`
    This,
    /// `cell:N`, `cell:N:md`, `cell:N:cd` (1-based, counting only `kind` cells when set)
    Absolute {
        position: usize,
        kind: Option<CellKind>,
    },
    /// `cell:+N`, `cell:-N`, optionally type-filtered
    Relative {
        offset: isize,
        kind: Option<CellKind>,
    },
}

impl CellAddress {
    /// Resolve this address to a cell index, relative to `current`
    ///
    /// Returns `None` when the address points outside the notebook or there
    /// are not enough cells of the requested kind.
    pub fn resolve<N: CellSource + ?Sized>(&self, notebook: &N, current: usize) -> Option<usize> {
        match *self {
            CellAddress::This => {
                (current < notebook.cell_count()).then(|| resolve_this(current))
            }
            CellAddress::Absolute { position, kind } => resolve_absolute(notebook, position, kind),
            CellAddress::Relative { offset, kind } => {
                resolve_relative(notebook, current, offset, kind)
            }
        }
    }

    /// Whether a placeholder key is written in the cell-reference family
    pub fn is_cell_key(key: &str) -> bool {
        key.starts_with("cell:")
    }
}

impl FromStr for CellAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s).map_err(|mut errs| {
            if errs.is_empty() {
                AddressError::new(0..s.len(), format!("invalid cell address '{}'", s))
            } else {
                errs.swap_remove(0)
            }
        })
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            CellAddress::This => return write!(f, "cell:this"),
            CellAddress::Absolute { position, kind } => {
                write!(f, "cell:{}", position)?;
                kind
            }
            CellAddress::Relative { offset, kind } => {
                write!(f, "cell:{:+}", offset)?;
                kind
            }
        };
        match kind {
            Some(k) => write!(f, ":{}", k.filter_suffix()),
            None => Ok(()),
        }
    }
}

/// Index of the `position`-th cell (1-based), counting only cells of `kind` when set
pub fn resolve_absolute<N: CellSource + ?Sized>(
    notebook: &N,
    position: usize,
    kind: Option<CellKind>,
) -> Option<usize> {
    if position == 0 {
        return None;
    }
    (0..notebook.cell_count())
        .filter(|&i| matches_kind(notebook, i, kind))
        .nth(position - 1)
}

/// Index `offset` cells away from `current`
///
/// Unfiltered, this is plain index arithmetic. With a `kind` filter the walk
/// starts just past `current` and counts only cells of that kind.
pub fn resolve_relative<N: CellSource + ?Sized>(
    notebook: &N,
    current: usize,
    offset: isize,
    kind: Option<CellKind>,
) -> Option<usize> {
    let count = notebook.cell_count();
    if current >= count {
        return None;
    }
    if offset == 0 {
        return Some(current);
    }

    let steps = offset.unsigned_abs();
    match kind {
        None => {
            let target = if offset > 0 {
                current.checked_add(steps)?
            } else {
                current.checked_sub(steps)?
            };
            (target < count).then_some(target)
        }
        Some(_) => {
            if offset > 0 {
                (current + 1..count)
                    .filter(|&i| matches_kind(notebook, i, kind))
                    .nth(steps - 1)
            } else {
                (0..current)
                    .rev()
                    .filter(|&i| matches_kind(notebook, i, kind))
                    .nth(steps - 1)
            }
        }
    }
}

/// The current cell itself
pub fn resolve_this(current: usize) -> usize {
    current
}

fn matches_kind<N: CellSource + ?Sized>(notebook: &N, index: usize, kind: Option<CellKind>) -> bool {
    match kind {
        None => true,
        Some(k) => notebook.kind_at(index) == Some(k),
    }
}
