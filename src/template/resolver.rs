//! Placeholder resolution - builds a key/value map from the markers of a notebook
//!
//! Resolution runs four passes over the tokenized cells:
//!
//! 1. single-line markers at or above the current cell, nearest wins
//! 2. block start/end pairing over the whole notebook
//! 3. block contents for starts at or above the current cell, nearest wins
//! 4. cell-reference markers in the current cell only
//!
//! Any violation found by the passes aborts the whole resolution.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{ResolveError, StructuralError, Violation};
use crate::notebook::{CellAddress, CellSource};
use crate::parser::{scan_markers, Marker, MarkerKind};

use super::config::ResolverConfig;

/// Value of a resolved placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderValue {
    /// Static text taken from a single-line or block declaration
    Text(String),
    /// Address of a cell whose live text is substituted at fill time
    CellReference(CellAddress),
}

/// A resolved placeholder and where it was declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Index of the declaring cell
    pub cell: usize,
    /// Distance from the declaring cell up to the current cell
    pub distance: usize,
    pub value: PlaceholderValue,
}

/// Placeholder values resolved for one current cell
#[derive(Debug, Clone)]
pub struct PlaceholderMap {
    current_cell: usize,
    entries: HashMap<String, Placeholder>,
    warnings: Vec<Violation>,
}

impl PlaceholderMap {
    fn new(current_cell: usize) -> Self {
        Self {
            current_cell,
            entries: HashMap::new(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn current_cell(&self) -> usize {
        self.current_cell
    }

    /// Get a resolved placeholder
    pub fn get(&self, key: &str) -> Option<&Placeholder> {
        self.entries.get(key)
    }

    /// Static text of a placeholder, `None` for unknown keys and cell references
    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key).map(|p| &p.value) {
            Some(PlaceholderValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Resolved keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Straddling blocks that were tolerated because rejection was disabled
    pub fn warnings(&self) -> &[Violation] {
        &self.warnings
    }

    /// Add a host-supplied value, as if declared in the current cell
    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(
            key.into(),
            Placeholder {
                cell: self.current_cell,
                distance: 0,
                value: PlaceholderValue::Text(value.into()),
            },
        );
    }

    /// Store a declaration unless a strictly nearer one is already present
    fn offer(&mut self, key: &str, cell: usize, value: PlaceholderValue) {
        let distance = self.current_cell - cell;
        if let Some(existing) = self.entries.get(key) {
            if existing.distance <= distance {
                debug!(
                    key,
                    cell,
                    kept = existing.cell,
                    "ignoring farther declaration"
                );
                return;
            }
        }
        debug!(key, cell, distance, "placeholder declared");
        self.entries.insert(
            key.to_string(),
            Placeholder {
                cell,
                distance,
                value,
            },
        );
    }
}

/// Resolve the placeholders visible from `current_cell` with default configuration
///
/// `referenced_keys` restricts which cell-reference markers are recorded;
/// named and block declarations are always collected.
pub fn resolve_placeholders<N: CellSource + ?Sized>(
    notebook: &N,
    current_cell: usize,
    referenced_keys: Option<&BTreeSet<String>>,
) -> Result<PlaceholderMap, ResolveError> {
    resolve_placeholders_with_config(
        notebook,
        current_cell,
        referenced_keys,
        &ResolverConfig::default(),
    )
}

/// Resolve the placeholders visible from `current_cell`
pub fn resolve_placeholders_with_config<N: CellSource + ?Sized>(
    notebook: &N,
    current_cell: usize,
    referenced_keys: Option<&BTreeSet<String>>,
    config: &ResolverConfig,
) -> Result<PlaceholderMap, ResolveError> {
    let count = notebook.cell_count();
    if current_cell >= count {
        return Err(ResolveError::CellOutOfRange {
            index: current_cell,
            count,
        });
    }

    let markers: Vec<Vec<Marker>> = (0..count)
        .map(|i| scan_markers(notebook.text_at(i).unwrap_or("")))
        .collect();

    let mut map = PlaceholderMap::new(current_cell);
    let mut violations = Vec::new();

    collect_single_line(notebook, &markers, &mut map);
    check_block_pairs(&markers, &mut violations);
    collect_blocks(notebook, &markers, config, &mut map, &mut violations);
    collect_cell_references(
        &markers[current_cell],
        referenced_keys,
        &mut map,
        &mut violations,
    );

    if !violations.is_empty() {
        warn!(
            current_cell,
            violations = violations.len(),
            "prompt marker validation failed"
        );
        return Err(StructuralError::new(violations).into());
    }

    Ok(map)
}

// ── Pass 1: single-line markers ───────────────────────────────────

fn collect_single_line<N: CellSource + ?Sized>(
    notebook: &N,
    markers: &[Vec<Marker>],
    map: &mut PlaceholderMap,
) {
    for cell in (0..=map.current_cell()).rev() {
        let text = notebook.text_at(cell).unwrap_or("");
        for marker in markers[cell].iter().filter(|m| m.kind == MarkerKind::Inline) {
            let value = text[marker.payload_offset()..].trim().to_string();
            map.offer(&marker.key, cell, PlaceholderValue::Text(value));
        }
    }
}

// ── Pass 2: block pairing ─────────────────────────────────────────

fn check_block_pairs(markers: &[Vec<Marker>], violations: &mut Vec<Violation>) {
    let mut open: HashMap<&str, usize> = HashMap::new();
    let mut starts: BTreeMap<&str, Vec<(usize, &Marker)>> = BTreeMap::new();

    for (cell, cell_markers) in markers.iter().enumerate() {
        for marker in cell_markers {
            match marker.kind {
                MarkerKind::BlockStart => {
                    *open.entry(marker.key.as_str()).or_default() += 1;
                    starts
                        .entry(marker.key.as_str())
                        .or_default()
                        .push((cell, marker));
                }
                MarkerKind::BlockEnd => match open.get_mut(marker.key.as_str()) {
                    Some(depth) if *depth > 0 => *depth -= 1,
                    _ => violations.push(Violation::UnmatchedBlockEnd {
                        key: marker.key.clone(),
                        cell,
                        span: marker.span.clone(),
                    }),
                },
                _ => {}
            }
        }
    }

    for (key, found) in starts {
        if let [_, (cell, second), ..] = found.as_slice() {
            violations.push(Violation::DuplicateBlockKey {
                key: key.to_string(),
                count: found.len(),
                cell: *cell,
                span: second.span.clone(),
            });
        }
    }
}

// ── Pass 3: block contents ────────────────────────────────────────

fn collect_blocks<N: CellSource + ?Sized>(
    notebook: &N,
    markers: &[Vec<Marker>],
    config: &ResolverConfig,
    map: &mut PlaceholderMap,
    violations: &mut Vec<Violation>,
) {
    let current = map.current_cell();
    let mut visited: HashSet<&str> = HashSet::new();

    for cell in (0..=current).rev() {
        for (pos, start) in markers[cell].iter().enumerate() {
            if start.kind != MarkerKind::BlockStart || !visited.insert(start.key.as_str()) {
                continue;
            }

            let Some((end_cell, end)) = find_block_end(markers, cell, pos, &start.key) else {
                violations.push(Violation::MissingBlockEnd {
                    key: start.key.clone(),
                    cell,
                    span: start.span.clone(),
                });
                continue;
            };

            if cell < current && end_cell >= current {
                let straddle = Violation::StraddlingBlock {
                    key: start.key.clone(),
                    cell,
                    span: start.span.clone(),
                    end_cell,
                };
                if config.reject_straddling_blocks {
                    violations.push(straddle);
                    continue;
                }
                warn!(key = %start.key, cell, end_cell, "block straddles the current cell");
                map.warnings.push(straddle);
            }

            let value = block_content(notebook, cell, start, end_cell, end, &config.block_separator);
            map.offer(&start.key, cell, PlaceholderValue::Text(value));
        }
    }
}

/// First end marker for `key` after the start marker at `markers[cell][pos]`
fn find_block_end<'m>(
    markers: &'m [Vec<Marker>],
    cell: usize,
    pos: usize,
    key: &str,
) -> Option<(usize, &'m Marker)> {
    let is_end = |m: &&Marker| m.kind == MarkerKind::BlockEnd && m.key == key;

    if let Some(end) = markers[cell][pos + 1..].iter().find(is_end) {
        return Some((cell, end));
    }
    markers
        .iter()
        .enumerate()
        .skip(cell + 1)
        .find_map(|(i, cell_markers)| cell_markers.iter().find(is_end).map(|m| (i, m)))
}

fn block_content<N: CellSource + ?Sized>(
    notebook: &N,
    start_cell: usize,
    start: &Marker,
    end_cell: usize,
    end: &Marker,
    separator: &str,
) -> String {
    let text_of = |i: usize| notebook.text_at(i).unwrap_or("");

    if start_cell == end_cell {
        return text_of(start_cell)[start.payload_offset()..end.span.start]
            .trim()
            .to_string();
    }

    let mut pieces = Vec::with_capacity(end_cell - start_cell + 1);
    pieces.push(&text_of(start_cell)[start.payload_offset()..]);
    pieces.extend((start_cell + 1..end_cell).map(text_of));
    pieces.push(&text_of(end_cell)[..end.span.start]);
    pieces.join(separator).trim().to_string()
}

// ── Pass 4: cell references in the current cell ───────────────────

fn collect_cell_references(
    markers: &[Marker],
    referenced_keys: Option<&BTreeSet<String>>,
    map: &mut PlaceholderMap,
    violations: &mut Vec<Violation>,
) {
    let current = map.current_cell();
    // key, occurrences, second occurrence
    let mut seen: Vec<(&str, usize, Option<&Marker>)> = Vec::new();

    for marker in markers.iter().filter(|m| m.kind == MarkerKind::CellRef) {
        if let Some(keys) = referenced_keys {
            if !keys.contains(&marker.key) {
                debug!(key = %marker.key, "cell reference not used by template");
                continue;
            }
        }

        if let Some((_, count, second)) = seen.iter_mut().find(|(k, _, _)| *k == marker.key) {
            *count += 1;
            if second.is_none() {
                *second = Some(marker);
            }
            continue;
        }
        seen.push((marker.key.as_str(), 1, None));

        match marker.key.parse::<CellAddress>() {
            Ok(address) => {
                map.entries.insert(
                    marker.key.clone(),
                    Placeholder {
                        cell: current,
                        distance: 0,
                        value: PlaceholderValue::CellReference(address),
                    },
                );
            }
            Err(e) => debug!(key = %marker.key, error = %e, "unusable cell reference"),
        }
    }

    for (key, count, second) in seen {
        if let Some(second) = second {
            violations.push(Violation::DuplicateCellReferenceKey {
                key: key.to_string(),
                count,
                cell: current,
                span: second.span.clone(),
            });
        }
    }
}
