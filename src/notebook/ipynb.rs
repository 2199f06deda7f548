//! nbformat (`.ipynb`) loading

use serde::Deserialize;
use thiserror::Error;

use super::{Cell, CellKind, Notebook};

/// Errors that can occur when loading a notebook file
#[derive(Error, Debug)]
pub enum NotebookLoadError {
    #[error("Failed to read notebook file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse notebook JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[derive(Deserialize)]
struct JsonNotebook {
    #[serde(default)]
    cells: Vec<JsonCell>,
}

#[derive(Deserialize)]
struct JsonCell {
    cell_type: String,
    #[serde(default)]
    source: JsonSource,
}

/// nbformat stores cell source either as one string or as a list of lines
#[derive(Deserialize)]
#[serde(untagged)]
enum JsonSource {
    Text(String),
    Lines(Vec<String>),
}

impl Default for JsonSource {
    fn default() -> Self {
        JsonSource::Text(String::new())
    }
}

impl JsonSource {
    fn into_text(self) -> String {
        match self {
            JsonSource::Text(s) => s,
            // lines keep their trailing newlines in nbformat
            JsonSource::Lines(lines) => lines.concat(),
        }
    }
}

pub(super) fn parse(content: &str) -> Result<Notebook, NotebookLoadError> {
    let parsed: JsonNotebook = serde_json::from_str(content)?;
    let cells = parsed
        .cells
        .into_iter()
        .map(|c| {
            let kind = match c.cell_type.as_str() {
                "code" => CellKind::Code,
                _ => CellKind::Markup,
            };
            Cell::new(kind, c.source.into_text())
        })
        .collect();
    Ok(Notebook::new(cells))
}
