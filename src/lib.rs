//! Notebook Prompt - placeholder resolution and prompt assembly for notebook cells
//!
//! This library scans notebook cells for prompt markers, validates them, and
//! fills prompt templates with the declared values and live cell text.
//!
//! # Example
//!
//! ```rust
//! use notebook_prompt::{assemble_prompt, Cell, Notebook, PromptConfig};
//!
//! let notebook = Notebook::new(vec![
//!     Cell::markup("<!-- prompt: task -->\nReverse a string."),
//!     Cell::code("def rev(s):\n    return s[::-1]\n# prompt: cell:this"),
//! ]);
//!
//! let prompt = assemble_prompt(
//!     "Task: {{task}}\nStudent code:\n{{cell:this}}",
//!     &notebook,
//!     1,
//!     &PromptConfig::default(),
//! )
//! .unwrap();
//!
//! assert!(prompt.starts_with("Task: Reverse a string."));
//! assert!(prompt.contains("return s[::-1]"));
//! ```

pub mod config;
pub mod error;
pub mod notebook;
pub mod parser;
pub mod report;
pub mod template;

pub use config::{ConfigError, PromptConfig};
pub use error::{AddressError, ResolveError, StructuralError, Violation};
pub use notebook::{Cell, CellAddress, CellKind, CellSource, Notebook};
pub use report::{format_test_results, parse_report, TestOutcome, TestResult};
pub use template::{
    fill_template, resolve_placeholders, template_placeholder_keys, PlaceholderMap,
    TemplateRegistry,
};

use thiserror::Error;

/// Errors that can occur during prompt assembly
#[derive(Debug, Error)]
pub enum PromptError {
    /// Error during placeholder resolution
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// Error looking up or loading a template
    #[error("template error: {0}")]
    Template(#[from] template::TemplateError),
}

impl From<StructuralError> for PromptError {
    fn from(err: StructuralError) -> Self {
        PromptError::Resolve(ResolveError::Structural(err))
    }
}

/// Resolve the placeholders of `template` for `current_cell` and fill it
///
/// Only cell references the template actually uses are recorded, so unused
/// references in the current cell never cause duplicate errors.
pub fn assemble_prompt<N: CellSource + ?Sized>(
    template: &str,
    notebook: &N,
    current_cell: usize,
    config: &PromptConfig,
) -> Result<String, PromptError> {
    let map = resolve_for_template(template, notebook, current_cell, config)?;
    Ok(template::fill_template_with_config(
        template,
        &map,
        notebook,
        &config.fill,
    ))
}

/// Resolve only, keeping the map so the caller can add host values before filling
pub fn resolve_for_template<N: CellSource + ?Sized>(
    template: &str,
    notebook: &N,
    current_cell: usize,
    config: &PromptConfig,
) -> Result<PlaceholderMap, PromptError> {
    let keys = template_placeholder_keys(template);
    let map = template::resolve_placeholders_with_config(
        notebook,
        current_cell,
        Some(&keys),
        &config.resolver,
    )?;
    Ok(map)
}

/// Assemble a prompt from a registered template
pub fn assemble_from_registry<N: CellSource + ?Sized>(
    registry: &TemplateRegistry,
    template_id: &str,
    notebook: &N,
    current_cell: usize,
    config: &PromptConfig,
) -> Result<String, PromptError> {
    let def = registry.require(template_id)?;
    assemble_prompt(&def.body, notebook, current_cell, config)
}
