//! Prompt templates and placeholder resolution
//!
//! A template is plain text with `{{KEY}}` placeholders. Values come from
//! markers in the notebook cells at or above the cell being worked on:
//!
//! ```text
//! <!-- prompt: task -->
//! Write a function that reverses a string.
//!
//! <!-- prompt: context:start -->
//! ...several cells of background...
//! <!-- prompt: context:end -->
//!
//! # prompt: solution            (alone on a line in a code cell)
//! prompt: cell:-1               (current cell only; live text of the cell above)
//! ```
//!
//! [`resolve_placeholders`] turns those markers into a [`PlaceholderMap`],
//! and [`fill_template`] substitutes it into a template.

mod config;
mod filler;
mod registry;
mod resolver;

pub use config::{FillConfig, ResolverConfig};
pub use filler::{
    collapse_blank_lines, fill_template, fill_template_with_config, template_placeholder_keys,
};
pub use registry::{TemplateDefinition, TemplateError, TemplateRegistry};
pub use resolver::{
    resolve_placeholders, resolve_placeholders_with_config, Placeholder, PlaceholderMap,
    PlaceholderValue,
};
