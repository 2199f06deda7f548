//! Marker tokenizer and cell address grammar

mod grammar;
pub mod lexer;

pub use grammar::parse_address;
pub use lexer::{scan_markers, scan_placeholders, Marker, MarkerKind, Span};
