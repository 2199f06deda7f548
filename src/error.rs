//! Error types for marker validation and address parsing

use std::collections::BTreeSet;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::notebook::CellSource;
use crate::parser::Span;

/// A structural problem with the prompt markers of a notebook
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A block start with no end marker at or after it
    #[error("block '{key}' has no matching end marker")]
    MissingBlockEnd { key: String, cell: usize, span: Span },

    /// A block end with no open start marker before it
    #[error("end marker for block '{key}' has no open start marker")]
    UnmatchedBlockEnd { key: String, cell: usize, span: Span },

    /// More than one block start for the same key (location is the second one)
    #[error("block '{key}' is declared {count} times")]
    DuplicateBlockKey {
        key: String,
        count: usize,
        cell: usize,
        span: Span,
    },

    /// The same cell reference declared more than once in the current cell
    #[error("cell reference '{key}' is declared {count} times in the current cell")]
    DuplicateCellReferenceKey {
        key: String,
        count: usize,
        cell: usize,
        span: Span,
    },

    /// A block that starts above the current cell and ends at or below it
    #[error("block '{key}' starts above the current cell but ends in cell {end_cell}")]
    StraddlingBlock {
        key: String,
        cell: usize,
        span: Span,
        end_cell: usize,
    },
}

impl Violation {
    /// Placeholder key the violation is about
    pub fn key(&self) -> &str {
        match self {
            Self::MissingBlockEnd { key, .. }
            | Self::UnmatchedBlockEnd { key, .. }
            | Self::DuplicateBlockKey { key, .. }
            | Self::DuplicateCellReferenceKey { key, .. }
            | Self::StraddlingBlock { key, .. } => key,
        }
    }

    /// Index of the cell holding the offending marker
    pub fn cell(&self) -> usize {
        match self {
            Self::MissingBlockEnd { cell, .. }
            | Self::UnmatchedBlockEnd { cell, .. }
            | Self::DuplicateBlockKey { cell, .. }
            | Self::DuplicateCellReferenceKey { cell, .. }
            | Self::StraddlingBlock { cell, .. } => *cell,
        }
    }

    /// Byte range of the offending marker within its cell
    pub fn span(&self) -> &Span {
        match self {
            Self::MissingBlockEnd { span, .. }
            | Self::UnmatchedBlockEnd { span, .. }
            | Self::DuplicateBlockKey { span, .. }
            | Self::DuplicateCellReferenceKey { span, .. }
            | Self::StraddlingBlock { span, .. } => span,
        }
    }

    /// Format the violation with its cell's text as context using ariadne
    pub fn format<N: CellSource + ?Sized>(&self, notebook: &N, kind: ReportKind<'_>) -> String {
        let filename = format!("cell[{}]", self.cell());
        let source = notebook.text_at(self.cell()).unwrap_or("");
        let message = self.to_string();
        let color = match kind {
            ReportKind::Warning => Color::Yellow,
            _ => Color::Red,
        };

        let mut buf = Vec::new();
        let written = Report::build(kind, filename.as_str(), self.span().start)
            .with_message(&message)
            .with_label(
                Label::new((filename.as_str(), self.span().clone()))
                    .with_message(&message)
                    .with_color(color),
            )
            .finish()
            .write((filename.as_str(), Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => format!("{}: {}\n", filename, message),
        }
    }
}

/// All marker violations found in one resolution pass
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid prompt markers: {}", format_violations(.violations))]
pub struct StructuralError {
    violations: Vec<Violation>,
}

impl StructuralError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Offending keys, deduplicated and sorted
    pub fn keys(&self) -> BTreeSet<&str> {
        self.violations.iter().map(|v| v.key()).collect()
    }

    /// Render every violation against the notebook it came from
    pub fn format<N: CellSource + ?Sized>(&self, notebook: &N) -> String {
        self.violations
            .iter()
            .map(|v| v.format(notebook, ReportKind::Error))
            .collect()
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while resolving placeholders
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("cell index {index} is out of range for a notebook with {count} cells")]
    CellOutOfRange { index: usize, count: usize },

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

/// A cell-reference key that does not follow the address grammar
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid cell address at {span:?}: {message}")]
pub struct AddressError {
    span: Span,
    message: String,
    expected: Vec<String>,
}

impl AddressError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn expected(&self) -> &[String] {
        &self.expected
    }

    /// Format the error with the key as source context using ariadne
    pub fn format(&self, key: &str) -> String {
        let expected_str = if self.expected.is_empty() {
            String::new()
        } else {
            format!("\nExpected: {}", self.expected.join(", "))
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, "address", self.span.start)
            .with_message(&self.message)
            .with_label(
                Label::new(("address", self.span.clone()))
                    .with_message(format!("{}{}", self.message, expected_str))
                    .with_color(Color::Red),
            )
            .finish()
            .write(("address", Source::from(key)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, char>> for AddressError {
    fn from(err: chumsky::error::Rich<'a, char>) -> Self {
        use chumsky::error::{RichPattern, RichReason};

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(c) => format!("Unexpected {}", format_char(c)),
                None => "Unexpected end of address".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected = err
            .expected()
            .filter_map(|e| match e {
                RichPattern::Token(c) => Some(format_char(c)),
                RichPattern::Label(label) => Some(label.to_string()),
                RichPattern::EndOfInput => Some("end of address".to_string()),
                RichPattern::Identifier(s) => Some(format!("'{}'", s)),
                RichPattern::Any => Some("any character".to_string()),
                RichPattern::SomethingElse => None,
            })
            .collect();

        AddressError {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

fn format_char(c: &char) -> String {
    format!("'{}'", c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::{Cell, Notebook};

    #[test]
    fn test_structural_error_lists_every_violation() {
        let err = StructuralError::new(vec![
            Violation::UnmatchedBlockEnd {
                key: "foo".to_string(),
                cell: 0,
                span: 0..4,
            },
            Violation::DuplicateBlockKey {
                key: "bar".to_string(),
                count: 2,
                cell: 1,
                span: 0..4,
            },
        ]);
        let msg = err.to_string();
        assert!(msg.contains("'foo'"));
        assert!(msg.contains("'bar' is declared 2 times"));
        assert_eq!(err.keys().into_iter().collect::<Vec<_>>(), vec!["bar", "foo"]);
    }

    #[test]
    fn test_violation_format_names_the_cell() {
        let text = "<!-- prompt: foo:end -->";
        let nb = Notebook::new(vec![Cell::markup(text)]);
        let v = Violation::UnmatchedBlockEnd {
            key: "foo".to_string(),
            cell: 0,
            span: 0..text.len(),
        };
        let rendered = v.format(&nb, ReportKind::Error);
        assert!(rendered.contains("cell[0]"));
        assert!(rendered.contains("no open start marker"));
    }

    #[test]
    fn test_address_error_from_parse() {
        let errs = crate::parser::parse_address("cell:+x").unwrap_err();
        let rendered = errs[0].format("cell:+x");
        assert!(rendered.contains("address"));
    }
}
