//! Marker tokenizer for notebook cell text using logos
//!
//! Cell text is mostly free-form prose or code. Markers are found by trying
//! the token set at each position that could open one (`<`, `#`, `p`), so
//! ordinary text never has to be tokenized.

use logos::Logos;

/// Byte range in cell text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    /// `<!-- prompt: KEY:start -->`
    #[regex(r"<!--\s*prompt:\s*[\w\-]+:start\s*-->", |lex| marker_key(lex.slice()))]
    BlockStart(String),

    /// `<!-- prompt: KEY:end -->`
    #[regex(r"<!--\s*prompt:\s*[\w\-]+:end\s*-->", |lex| marker_key(lex.slice()))]
    BlockEnd(String),

    /// `<!-- prompt: KEY -->`
    #[regex(r"<!--\s*prompt:\s*[\w\-]+\s*-->", |lex| marker_key(lex.slice()))]
    CommentMarker(String),

    /// `# prompt: KEY`, only valid alone on its line
    #[regex(r"#[ \t]*prompt:[ \t]*[\w\-]+", |lex| marker_key(lex.slice()))]
    HashMarker(String),

    /// `prompt: cell:...`
    #[regex(r"prompt:[ \t]*cell:(this|[+\-]?[0-9]+(:md|:cd)?)", |lex| cell_key(lex.slice()))]
    CellRef(String),
}

/// What a marker declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    /// Single-line declaration; the value is the rest of the cell
    Inline,
    BlockStart,
    BlockEnd,
    /// Cell-reference declaration; the value is computed at fill time
    CellRef,
}

/// A marker found in one cell's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: MarkerKind,
    pub key: String,
    pub span: Span,
}

impl Marker {
    /// Offset in the cell text where the declared content begins
    pub fn payload_offset(&self) -> usize {
        self.span.end
    }
}

/// Tokenize one cell's text into its markers, in text order
pub fn scan_markers(text: &str) -> Vec<Marker> {
    let mut markers = Vec::new();
    let mut cursor = 0;

    for (start, c) in text.char_indices() {
        if start < cursor || !matches!(c, '<' | '#' | 'p') {
            continue;
        }
        if let Some(marker) = marker_at(text, start) {
            cursor = marker.span.end;
            markers.push(marker);
        }
    }

    markers
}

fn marker_at(text: &str, start: usize) -> Option<Marker> {
    let mut lexer = Token::lexer(&text[start..]);
    let token = lexer.next()?.ok()?;
    let local = lexer.span();
    let span = start + local.start..start + local.end;

    let (kind, key) = match token {
        Token::BlockStart(key) => (MarkerKind::BlockStart, key),
        Token::BlockEnd(key) => (MarkerKind::BlockEnd, key),
        Token::CommentMarker(key) => (MarkerKind::Inline, key),
        Token::HashMarker(key) => {
            if !alone_on_line(text, &span) {
                return None;
            }
            (MarkerKind::Inline, key)
        }
        Token::CellRef(key) => {
            if !ends_at_boundary(text, &span) {
                return None;
            }
            (MarkerKind::CellRef, key)
        }
    };

    Some(Marker { kind, key, span })
}

fn alone_on_line(text: &str, span: &Span) -> bool {
    let line_start = text[..span.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = text[span.end..]
        .find('\n')
        .map_or(text.len(), |i| span.end + i);
    text[line_start..span.start].trim().is_empty() && text[span.end..line_end].trim().is_empty()
}

/// A cell reference must not run on into more key characters (`cell:1:mdx`)
fn ends_at_boundary(text: &str, span: &Span) -> bool {
    !text[span.end..]
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | ':'))
}

/// Key of a named or block marker, without the `:start` / `:end` suffix
fn marker_key(slice: &str) -> String {
    let after = slice.split_once("prompt:").map_or(slice, |(_, rest)| rest);
    let key = after.trim_end_matches("-->").trim();
    key.strip_suffix(":start")
        .or_else(|| key.strip_suffix(":end"))
        .unwrap_or(key)
        .to_string()
}

fn cell_key(slice: &str) -> String {
    slice
        .split_once("prompt:")
        .map_or(slice, |(_, rest)| rest)
        .trim()
        .to_string()
}

/// `{{KEY}}` placeholder in a prompt template
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum PlaceholderToken {
    #[regex(r"\{\{[\w\-:+=]+\}\}", |lex| {
        let s = lex.slice();
        s[2..s.len() - 2].to_string()
    })]
    Placeholder(String),
}

/// Find every `{{KEY}}` placeholder in a template, in text order
pub fn scan_placeholders(template: &str) -> Vec<(Span, String)> {
    let mut found = Vec::new();
    let mut cursor = 0;

    for (start, _) in template.match_indices('{') {
        if start < cursor {
            continue;
        }
        let mut lexer = PlaceholderToken::lexer(&template[start..]);
        if let Some(Ok(PlaceholderToken::Placeholder(key))) = lexer.next() {
            let end = start + lexer.span().end;
            found.push((start..end, key));
            cursor = end;
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_and_keys(text: &str) -> Vec<(MarkerKind, String)> {
        scan_markers(text)
            .into_iter()
            .map(|m| (m.kind, m.key))
            .collect()
    }

    #[test]
    fn test_comment_marker() {
        assert_eq!(
            kinds_and_keys("<!-- prompt: instructions -->\nWrite a loop."),
            vec![(MarkerKind::Inline, "instructions".to_string())]
        );
    }

    #[test]
    fn test_comment_marker_without_spaces() {
        assert_eq!(
            kinds_and_keys("<!--prompt:task-1 -->"),
            vec![(MarkerKind::Inline, "task-1".to_string())]
        );
    }

    #[test]
    fn test_hash_marker() {
        assert_eq!(
            kinds_and_keys("x = 1\n  #  prompt: solution  \nprint(x)"),
            vec![(MarkerKind::Inline, "solution".to_string())]
        );
    }

    #[test]
    fn test_hash_marker_must_be_alone_on_line() {
        assert!(kinds_and_keys("x = 1  # prompt: solution").is_empty());
        assert!(kinds_and_keys("# prompt: solution here").is_empty());
    }

    #[test]
    fn test_block_markers() {
        let text = "<!-- prompt: context:start -->\nbody\n<!-- prompt: context:end -->";
        assert_eq!(
            kinds_and_keys(text),
            vec![
                (MarkerKind::BlockStart, "context".to_string()),
                (MarkerKind::BlockEnd, "context".to_string()),
            ]
        );
    }

    #[test]
    fn test_cell_reference_forms() {
        let text = "prompt: cell:this prompt:cell:3 prompt: cell:2:md prompt: cell:+1:cd prompt: cell:-4";
        assert_eq!(
            kinds_and_keys(text),
            vec![
                (MarkerKind::CellRef, "cell:this".to_string()),
                (MarkerKind::CellRef, "cell:3".to_string()),
                (MarkerKind::CellRef, "cell:2:md".to_string()),
                (MarkerKind::CellRef, "cell:+1:cd".to_string()),
                (MarkerKind::CellRef, "cell:-4".to_string()),
            ]
        );
    }

    #[test]
    fn test_cell_reference_inside_comment() {
        assert_eq!(
            kinds_and_keys("<!-- prompt: cell:-1 -->"),
            vec![(MarkerKind::CellRef, "cell:-1".to_string())]
        );
    }

    #[test]
    fn test_cell_reference_with_trailing_key_text_is_rejected() {
        assert!(kinds_and_keys("prompt: cell:1:mdx").is_empty());
        assert!(kinds_and_keys("prompt: cell:this2").is_empty());
        assert!(kinds_and_keys("prompt: cell:1:py").is_empty());
        assert_eq!(
            kinds_and_keys("see prompt: cell:-1:md."),
            vec![(MarkerKind::CellRef, "cell:-1:md".to_string())]
        );
    }

    #[test]
    fn test_plain_text_has_no_markers() {
        assert!(kinds_and_keys("<!-- a comment --> # heading\nprompt engineering").is_empty());
    }

    #[test]
    fn test_payload_offset_follows_marker() {
        let text = "<!-- prompt: task -->rest";
        let markers = scan_markers(text);
        assert_eq!(&text[markers[0].payload_offset()..], "rest");
    }

    #[test]
    fn test_spans_are_in_text_order() {
        let text = "<!-- prompt: a -->\n<!-- prompt: b -->";
        let markers = scan_markers(text);
        assert_eq!(markers.len(), 2);
        assert!(markers[0].span.end <= markers[1].span.start);
        assert_eq!(&text[markers[1].span.clone()], "<!-- prompt: b -->");
    }

    #[test]
    fn test_non_ascii_text_around_markers() {
        assert_eq!(
            kinds_and_keys("Übung ✓ <!-- prompt: aufgabe --> weiter"),
            vec![(MarkerKind::Inline, "aufgabe".to_string())]
        );
    }

    #[test]
    fn test_scan_placeholders() {
        let found = scan_placeholders("Hi {{name}}, see {{cell:-1:md}} and {{a=b+c}}.");
        let keys: Vec<&str> = found.iter().map(|(_, k)| k.as_str()).collect();
        assert_eq!(keys, vec!["name", "cell:-1:md", "a=b+c"]);
        assert_eq!(found[0].0, 3..11);
    }

    #[test]
    fn test_scan_placeholders_ignores_malformed() {
        assert!(scan_placeholders("{{}} {{ spaced }} {single} {{open").is_empty());
    }

    #[test]
    fn test_scan_placeholders_extra_brace() {
        let found = scan_placeholders("{{{key}}}");
        assert_eq!(found, vec![(1..8, "key".to_string())]);
    }
}
