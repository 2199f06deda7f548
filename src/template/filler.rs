//! Template filling - substitutes resolved placeholders into a prompt template

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::notebook::{CellAddress, CellSource};
use crate::parser::scan_placeholders;

use super::config::FillConfig;
use super::resolver::{PlaceholderMap, PlaceholderValue};

/// Every placeholder key a template refers to
pub fn template_placeholder_keys(template: &str) -> BTreeSet<String> {
    scan_placeholders(template)
        .into_iter()
        .map(|(_, key)| key)
        .collect()
}

/// Fill a template with default configuration
pub fn fill_template<N: CellSource + ?Sized>(
    template: &str,
    map: &PlaceholderMap,
    notebook: &N,
) -> String {
    fill_template_with_config(template, map, notebook, &FillConfig::default())
}

/// Fill a template from a resolved map
///
/// Undeclared placeholders are replaced with nothing. Cell references are
/// read from the notebook now, so edits made since resolution show up.
pub fn fill_template_with_config<N: CellSource + ?Sized>(
    template: &str,
    map: &PlaceholderMap,
    notebook: &N,
    config: &FillConfig,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for (span, key) in scan_placeholders(template) {
        out.push_str(&template[last..span.start]);
        push_substitution(&mut out, &key, map, notebook);
        last = span.end;
    }
    out.push_str(&template[last..]);

    if config.collapse_blank_lines {
        collapse_blank_lines(&out)
    } else {
        out
    }
}

fn push_substitution<N: CellSource + ?Sized>(
    out: &mut String,
    key: &str,
    map: &PlaceholderMap,
    notebook: &N,
) {
    let Some(placeholder) = map.get(key) else {
        if CellAddress::is_cell_key(key) {
            debug!(key, "cell reference not declared in the current cell");
        } else {
            debug!(key, "placeholder not declared");
        }
        return;
    };

    match &placeholder.value {
        PlaceholderValue::Text(text) => out.push_str(text),
        PlaceholderValue::CellReference(address) => {
            match address.resolve(notebook, map.current_cell()) {
                Some(index) => out.push_str(notebook.text_at(index).unwrap_or("")),
                None => warn!(key, current = map.current_cell(), "cell reference did not resolve"),
            }
        }
    }
}

/// Reduce every run of whitespace-only lines to a single empty line
pub fn collapse_blank_lines(text: &str) -> String {
    let mut lines = Vec::new();
    let mut previous_blank = false;

    for line in text.split('\n') {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        previous_blank = blank;
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::{Cell, Notebook};
    use crate::template::resolve_placeholders;
    use pretty_assertions::assert_eq;

    fn notebook(texts: &[&str]) -> Notebook {
        Notebook::new(texts.iter().map(|t| Cell::markup(*t)).collect())
    }

    #[test]
    fn test_keys_are_collected_once() {
        let keys = template_placeholder_keys("{{a}} {{cell:-1}} {{a}}");
        assert_eq!(
            keys.into_iter().collect::<Vec<_>>(),
            vec!["a".to_string(), "cell:-1".to_string()]
        );
    }

    #[test]
    fn test_unknown_placeholder_vanishes() {
        let nb = notebook(&["x"]);
        let map = resolve_placeholders(&nb, 0, None).unwrap();
        assert_eq!(fill_template("A{{undeclared}}B", &map, &nb), "AB");
    }

    #[test]
    fn test_named_value_substituted() {
        let nb = notebook(&["<!-- prompt: task --> Reverse a string", "code"]);
        let map = resolve_placeholders(&nb, 1, None).unwrap();
        assert_eq!(fill_template("Task: {{task}}", &map, &nb), "Task: Reverse a string");
    }

    #[test]
    fn test_cell_reference_reads_live_text() {
        let mut nb = notebook(&["first version", "prompt: cell:-1"]);
        let keys = template_placeholder_keys("Previous: {{cell:-1}}");
        let map = resolve_placeholders(&nb, 1, Some(&keys)).unwrap();
        assert_eq!(
            fill_template("Previous: {{cell:-1}}", &map, &nb),
            "Previous: first version"
        );

        nb.cell_mut(0).unwrap().text = "second version".to_string();
        assert_eq!(
            fill_template("Previous: {{cell:-1}}", &map, &nb),
            "Previous: second version"
        );
    }

    #[test]
    fn test_unresolvable_cell_reference_is_empty() {
        let nb = notebook(&["prompt: cell:-1"]);
        let map = resolve_placeholders(&nb, 0, None).unwrap();
        assert_eq!(fill_template("[{{cell:-1}}]", &map, &nb), "[]");
    }

    #[test]
    fn test_undeclared_cell_reference_is_empty() {
        let nb = notebook(&["previous", "no markers here"]);
        let map = resolve_placeholders(&nb, 1, None).unwrap();
        assert_eq!(fill_template("[{{cell:-1}}]", &map, &nb), "[]");
    }

    #[test]
    fn test_blank_lines_collapse() {
        assert_eq!(collapse_blank_lines("A\n\n  \n\t\nB"), "A\n\nB");
        assert_eq!(collapse_blank_lines("A\nB\n"), "A\nB\n");
    }

    #[test]
    fn test_empty_substitutions_collapse() {
        let nb = notebook(&["x"]);
        let map = resolve_placeholders(&nb, 0, None).unwrap();
        let filled = fill_template("Intro\n\n{{a}}\n\n{{b}}\n\n{{c}}\n\nEnd", &map, &nb);
        insta::assert_snapshot!(filled, @r"
        Intro

        End
        ");
    }

    #[test]
    fn test_collapse_can_be_disabled() {
        let nb = notebook(&["x"]);
        let map = resolve_placeholders(&nb, 0, None).unwrap();
        let config = FillConfig::new().with_collapse_blank_lines(false);
        assert_eq!(
            fill_template_with_config("A\n{{a}}\n\nB", &map, &nb, &config),
            "A\n\n\nB"
        );
    }
}
