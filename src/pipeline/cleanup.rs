//! Deterministic cleanup of model-generated Markdown.
//!
//! Models ignore "no fences" instructions often enough that the engine strips
//! them itself. Rules run in order: fences first (they are recognised on the
//! raw text), line endings before per-line trimming, invisible characters
//! last so earlier patterns see the text the model actually produced.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply every cleanup rule to one page of Markdown.
pub fn clean_page(input: &str) -> String {
    let s = strip_outer_fences(input);
    let s = s.replace("\r\n", "\n").replace('\r', "\n");
    let s = trim_line_ends(&s);
    let s = RE_BLANK_RUN.replace_all(&s, "\n\n\n").into_owned();
    let s = remove_invisible_chars(&s);
    s.trim().to_string()
}

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md|html)?[ \t]*\r?\n(.*?)\r?\n?```\s*$")
        .expect("static fence regex")
});

static RE_BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{4,}").expect("static blank-line regex"));

fn strip_outer_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].to_string(),
        None => trimmed.to_string(),
    }
}

fn trim_line_ends(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' | '\u{00AD}'
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown_fence() {
        assert_eq!(clean_page("```markdown\n# Title\n\nBody\n```"), "# Title\n\nBody");
    }

    #[test]
    fn strips_bare_and_html_fences() {
        assert_eq!(clean_page("```\nplain\n```\n"), "plain");
        assert_eq!(clean_page("```html\n<table></table>\n```"), "<table></table>");
    }

    #[test]
    fn inner_code_blocks_survive() {
        let md = "Intro\n\n```rust\nfn main() {}\n```\n\nOutro";
        assert_eq!(clean_page(md), md);
    }

    #[test]
    fn normalises_whitespace() {
        assert_eq!(clean_page("a  \r\nb\r\n\n\n\n\n\nc\t"), "a\nb\n\n\nc");
    }

    #[test]
    fn drops_invisible_characters() {
        assert_eq!(clean_page("\u{FEFF}he\u{200B}llo"), "hello");
    }

    #[test]
    fn empty_page_stays_empty() {
        assert_eq!(clean_page("  \n "), "");
    }
}
