//! Mapping workflow outcomes onto what the user sees.
//!
//! The display model is UI-agnostic: the web page turns it into HTML, the
//! CLI prints it. Exactly two shapes exist: an ordered list of page panels,
//! or a single notice.

use crate::engine::ExtractionResult;
use crate::error::ExtractionError;
use serde::Serialize;
use std::fmt;

/// Shown when an engine call produced nothing usable.
pub const FALLBACK_MESSAGE: &str = "No extraction result could be obtained.";

/// Shown when a submission arrives without an API key.
pub const MISSING_KEY_MESSAGE: &str = "Enter your GEMINI_API_KEY to continue.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayModel {
    /// One panel per extracted page, in result order.
    Pages { summary: String, panels: Vec<PagePanel> },
    /// A single warning or error.
    Notice(Notice),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagePanel {
    /// 1-based position in the result.
    pub index: usize,
    /// Page number in the source document.
    pub page_number: usize,
    pub content: String,
}

impl PagePanel {
    pub fn label(&self) -> String {
        format!("page {}", self.index)
    }
}

impl fmt::Display for PagePanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label(), self.content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    /// Extra detail (error chain, panic payload) for an expandable section.
    pub diagnostic: Option<String>,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            diagnostic: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Option<String>) -> Self {
        self.diagnostic = diagnostic;
        self
    }
}

impl DisplayModel {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DisplayModel::Notice(n) if n.message == FALLBACK_MESSAGE)
    }
}

/// Map an engine outcome to the display model.
///
/// A result with no pages is treated exactly like a failure: both show the
/// fallback warning. A failure's message travels in the diagnostic.
pub fn render(outcome: &Result<ExtractionResult, ExtractionError>) -> DisplayModel {
    match outcome {
        Ok(result) if !result.pages.is_empty() => {
            let panels = result
                .pages
                .iter()
                .enumerate()
                .map(|(i, p)| PagePanel {
                    index: i + 1,
                    page_number: p.page_number,
                    content: p.content.clone(),
                })
                .collect::<Vec<_>>();
            DisplayModel::Pages {
                summary: format!("Done! Showing the content of {} page(s).", panels.len()),
                panels,
            }
        }
        Ok(_) => DisplayModel::Notice(Notice::warning(FALLBACK_MESSAGE)),
        Err(err) => {
            let diagnostic = match &err.diagnostic {
                Some(d) => format!("{}\n\n{}", err.message, d),
                None => err.message.clone(),
            };
            DisplayModel::Notice(Notice::warning(FALLBACK_MESSAGE).with_diagnostic(Some(diagnostic)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_render_in_order_with_labels() {
        let result = ExtractionResult::from_contents("doc.pdf", ["A", "B"]);
        match render(&Ok(result)) {
            DisplayModel::Pages { panels, summary } => {
                let lines: Vec<String> = panels.iter().map(|p| p.to_string()).collect();
                assert_eq!(lines, vec!["page 1: A", "page 2: B"]);
                assert!(summary.contains('2'));
            }
            other => panic!("expected pages, got {other:?}"),
        }
    }

    #[test]
    fn labels_follow_position_not_engine_index() {
        let mut result = ExtractionResult::from_contents("doc.pdf", ["A", "B"]);
        result.pages[0].index = 3;
        result.pages[1].index = 5;
        result.pages[1].page_number = 9;
        match render(&Ok(result)) {
            DisplayModel::Pages { panels, .. } => {
                let lines: Vec<String> = panels.iter().map(|p| p.to_string()).collect();
                assert_eq!(lines, vec!["page 1: A", "page 2: B"]);
                assert_eq!(panels[1].page_number, 9);
            }
            other => panic!("expected pages, got {other:?}"),
        }
    }

    #[test]
    fn empty_result_and_failure_render_the_same_fallback() {
        let empty = render(&Ok(ExtractionResult::default()));
        let failed = render(&Err(ExtractionError::new("boom")));
        assert!(empty.is_fallback());
        assert!(failed.is_fallback());
    }

    #[test]
    fn failure_keeps_message_and_diagnostic() {
        let err = ExtractionError::new("An error occurred during extraction: 429")
            .with_diagnostic("RateLimitExceeded");
        match render(&Err(err)) {
            DisplayModel::Notice(n) => {
                assert_eq!(n.severity, Severity::Warning);
                let d = n.diagnostic.unwrap();
                assert!(d.contains("429"));
                assert!(d.contains("RateLimitExceeded"));
            }
            other => panic!("expected notice, got {other:?}"),
        }
    }

    #[test]
    fn serialises_with_kind_tag() {
        let json = serde_json::to_value(render(&Ok(ExtractionResult::default()))).unwrap();
        assert_eq!(json["kind"], "notice");
        assert_eq!(json["severity"], "warning");
    }
}
