//! System prompts for page-image OCR.
//!
//! A submission may override the prompt (see
//! [`crate::workflow::SubmissionRequest::system_prompt`]); these constants are
//! used otherwise.

/// Default instruction sent with every page image.
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"Convert the following PDF page image to Markdown.
Return only the Markdown, with no explanation and no surrounding ```markdown or ```html fences.

RULES:
  - Include all text on the page, including headers, footers and small print.
  - Keep the reading order a human would use, column by column.
  - Return tables as Markdown pipe tables; fall back to HTML tables for merged cells.
  - Describe charts and infographics in Markdown, preferring a table when the data allows it.
  - Wrap logos like <logo>Name</logo> and watermarks like <watermark>TEXT</watermark>.
  - Wrap page numbers like <page_number>14</page_number>.
  - Use ☐ and ☑ for check boxes."#;

/// Context message for format-continuity mode.
pub fn maintain_format_context(prior_page: &str) -> String {
    format!(
        "Markdown must maintain consistent formatting with the following page:\n\n\"\"\"{}\"\"\"",
        prior_page
    )
}

/// Pick the prompt override for a submission: the request's, then the
/// deployment's. `None` leaves the engine on its built-in prompt.
pub fn resolve_prompt_override<'a>(request: Option<&'a str>, deployment: Option<&'a str>) -> Option<&'a str> {
    request
        .filter(|p| !p.trim().is_empty())
        .or(deployment.filter(|p| !p.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_overrides_fall_through() {
        assert_eq!(resolve_prompt_override(Some("  "), None), None);
        assert_eq!(resolve_prompt_override(None, None), None);
        assert_eq!(resolve_prompt_override(Some(""), Some("deploy")), Some("deploy"));
        assert_eq!(resolve_prompt_override(Some("mine"), Some("deploy")), Some("mine"));
    }

    #[test]
    fn context_quotes_prior_page() {
        let ctx = maintain_format_context("# Intro");
        assert!(ctx.contains("\"\"\"# Intro\"\"\""));
    }
}
