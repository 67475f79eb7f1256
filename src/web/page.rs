//! HTML rendering of the form and the results area.

use crate::display::{DisplayModel, Notice, Severity};
use std::fmt::Write as _;

const INDEX_HTML: &str = include_str!("../../templates/index.html");

/// Render the full page. `display` fills the results area when present.
pub fn render_page(display: Option<&DisplayModel>, pages: &str, key_configured: bool) -> String {
    let key_hint = if key_configured {
        "leave blank to use the server's key"
    } else {
        "required"
    };
    let results = display.map(render_results).unwrap_or_default();

    INDEX_HTML
        .replace("{{ key_hint }}", key_hint)
        .replace("{{ pages }}", &html_escape(pages))
        .replace("{{ results }}", &results)
}

/// Render only the results area.
pub fn render_results(display: &DisplayModel) -> String {
    match display {
        DisplayModel::Pages { summary, panels } => {
            let mut html = format!(
                "<div class=\"notice success\">{}</div>\n",
                html_escape(summary)
            );
            for panel in panels {
                let label = html_escape(&panel.label());
                let _ = write!(
                    html,
                    "<h3>{label}</h3>\n<textarea readonly aria-label=\"{label}\" data-page=\"{}\">{}</textarea>\n",
                    panel.page_number,
                    html_escape(&panel.content)
                );
            }
            html
        }
        DisplayModel::Notice(notice) => render_notice(notice),
    }
}

fn render_notice(notice: &Notice) -> String {
    let class = match notice.severity {
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    let mut html = format!(
        "<div class=\"notice {class}\">{}",
        html_escape(&notice.message)
    );
    if let Some(ref diagnostic) = notice.diagnostic {
        let _ = write!(
            html,
            "<details><summary>Details</summary><pre>{}</pre></details>",
            html_escape(diagnostic)
        );
    }
    html.push_str("</div>\n");
    html
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            // Keeps user text from forming template placeholders.
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{PagePanel, FALLBACK_MESSAGE};

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn empty_page_has_form_and_no_results() {
        let html = render_page(None, "", false);
        assert!(html.contains("name=\"api_key\""));
        assert!(html.contains("type=\"password\""));
        assert!(html.contains("accept=\".pdf,application/pdf\""));
        assert!(!html.contains("class=\"notice"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn pages_render_as_labelled_text_areas() {
        let display = DisplayModel::Pages {
            summary: "Done!".into(),
            panels: vec![
                PagePanel {
                    index: 1,
                    page_number: 3,
                    content: "<table>".into(),
                },
                PagePanel {
                    index: 2,
                    page_number: 4,
                    content: "B".into(),
                },
            ],
        };
        let html = render_results(&display);
        let first = html.find("<h3>page 1</h3>").unwrap();
        let second = html.find("<h3>page 2</h3>").unwrap();
        assert!(first < second);
        assert!(html.contains("&lt;table&gt;"));
        assert!(html.contains("data-page=\"3\""));
    }

    #[test]
    fn notice_includes_escaped_diagnostic() {
        let display = DisplayModel::Notice(
            Notice::warning(FALLBACK_MESSAGE).with_diagnostic(Some("HTTP 400 <bad>".into())),
        );
        let html = render_results(&display);
        assert!(html.contains("notice warning"));
        assert!(html.contains("<details>"));
        assert!(html.contains("HTTP 400 &lt;bad&gt;"));
    }

    #[test]
    fn page_selector_value_is_kept_and_escaped() {
        let html = render_page(None, "1,\"3\"", true);
        assert!(html.contains("value=\"1,&quot;3&quot;\""));
        assert!(html.contains("use the server's key"));
    }

    #[test]
    fn placeholder_text_in_inputs_stays_literal() {
        let display = DisplayModel::Notice(Notice::warning("{{ pages }} {{ key_hint }}"));
        let html = render_page(Some(&display), "{{ results }}", false);

        assert!(html.contains("value=\"&#123;&#123; results &#125;&#125;\""));
        assert_eq!(html.matches("class=\"notice warning\"").count(), 1);
        assert!(html.contains("&#123;&#123; pages &#125;&#125; &#123;&#123; key_hint &#125;&#125;"));
        assert!(!html.contains("{{"));
    }
}
