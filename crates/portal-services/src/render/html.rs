use bytes::Bytes;
use portal_core::{RenderedReport, ReportFormat};
use serde_json::Value;

use super::{ReportRenderer, ReportSummary};

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub struct HtmlRenderer;

impl ReportRenderer for HtmlRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Html
    }

    fn render(&self, report: &Value) -> anyhow::Result<RenderedReport> {
        let summary = ReportSummary::from_report(report);
        let title = match summary.task_id {
            Some(id) => format!("Analysis report #{}", id),
            None => "Analysis report".to_string(),
        };

        let mut page = String::new();
        page.push_str("<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\">");
        page.push_str(&format!("<title>{}</title>", escape_html(&title)));
        page.push_str("<style>body{font-family:sans-serif;margin:2em}pre{background:#f4f4f4;padding:1em}</style>");
        page.push_str("</head><body>");
        page.push_str(&format!("<h1>{}</h1>\n<pre>", escape_html(&title)));
        for line in summary.lines().iter().skip(2) {
            page.push_str(&escape_html(line));
            page.push('\n');
        }
        page.push_str("</pre></body></html>\n");

        Ok(RenderedReport {
            content_type: self.format().content_type(),
            body: Bytes::from(page),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample_report;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_html_report_is_escaped() {
        let rendered = HtmlRenderer.render(&sample_report()).unwrap();
        assert_eq!(rendered.content_type, "text/html; charset=utf-8");
        let body = String::from_utf8(rendered.body.to_vec()).unwrap();
        assert!(body.contains("<title>Analysis report #42</title>"));
        assert!(body.contains("invoice&lt;1&gt;.exe"));
        assert!(!body.contains("<explorer.exe>"));
    }
}
