//! Report renderers.
//!
//! Every format renders the same [`ReportSummary`] extracted from the
//! sandbox's JSON report.

mod html;
mod pdf;
mod text;

pub use html::{escape_html, HtmlRenderer};
pub use pdf::PdfRenderer;
pub use text::TextRenderer;

use portal_core::{RenderedReport, ReportFormat};
use serde_json::Value;

pub trait ReportRenderer: Send + Sync {
    fn format(&self) -> ReportFormat;

    fn render(&self, report: &Value) -> anyhow::Result<RenderedReport>;
}

static TEXT: TextRenderer = TextRenderer;
static HTML: HtmlRenderer = HtmlRenderer;
static PDF: PdfRenderer = PdfRenderer;

pub fn renderer_for(format: ReportFormat) -> &'static dyn ReportRenderer {
    match format {
        ReportFormat::Txt => &TEXT,
        ReportFormat::Html => &HTML,
        ReportFormat::Pdf => &PDF,
    }
}

/// The fields of a sandbox report shown to submitters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    pub task_id: Option<u64>,
    pub target: Option<String>,
    pub category: Option<String>,
    pub started: Option<String>,
    pub ended: Option<String>,
    pub score: Option<f64>,
    pub signatures: Vec<String>,
    pub dropped_files: usize,
    pub hosts: Vec<String>,
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ReportSummary {
    pub fn from_report(report: &Value) -> Self {
        let info = &report["info"];
        let target = &report["target"];

        let target_name = as_text(&target["file"]["name"]).or_else(|| as_text(&target["url"]));

        let signatures = report["signatures"]
            .as_array()
            .map(|sigs| {
                sigs.iter()
                    .filter_map(|sig| {
                        as_text(&sig["description"]).or_else(|| as_text(&sig["name"]))
                    })
                    .collect()
            })
            .unwrap_or_default();

        // Hosts are plain addresses in older reports and objects later on.
        let hosts = report["network"]["hosts"]
            .as_array()
            .map(|hosts| {
                hosts
                    .iter()
                    .filter_map(|host| as_text(host).or_else(|| as_text(&host["ip"])))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            task_id: info["id"].as_u64(),
            target: target_name,
            category: as_text(&info["category"]),
            started: as_text(&info["started"]),
            ended: as_text(&info["ended"]),
            score: info["score"].as_f64(),
            signatures,
            dropped_files: report["dropped"].as_array().map_or(0, Vec::len),
            hosts,
        }
    }

    /// Plain-text lines shared by every renderer.
    pub fn lines(&self) -> Vec<String> {
        fn or_dash(value: &Option<String>) -> &str {
            value.as_deref().unwrap_or("-")
        }

        let mut lines = vec![
            "Analysis report".to_string(),
            String::new(),
            format!(
                "Task:       {}",
                self.task_id.map_or_else(|| "-".to_string(), |id| id.to_string())
            ),
            format!("Target:     {}", or_dash(&self.target)),
            format!("Category:   {}", or_dash(&self.category)),
            format!("Started:    {}", or_dash(&self.started)),
            format!("Ended:      {}", or_dash(&self.ended)),
            format!(
                "Score:      {}",
                self.score.map_or_else(|| "-".to_string(), |s| format!("{:.1}", s))
            ),
            format!("Dropped:    {} file(s)", self.dropped_files),
            String::new(),
            format!("Signatures ({})", self.signatures.len()),
        ];
        lines.extend(self.signatures.iter().map(|sig| format!("  - {}", sig)));
        lines.push(String::new());
        lines.push(format!("Network hosts ({})", self.hosts.len()));
        lines.extend(self.hosts.iter().map(|host| format!("  - {}", host)));
        lines
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_report() -> Value {
        json!({
            "info": {
                "id": 42,
                "category": "file",
                "started": "2024-01-01 10:00:00",
                "ended": "2024-01-01 10:05:00",
                "score": 7.5,
                "custom": "{}"
            },
            "target": { "file": { "name": "invoice<1>.exe" } },
            "signatures": [
                { "name": "injection", "description": "Injects into <explorer.exe>" },
                { "name": "persistence" }
            ],
            "dropped": [{}, {}, {}],
            "network": { "hosts": ["10.0.0.1", { "ip": "192.0.2.7" }] }
        })
    }

    #[test]
    fn test_summary_from_report() {
        let summary = ReportSummary::from_report(&sample_report());
        assert_eq!(summary.task_id, Some(42));
        assert_eq!(summary.target.as_deref(), Some("invoice<1>.exe"));
        assert_eq!(summary.score, Some(7.5));
        assert_eq!(
            summary.signatures,
            vec!["Injects into <explorer.exe>", "persistence"]
        );
        assert_eq!(summary.dropped_files, 3);
        assert_eq!(summary.hosts, vec!["10.0.0.1", "192.0.2.7"]);
    }

    #[test]
    fn test_summary_tolerates_sparse_report() {
        let summary = ReportSummary::from_report(&json!({ "target": { "url": "http://x" } }));
        assert_eq!(summary.target.as_deref(), Some("http://x"));
        let lines = summary.lines();
        assert!(lines.contains(&"Task:       -".to_string()));
        assert!(lines.contains(&"Signatures (0)".to_string()));
    }

    #[test]
    fn test_renderer_lookup() {
        for format in ReportFormat::ALL {
            assert_eq!(renderer_for(format).format(), format);
        }
    }
}
