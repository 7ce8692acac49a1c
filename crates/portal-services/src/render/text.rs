use bytes::Bytes;
use portal_core::{RenderedReport, ReportFormat};
use serde_json::Value;

use super::{ReportRenderer, ReportSummary};

pub struct TextRenderer;

impl ReportRenderer for TextRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Txt
    }

    fn render(&self, report: &Value) -> anyhow::Result<RenderedReport> {
        let mut body = ReportSummary::from_report(report).lines().join("\n");
        body.push('\n');
        Ok(RenderedReport {
            content_type: self.format().content_type(),
            body: Bytes::from(body),
        })
    }
}
