use anyhow::Context;
use bytes::Bytes;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use portal_core::{RenderedReport, ReportFormat};
use serde_json::Value;

use super::{ReportRenderer, ReportSummary};

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 50;
const FONT_SIZE: i64 = 9;
const LEADING: i64 = 12;
const LINES_PER_PAGE: usize = ((PAGE_HEIGHT - 2 * MARGIN) / LEADING) as usize;
const MAX_LINE_CHARS: usize = 90;

/// Wrap and restrict to printable ASCII; the built-in Courier font has no
/// glyphs for anything else.
fn layout_lines(lines: &[String]) -> Vec<String> {
    let mut out = Vec::new();
    for line in lines {
        let ascii: String = line
            .chars()
            .map(|c| if c == ' ' || c.is_ascii_graphic() { c } else { '?' })
            .collect();
        if ascii.is_empty() {
            out.push(String::new());
            continue;
        }
        let mut rest = ascii.as_str();
        while !rest.is_empty() {
            let split = rest.len().min(MAX_LINE_CHARS);
            let (head, tail) = rest.split_at(split);
            out.push(head.to_string());
            rest = tail;
        }
    }
    out
}

fn page_content(lines: &[String]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new("Td", vec![MARGIN.into(), (PAGE_HEIGHT - MARGIN).into()]),
    ];
    for line in lines {
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(line.as_bytes().to_vec())],
        ));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

pub struct PdfRenderer;

impl PdfRenderer {
    fn build(lines: &[String]) -> anyhow::Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let lines = layout_lines(lines);
        let mut kids: Vec<ObjectId> = Vec::new();
        for chunk in lines.chunks(LINES_PER_PAGE) {
            let content = page_content(chunk)
                .encode()
                .context("Failed to encode page content")?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, content));
            kids.push(doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            }));
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids.into_iter().map(Object::from).collect::<Vec<Object>>(),
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).context("Failed to write PDF")?;
        Ok(buffer)
    }
}

impl ReportRenderer for PdfRenderer {
    fn format(&self) -> ReportFormat {
        ReportFormat::Pdf
    }

    fn render(&self, report: &Value) -> anyhow::Result<RenderedReport> {
        let lines = ReportSummary::from_report(report).lines();
        let body = Self::build(&lines)?;
        Ok(RenderedReport {
            content_type: self.format().content_type(),
            body: Bytes::from(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::tests::sample_report;

    #[test]
    fn test_pdf_report_header() {
        let rendered = PdfRenderer.render(&sample_report()).unwrap();
        assert_eq!(rendered.content_type, "application/pdf");
        assert!(rendered.body.starts_with(b"%PDF-"));
    }

    #[test]
    fn test_pdf_splits_pages() {
        let lines: Vec<String> = (0..LINES_PER_PAGE * 2 + 1).map(|i| i.to_string()).collect();
        let bytes = PdfRenderer::build(&lines).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_layout_wraps_and_replaces_non_ascii() {
        let long = "x".repeat(MAX_LINE_CHARS + 5);
        let laid_out = layout_lines(&[long, "café".to_string(), String::new()]);
        assert_eq!(laid_out.len(), 4);
        assert_eq!(laid_out[1], "xxxxx");
        assert_eq!(laid_out[2], "caf?");
        assert_eq!(laid_out[3], "");
    }
}
