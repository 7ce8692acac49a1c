use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Output format of a rendered report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[serde(alias = "plain")]
    Txt,
    Html,
    Pdf,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 3] = [ReportFormat::Txt, ReportFormat::Html, ReportFormat::Pdf];

    /// Renderer key, also used as the report URL extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Txt => "txt",
            ReportFormat::Html => "html",
            ReportFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Txt => "text/plain; charset=utf-8",
            ReportFormat::Html => "text/html; charset=utf-8",
            ReportFormat::Pdf => "application/pdf",
        }
    }

    /// Lookup by URL extension. Only the canonical renderer keys are accepted.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "txt" => Some(ReportFormat::Txt),
            "html" => Some(ReportFormat::Html),
            "pdf" => Some(ReportFormat::Pdf),
            _ => None,
        }
    }

    /// Lookup by form value; `plain` is accepted as an alias for `txt`.
    pub fn from_form_value(value: &str) -> Option<Self> {
        match value {
            "plain" => Some(ReportFormat::Txt),
            other => Self::from_extension(other),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s).ok_or(ReportError::InvalidFormat)
    }
}

/// A report ready to be served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedReport {
    pub content_type: &'static str,
    pub body: Bytes,
}
