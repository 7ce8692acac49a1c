use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::ReportFormat;

/// One sample to submit: an uploaded file or a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    File { filename: String, content: Bytes },
    Url(String),
}

impl Target {
    pub fn file(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Target::File {
            filename: filename.into(),
            content: content.into(),
        }
    }

    pub fn url(url: impl Into<String>) -> Self {
        Target::Url(url.into())
    }

    /// Name shown back to the submitter (filename or URL).
    pub fn display_name(&self) -> &str {
        match self {
            Target::File { filename, .. } => filename,
            Target::Url(url) => url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Target::File { .. } => "file",
            Target::Url(_) => "URL",
        }
    }
}

/// Scanner options in caller-defined order.
///
/// Encoded as `key=value` pairs joined by commas; entries with an empty value
/// are dropped at encoding time (see [`crate::encoding::encode_options`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskOptions(Vec<(String, String)>);

impl TaskOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TaskOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Task-creation fields shared by every target of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedData {
    pub timeout_secs: Option<u32>,
    pub priority: Option<u64>,
    pub machine: Option<String>,
    /// Already encoded option string.
    pub options: String,
}

impl SharedData {
    /// Form fields for the task-creation request; unset fields are omitted.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::with_capacity(4);
        if let Some(timeout) = self.timeout_secs {
            fields.push(("timeout", timeout.to_string()));
        }
        if let Some(priority) = self.priority {
            fields.push(("priority", priority.to_string()));
        }
        if let Some(machine) = &self.machine {
            fields.push(("machine", machine.clone()));
        }
        fields.push(("options", self.options.clone()));
        fields
    }
}

/// Correlation metadata stored in the remote task's `custom` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomMetadata {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub reports: Vec<ReportFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniqid: Option<String>,
}

impl CustomMetadata {
    pub fn new(email: impl Into<String>, reports: Vec<ReportFormat>) -> Self {
        Self {
            email: email.into(),
            reports,
            uniqid: None,
        }
    }
}
