//! HTTP client for the remote sandbox analysis API.
//!
//! The portal only needs three endpoints: file task creation, URL task
//! creation and report retrieval. They are exposed through the
//! [`SandboxBackend`] trait so the dispatcher and resolver can be exercised
//! against in-memory fakes; [`SandboxClient`] is the reqwest implementation.

pub mod api;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use portal_core::SubmissionError;
use reqwest::Client;
use std::time::Duration;

pub use api::{CreateTaskResponse, FetchError, ReportFetch};

/// Form fields sent along with a task-creation request.
pub type TaskFields = [(&'static str, String)];

/// Operations the portal performs against the sandbox.
#[async_trait]
pub trait SandboxBackend: Send + Sync {
    /// Create a task for an uploaded file. Returns the remote task id.
    async fn create_file_task(
        &self,
        filename: &str,
        content: Bytes,
        fields: &TaskFields,
    ) -> Result<u64, SubmissionError>;

    /// Create a task for a URL. Returns the remote task id.
    async fn create_url_task(&self, url: &str, fields: &TaskFields)
        -> Result<u64, SubmissionError>;

    /// Fetch a task's report.
    async fn fetch_report(&self, task_id: u64) -> Result<ReportFetch, FetchError>;
}

/// reqwest-backed sandbox API client.
#[derive(Clone, Debug)]
pub struct SandboxClient {
    client: Client,
    base_url: String,
}

impl SandboxClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .with_context(|| format!("Invalid sandbox API URL: {}", base_url))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, base_url })
    }

    /// Create client from the portal configuration.
    pub fn from_config(config: &portal_core::Config) -> Result<Self> {
        Self::new(
            &config.sandbox_api_url,
            Duration::from_secs(config.sandbox_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a task-creation request and extract the task id.
    async fn send_create(&self, request: reqwest::RequestBuilder) -> Result<u64, SubmissionError> {
        let response = request
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(SubmissionError::Remote(format!(
                "status {}: {}",
                status, error_text
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        CreateTaskResponse::task_id_from_slice(&body)
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl SandboxBackend for SandboxClient {
    async fn create_file_task(
        &self,
        filename: &str,
        content: Bytes,
        fields: &TaskFields,
    ) -> Result<u64, SubmissionError> {
        let mut form = reqwest::multipart::Form::new().part(
            "file",
            reqwest::multipart::Part::bytes(content.to_vec()).file_name(filename.to_string()),
        );
        for (name, value) in fields {
            form = form.text(*name, value.clone());
        }

        let url = self.build_url(api::CREATE_FILE_PATH);
        self.send_create(self.client.post(&url).multipart(form))
            .await
    }

    async fn create_url_task(
        &self,
        url: &str,
        fields: &TaskFields,
    ) -> Result<u64, SubmissionError> {
        let mut form: Vec<(&str, &str)> = fields
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        form.push(("url", url));

        let endpoint = self.build_url(api::CREATE_URL_PATH);
        self.send_create(self.client.post(&endpoint).form(&form))
            .await
    }

    async fn fetch_report(&self, task_id: u64) -> Result<ReportFetch, FetchError> {
        let url = self.build_url(&api::report_path(task_id));
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(task_id, status = status.as_u16(), "Report not ready");
            return Ok(ReportFetch::NotReady {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        serde_json::from_slice(&body)
            .map(ReportFetch::Ready)
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}
