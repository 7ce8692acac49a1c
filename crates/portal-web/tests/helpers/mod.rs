//! Test helpers: build the router against a mock sandbox API.
//!
//! Run from workspace root: `cargo test -p portal-web`.

#![allow(dead_code)]

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use mockito::ServerGuard;
use portal_api_client::SandboxClient;
use portal_core::{encode_custom, Config, CustomMetadata, ReportFormat};
use portal_web::setup::routes;
use portal_web::AppState;
use std::sync::Arc;

/// Test application: server plus the mock sandbox behind it.
pub struct TestApp {
    pub server: TestServer,
    pub sandbox: ServerGuard,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }
}

fn build_server(config: Config) -> TestServer {
    let client = SandboxClient::from_config(&config).expect("sandbox client");
    let state = Arc::new(AppState::new(config.clone(), Arc::new(client)));
    TestServer::new(routes::setup_routes(&config, state)).expect("test server")
}

pub async fn setup_test_app() -> TestApp {
    let sandbox = mockito::Server::new_async().await;
    let config = Config {
        sandbox_api_url: sandbox.url(),
        sandbox_timeout_secs: 5,
        ..Config::default()
    };
    TestApp {
        server: build_server(config),
        sandbox,
    }
}

/// An app whose sandbox address refuses connections.
pub fn setup_unreachable_app() -> TestServer {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    build_server(Config {
        sandbox_api_url: format!("http://{}", addr),
        sandbox_timeout_secs: 2,
        ..Config::default()
    })
}

/// Form fields that pass validation, without any target.
pub fn valid_form() -> MultipartForm {
    MultipartForm::new()
        .add_text("timeout", "5")
        .add_text("priority", "1")
        .add_text("machine", "xp1")
        .add_text("route", "vpn")
        .add_text("email", "analyst@example.com")
        .add_text("report", "txt")
        .add_text("report", "html")
}

pub fn sample_part(name: &str) -> Part {
    Part::bytes(bytes::Bytes::from_static(b"MZ\x90\x00\x03"))
        .file_name(name)
        .mime_type("application/octet-stream")
}

/// Sandbox report body whose custom metadata carries `uniqid`.
pub fn report_json(uniqid: &str) -> String {
    let mut custom = CustomMetadata::new("analyst@example.com", vec![ReportFormat::Txt]);
    custom.uniqid = Some(uniqid.to_string());
    serde_json::json!({
        "info": {
            "id": 26,
            "category": "file",
            "score": 4.0,
            "custom": encode_custom(&custom).expect("encode custom")
        },
        "target": { "file": { "name": "sample.exe" } },
        "signatures": [{ "description": "Creates a hidden window" }]
    })
    .to_string()
}
