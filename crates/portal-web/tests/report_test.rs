//! Report endpoint integration tests.

mod helpers;

use helpers::{report_json, setup_test_app, setup_unreachable_app};
use mockito::Matcher;
use portal_core::{new_token, CorrelationId};

#[tokio::test]
async fn test_report_served_for_matching_token() {
    let mut app = setup_test_app().await;
    let token = new_token();
    app.sandbox
        .mock("GET", "/tasks/report/26")
        .with_status(200)
        .with_body(report_json(token.as_str()))
        .create_async()
        .await;

    let id = CorrelationId::compose(&token, 26);
    let response = app.client().get(&format!("/report/{}.txt", id)).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "text/plain; charset=utf-8");
    let body = response.text();
    assert!(body.contains("sample.exe"));
    assert!(body.contains("Creates a hidden window"));
}

#[tokio::test]
async fn test_pdf_report() {
    let mut app = setup_test_app().await;
    let token = new_token();
    app.sandbox
        .mock("GET", "/tasks/report/26")
        .with_status(200)
        .with_body(report_json(token.as_str()))
        .create_async()
        .await;

    let id = CorrelationId::compose(&token, 26);
    let response = app.client().get(&format!("/report/{}.pdf", id)).await;

    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "application/pdf");
    assert!(response.as_bytes().starts_with(b"%PDF-"));
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let mut app = setup_test_app().await;
    app.sandbox
        .mock("GET", "/tasks/report/26")
        .with_status(200)
        .with_body(report_json(new_token().as_str()))
        .create_async()
        .await;

    let id = CorrelationId::compose(&new_token(), 26);
    let response = app.client().get(&format!("/report/{}.html", id)).await;

    assert_eq!(response.status_code(), 403);
    let page = response.text();
    assert!(page.contains("Task authentication failed"));
    assert!(!page.contains("Creates a hidden window"));
}

#[tokio::test]
async fn test_invalid_format_makes_no_remote_call() {
    let mut app = setup_test_app().await;
    let remote = app
        .sandbox
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let id = CorrelationId::compose(&new_token(), 26);
    for path in [format!("/report/{}.exe", id), format!("/report/{}", id)] {
        let response = app.client().get(&path).await;
        assert_eq!(response.status_code(), 404, "{}", path);
        assert!(response.text().contains("Invalid report extension"));
    }
    remote.assert_async().await;
}

#[tokio::test]
async fn test_invalid_task_id() {
    let app = setup_test_app().await;
    let token = new_token();
    let response = app.client().get(&format!("/report/{}zz.txt", token)).await;
    assert_eq!(response.status_code(), 404);
    assert!(response.text().contains("Invalid task identifier"));
}

#[tokio::test]
async fn test_pending_report_refreshes() {
    let mut app = setup_test_app().await;
    app.sandbox
        .mock("GET", "/tasks/report/5")
        .with_status(404)
        .with_body(r#"{"message": "Report not found"}"#)
        .create_async()
        .await;

    let id = CorrelationId::compose(&new_token(), 5);
    let response = app.client().get(&format!("/report/{}.txt", id)).await;

    assert_eq!(response.status_code(), 200);
    let page = response.text();
    assert!(page.contains("http-equiv=\"refresh\""));
    assert!(page.contains("Analysis in progress"));
}

#[tokio::test]
async fn test_foreign_task_is_invalid() {
    let mut app = setup_test_app().await;
    app.sandbox
        .mock("GET", "/tasks/report/7")
        .with_status(200)
        .with_body(r#"{"info": {"id": 7, "custom": ""}}"#)
        .create_async()
        .await;

    let id = CorrelationId::compose(&new_token(), 7);
    let response = app.client().get(&format!("/report/{}.txt", id)).await;
    assert_eq!(response.status_code(), 404);
    assert!(response.text().contains("Invalid task"));
}

#[tokio::test]
async fn test_unreachable_backend() {
    let server = setup_unreachable_app();
    let id = CorrelationId::compose(&new_token(), 1);
    let response = server.get(&format!("/report/{}.txt", id)).await;

    assert_eq!(response.status_code(), 503);
    assert!(response
        .text()
        .contains("It would appear our backend is down, please contact us at your earliest convenience."));
}
