//! Integration tests for request dispatch through the core and the HTTP router

use super::common::fixtures::{default_mocks, mock_core};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use steptrace::runner::mock::{MockConfig, MockTraceBuilder, MockTraceError, MockTraceRunner};
use steptrace::web::{build_router, WebAppState};
use steptrace::{Language, TraceError};
use tower::ServiceExt;

#[tokio::test]
async fn test_rejected_requests_never_reach_a_runner() {
    let (core, python, cpp) = default_mocks();

    let cases: [(Option<&str>, Option<&str>); 5] = [
        (None, Some("python")),
        (Some(""), Some("cpp")),
        (Some("x = 1"), Some("javascript")),
        (Some("x = 1"), Some("")),
        (Some("x = 1"), None),
    ];
    for (code, language) in cases {
        let err = core.trace(code, language).await.unwrap_err();
        assert!(err.is_request_error(), "unexpected error: {err}");
    }

    assert_eq!(python.call_count(), 0);
    assert_eq!(cpp.call_count(), 0);
}

#[tokio::test]
async fn test_language_aliases_dispatch() {
    let (core, python, cpp) = default_mocks();

    core.trace(Some("x = 1"), Some("py")).await.unwrap();
    core.trace(Some("x = 1"), Some("python3")).await.unwrap();
    core.trace(Some("int main() {}"), Some("c++")).await.unwrap();

    assert_eq!(python.call_count(), 2);
    assert_eq!(cpp.call_count(), 1);
    let request = cpp.last_request().unwrap();
    assert_eq!(request.language, Language::Cpp);
    assert_eq!(request.code, "int main() {}");
}

#[tokio::test]
async fn test_program_failure_is_a_successful_response() {
    let trace = MockTraceBuilder::new()
        .step(1, &[("x", 1)])
        .failed("ZeroDivisionError: division by zero");
    let (core, _, _) = mock_core(
        MockTraceRunner::new(Language::Python).with_trace(trace),
        MockTraceRunner::new(Language::Cpp),
    );
    let app = build_router(WebAppState::new(core), true);

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/visualize")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"code": "x = 1\nx / 0", "language": "python"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let entries = json["trace"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1]["error"], "ZeroDivisionError: division by zero");
}

#[tokio::test]
async fn test_infrastructure_failure_is_transport_error() {
    let (core, _, cpp) = mock_core(
        MockTraceRunner::new(Language::Python),
        MockTraceRunner::new(Language::Cpp).with_config(MockConfig::default().failing_with(
            MockTraceError::ProcessFailed {
                code: Some(125),
                stderr: "Cannot connect to the Docker daemon".into(),
            },
        )),
    );

    let err = core
        .trace(Some("int main() {}"), Some("cpp"))
        .await
        .unwrap_err();
    assert!(matches!(err, TraceError::ProcessFailed { .. }));
    assert!(!err.is_request_error());
    assert_eq!(cpp.call_count(), 1);

    let app = build_router(WebAppState::new(core), true);
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/visualize")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"code": "int main() {}", "language": "cpp"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
