//! HTTP surface tests through the axum router.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use poster::server::MAX_BODY_BYTES;
use poster::{build_router, AppState};

fn router(server: &MockServer) -> Router {
    let (pipeline, _) = test_pipeline(server);
    build_router(AppState::new(pipeline))
}

fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    let response = router(&server)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_get_on_root_is_method_not_allowed() {
    let server = MockServer::start().await;
    let response = router(&server)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("POST"));
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let server = MockServer::start().await;
    let response = router(&server)
        .oneshot(post_json("/", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "validation");
    assert_eq!(body["field"], "body");
}

#[tokio::test]
async fn test_missing_topic_is_bad_request() {
    let server = MockServer::start().await;
    let request = json!({
        "openai_api_key": "sk-test",
        "linkedin_token": "li-token"
    });
    let response = router(&server)
        .oneshot(post_json("/", request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["field"], "topic");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_both_delivery_methods_rejected() {
    let server = MockServer::start().await;
    let mut request = email_request("AI");
    request["post_to_linkedin"] = json!(true);
    request["linkedin_token"] = json!("li-token");

    let response = router(&server)
        .oneshot(post_json("/", request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["field"], "send_email");
}

#[tokio::test]
async fn test_email_request_succeeds() {
    let server = MockServer::start().await;
    mock_chat(&server, "Latest trends in AI engineering, in five bullets. #AI").await;

    let response = router(&server)
        .oneshot(post_json(
            "/generate",
            email_request("Latest trends in AI engineering").to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["delivery_method"], "email");
    assert_eq!(body["email_sent"], true);
    assert_eq!(body["destination_email"], "author@example.com");
    assert_eq!(
        body["post_content"],
        "Latest trends in AI engineering, in five bullets. #AI"
    );
    assert!(body["image_url"].is_null());
    assert_eq!(body["engagement_analysis"]["hashtag_suggestions"], json!(["#AI"]));
    assert_eq!(body["research"]["sources"], json!([]));
}

#[tokio::test]
async fn test_linkedin_success_shape() {
    let server = MockServer::start().await;
    mock_chat(&server, "Agents are here. #AI").await;
    mock_linkedin_profile(&server).await;
    mock_linkedin_post(&server).await;

    let response = router(&server)
        .oneshot(post_json(
            "/",
            linkedin_request("AI agents", false).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["delivery_method"], "linkedin");
    assert_eq!(body["post_id"], LINKEDIN_POST_ID);
    assert_eq!(
        body["post_url"],
        format!("https://www.linkedin.com/feed/update/{LINKEDIN_POST_ID}")
    );
    assert!(body.get("email_sent").is_none());
}

#[tokio::test]
async fn test_linkedin_rate_limit_maps_to_429() {
    let server = MockServer::start().await;
    mock_chat(&server, "Agents are here. #AI").await;
    Mock::given(method("GET"))
        .and(path("/linkedin/v2/me"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let response = router(&server)
        .oneshot(post_json(
            "/",
            linkedin_request("AI agents", false).to_string(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = read_json(response).await;
    assert_eq!(body["error_kind"], "delivery");
    assert_eq!(body["delivery_method"], "linkedin");
    assert_eq!(body["delivery_error"], "rate_limited");
    assert_eq!(body["retry_after_secs"], 30);
    assert_eq!(body["post_content"], "Agents are here. #AI");
}

#[tokio::test]
async fn test_generation_failure_maps_to_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let response = router(&server)
        .oneshot(post_json("/", email_request("AI").to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json(response).await;
    assert_eq!(body["error_kind"], "upstream");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Incorrect API key provided"));
    assert!(body.get("post_content").is_none());
}

#[tokio::test]
async fn test_oversized_body_is_payload_too_large() {
    let server = MockServer::start().await;
    let padding = "x".repeat(MAX_BODY_BYTES + 1);
    let request = json!({"topic": "AI", "openai_api_key": "sk-test", "padding": padding});

    let response = router(&server)
        .oneshot(post_json("/", request.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "payload_too_large");
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_slow_upstream_maps_to_gateway_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_completion("Too late. #AI"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.server.request_timeout = Duration::from_millis(300);
    let (pipeline, _) = test_pipeline_with(config, Arc::new(RecordingMailer::default()));

    let response = build_router(AppState::new(pipeline))
        .oneshot(post_json("/", email_request("AI").to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = read_json(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "timeout");
    assert!(body.get("post_content").is_none());
}
