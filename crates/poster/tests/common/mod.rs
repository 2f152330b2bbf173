//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use poster::config::ServiceConfig;
use poster::publish::{Mailer, OutgoingEmail, SmtpCredentials};
use poster::research::HttpFetcher;
use poster::{DeliveryError, Pipeline};

/// Smallest valid PNG header, enough for MIME sniffing.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

pub const LINKEDIN_POST_ID: &str = "urn:li:share:7777";
pub const LINKEDIN_ASSET: &str = "urn:li:digitalmediaAsset:C5522";

/// Mailer that records instead of sending.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<(OutgoingEmail, SmtpCredentials)>>,
    pub fail_with: Mutex<Option<DeliveryError>>,
}

impl RecordingMailer {
    pub fn failing(error: DeliveryError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Mutex::new(Some(error)),
        }
    }

    pub fn sent(&self) -> Vec<(OutgoingEmail, SmtpCredentials)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(
        &self,
        email: &OutgoingEmail,
        credentials: &SmtpCredentials,
    ) -> Result<(), DeliveryError> {
        if let Some(error) = self.fail_with.lock().unwrap().clone() {
            return Err(error);
        }
        self.sent
            .lock()
            .unwrap()
            .push((email.clone(), credentials.clone()));
        Ok(())
    }
}

/// Configuration pointing every API at the mock server.
pub fn test_config(server: &MockServer) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.openai.api_base = format!("{}/v1", server.uri());
    config.openai.timeout = Duration::from_secs(5);
    config.linkedin.api_base = format!("{}/linkedin/v2", server.uri());
    config.linkedin.timeout = Duration::from_secs(5);
    config.research.timeout = Duration::from_secs(2);
    config.server.request_timeout = Duration::from_secs(30);
    config
}

/// Pipeline wired to the mock server and a recording mailer.
pub fn test_pipeline(server: &MockServer) -> (Pipeline, Arc<RecordingMailer>) {
    test_pipeline_with(test_config(server), Arc::new(RecordingMailer::default()))
}

pub fn test_pipeline_with(
    config: ServiceConfig,
    mailer: Arc<RecordingMailer>,
) -> (Pipeline, Arc<RecordingMailer>) {
    let fetcher = HttpFetcher::new(config.research.timeout).unwrap();
    let pipeline = Pipeline::new(config, Arc::new(fetcher), mailer.clone()).unwrap();
    (pipeline, mailer)
}

pub fn email_request(topic: &str) -> Value {
    json!({
        "openai_api_key": "sk-test",
        "topic": topic,
        "links": [],
        "generate_image": false,
        "post_to_linkedin": false,
        "send_email": true,
        "email_app_password": "app-password",
        "destination_email": "author@example.com"
    })
}

pub fn linkedin_request(topic: &str, generate_image: bool) -> Value {
    json!({
        "openai_api_key": "sk-test",
        "topic": topic,
        "generate_image": generate_image,
        "post_to_linkedin": true,
        "linkedin_token": "li-token"
    })
}

pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "model": "gpt-4o-2024-08-06",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 80, "total_tokens": 200}
    })
}

pub async fn mock_chat(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(content)))
        .mount(server)
        .await;
}

pub async fn mock_image(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/images/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "created": 1_700_000_000,
            "data": [{
                "url": format!("{}/images/post.png", server.uri()),
                "revised_prompt": "A modern office"
            }]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/images/post.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(PNG_BYTES.to_vec(), "image/png"))
        .mount(server)
        .await;
}

pub async fn mock_linkedin_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/linkedin/v2/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "abc123",
            "localizedFirstName": "Ada"
        })))
        .mount(server)
        .await;
}

pub async fn mock_linkedin_upload(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/linkedin/v2/assets"))
        .and(query_param("action", "registerUpload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": {
                "asset": LINKEDIN_ASSET,
                "uploadMechanism": {
                    "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest": {
                        "uploadUrl": format!("{}/upload/C5522", server.uri()),
                        "headers": {}
                    }
                }
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/upload/C5522"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
}

pub async fn mock_linkedin_post(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/linkedin/v2/ugcPosts"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("x-restli-id", LINKEDIN_POST_ID)
                .set_body_json(json!({"id": LINKEDIN_POST_ID})),
        )
        .mount(server)
        .await;
}

/// Serve an HTML article at `route`.
pub async fn mock_article(server: &MockServer, route: &str, title: &str, text: &str) {
    let html = format!(
        "<html><head><title>{title}</title></head><body><nav>Menu</nav><article><p>{text}</p></article></body></html>"
    );
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

/// JSON bodies of every request received at `route`.
pub async fn bodies_for(server: &MockServer, route: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == route)
        .filter_map(|r| serde_json::from_slice(&r.body).ok())
        .collect()
}

/// Count of requests received at `route`.
pub async fn hits(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == route)
        .count()
}
