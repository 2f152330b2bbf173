//! HTTP entry point.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{PosterError, ValidationError};
use crate::pipeline::Pipeline;
use crate::response::PostResponse;

/// Upper bound for a request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(generate_post).fallback(method_not_allowed))
        .route("/generate", post(generate_post).fallback(method_not_allowed))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run one post request.
async fn generate_post(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<PostResponse, PosterError> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("post_request", %request_id);

    async move {
        let body = match body {
            Ok(bytes) => bytes,
            Err(rejection) => {
                tracing::warn!(error = %rejection, "Rejected request body");
                return Err(body_rejection(&rejection));
            }
        };

        let body: Value = match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => {
                return Err(PosterError::from(ValidationError::invalid(
                    "body",
                    format!("request body is not valid JSON: {e}"),
                )))
            }
        };

        match state.pipeline.handle(&body).await {
            Ok(outcome) => Ok(PostResponse::from(outcome)),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    kind = e.kind(),
                    status = e.status_code().as_u16(),
                    "Post request failed"
                );
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

fn body_rejection(rejection: &BytesRejection) -> PosterError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        PosterError::PayloadTooLarge {
            limit_bytes: MAX_BODY_BYTES,
        }
    } else {
        PosterError::from(ValidationError::invalid("body", rejection.body_text()))
    }
}

async fn method_not_allowed() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "success": false,
            "error": "method not allowed; send a POST with a JSON body",
            "error_kind": "method_not_allowed"
        })),
    )
}

/// Health check endpoint.
async fn health_check() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}
