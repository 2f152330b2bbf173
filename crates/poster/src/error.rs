//! Error types for the post pipeline.
//!
//! Every failure surfaced to a caller is one of three kinds:
//! - [`ValidationError`]: bad or missing input, nothing was attempted
//! - [`UpstreamError`]: research or generation API failure
//! - [`DeliveryError`]: LinkedIn or email delivery failure

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use std::time::Duration;

use crate::request::DeliveryMethod;

/// Result type alias for pipeline operations.
pub type PosterResult<T> = Result<T, PosterError>;

/// Input rejected before any network call was made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: {message}")]
pub struct ValidationError {
    /// Name of the offending request field.
    pub field: String,
    /// Human readable reason.
    pub message: String,
}

impl ValidationError {
    /// A required field was absent, null or blank.
    pub fn missing(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("missing required field `{field}`");
        Self { field, message }
    }

    /// A field was present but unusable.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure talking to a research or generation API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The API answered with a non-success status.
    #[error("{service} API error ({status}): {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    /// The API answered but the payload was not usable.
    #[error("{service} returned an unusable response: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },

    /// A prompt template failed to render.
    #[error("prompt rendering failed: {0}")]
    Prompt(#[from] handlebars::RenderError),
}

/// Provider-independent classification of a delivery failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryErrorKind {
    /// Credentials were rejected.
    Auth,
    /// The provider throttled us.
    RateLimited,
    /// The provider rejected the content or addressing.
    MalformedPayload,
    /// Anything else: transport failures, unexpected statuses.
    Provider,
}

impl DeliveryErrorKind {
    /// Short label used in messages and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::RateLimited => "rate_limited",
            Self::MalformedPayload => "malformed_payload",
            Self::Provider => "provider",
        }
    }

    /// HTTP status returned to the caller for this kind.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::Auth => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::MalformedPayload => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Provider => StatusCode::BAD_GATEWAY,
        }
    }
}

impl std::fmt::Display for DeliveryErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// LinkedIn or email delivery failed.
#[derive(Debug, Clone, Error)]
#[error("{method} delivery failed ({kind}): {message}")]
pub struct DeliveryError {
    /// Which branch failed.
    pub method: DeliveryMethod,
    /// Classified cause.
    pub kind: DeliveryErrorKind,
    /// Provider detail.
    pub message: String,
    /// Seconds to wait before retrying, when the provider said so.
    pub retry_after_secs: Option<u64>,
}

impl DeliveryError {
    /// Create a delivery error without retry information.
    pub fn new(method: DeliveryMethod, kind: DeliveryErrorKind, message: impl Into<String>) -> Self {
        Self {
            method,
            kind,
            message: message.into(),
            retry_after_secs: None,
        }
    }

    /// Attach a retry hint.
    #[must_use]
    pub const fn with_retry_after(mut self, secs: Option<u64>) -> Self {
        self.retry_after_secs = secs;
        self
    }
}

/// Top-level error returned by the pipeline and the HTTP endpoint.
#[derive(Debug, Error)]
pub enum PosterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// Delivery failed after content was generated. The content is kept so
    /// the caller still receives it.
    #[error("{source}")]
    Delivery {
        #[source]
        source: DeliveryError,
        post_content: Option<String>,
    },

    /// The request budget ran out. Content is kept when generation had
    /// already finished.
    #[error("request timed out after {}ms", budget.as_millis())]
    TimedOut {
        budget: Duration,
        post_content: Option<String>,
    },

    #[error("request body exceeds {limit_bytes} bytes")]
    PayloadTooLarge { limit_bytes: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DeliveryError> for PosterError {
    fn from(source: DeliveryError) -> Self {
        Self::Delivery {
            source,
            post_content: None,
        }
    }
}

impl PosterError {
    /// Stable machine-readable category.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Upstream(_) => "upstream",
            Self::Delivery { .. } => "delivery",
            Self::TimedOut { .. } => "timeout",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::Internal(_) => "internal",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Delivery { source, .. } => source.kind.status_code(),
            Self::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON body describing this error.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        let mut body = ErrorBody {
            success: false,
            error: self.to_string(),
            error_kind: self.kind(),
            field: None,
            delivery_method: None,
            delivery_error: None,
            retry_after_secs: None,
            post_content: None,
        };

        match self {
            Self::Validation(e) => body.field = Some(e.field.clone()),
            Self::Delivery {
                source,
                post_content,
            } => {
                body.delivery_method = Some(source.method);
                body.delivery_error = Some(source.kind);
                body.retry_after_secs = source.retry_after_secs;
                body.post_content.clone_from(post_content);
            }
            Self::TimedOut { post_content, .. } => body.post_content.clone_from(post_content),
            _ => {}
        }

        body
    }
}

/// Serialized error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub error_kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_method: Option<DeliveryMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_error: Option<DeliveryErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_content: Option<String>,
}

impl IntoResponse for PosterError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_body())).into_response()
    }
}
