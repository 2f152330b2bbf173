//! Success response body.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::generate::EngagementAnalysis;
use crate::pipeline::PipelineOutcome;
use crate::publish::DeliveryReceipt;
use crate::request::DeliveryMethod;
use crate::research::ResearchResult;

/// JSON returned for a delivered post.
#[derive(Debug, Clone, Serialize)]
pub struct PostResponse {
    pub success: bool,
    pub delivery_method: DeliveryMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_email: Option<String>,
    pub post_content: String,
    pub image_url: Option<String>,
    pub engagement_analysis: EngagementAnalysis,
    pub research: ResearchResult,
}

impl From<PipelineOutcome> for PostResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        let image_url = outcome.post.image_url().map(ToString::to_string);

        let mut response = Self {
            success: true,
            delivery_method: outcome.method,
            post_id: None,
            post_url: None,
            email_sent: None,
            destination_email: None,
            post_content: outcome.post.body,
            image_url,
            engagement_analysis: outcome.analysis,
            research: outcome.research,
        };

        match outcome.receipt {
            DeliveryReceipt::LinkedIn { post_id, post_url } => {
                response.post_id = Some(post_id);
                response.post_url = Some(post_url);
            }
            DeliveryReceipt::Email { destination } => {
                response.email_sent = Some(true);
                response.destination_email = Some(destination);
            }
        }

        response
    }
}

impl IntoResponse for PostResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{analyze, GeneratedPost};
    use crate::research::ResearchFailure;

    fn outcome(receipt: DeliveryReceipt, method: DeliveryMethod) -> PipelineOutcome {
        let body = "Hello #Rust".to_string();
        PipelineOutcome {
            method,
            receipt,
            analysis: analyze(&body, 5),
            post: GeneratedPost { body, image: None },
            research: ResearchResult {
                sources: Vec::new(),
                failures: vec![ResearchFailure {
                    url: "http://127.0.0.1:9/".to_string(),
                    reason: "HTTP 503".to_string(),
                }],
            },
        }
    }

    #[test]
    fn test_linkedin_shape() {
        let response = PostResponse::from(outcome(
            DeliveryReceipt::LinkedIn {
                post_id: "urn:li:share:1".to_string(),
                post_url: "https://www.linkedin.com/feed/update/urn:li:share:1".to_string(),
            },
            DeliveryMethod::LinkedIn,
        ));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["delivery_method"], "linkedin");
        assert_eq!(json["post_id"], "urn:li:share:1");
        assert!(json["image_url"].is_null());
        assert!(json.get("email_sent").is_none());
        assert_eq!(json["research"]["failures"][0]["reason"], "HTTP 503");
        assert_eq!(json["engagement_analysis"]["hashtag_suggestions"][0], "#Rust");
    }

    #[test]
    fn test_email_shape() {
        let response = PostResponse::from(outcome(
            DeliveryReceipt::Email {
                destination: "me@example.com".to_string(),
            },
            DeliveryMethod::Email,
        ));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["delivery_method"], "email");
        assert_eq!(json["email_sent"], true);
        assert_eq!(json["destination_email"], "me@example.com");
        assert!(json.get("post_id").is_none());
        assert_eq!(json["post_content"], "Hello #Rust");
    }
}
