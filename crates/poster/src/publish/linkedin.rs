//! LinkedIn REST v2 client.
//!
//! Flow: resolve the member id, optionally register and upload an image
//! asset, then create a UGC post. Image steps are best effort: any failure
//! falls back to a text-only post.

use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::{DeliveryError, DeliveryErrorKind};
use crate::request::DeliveryMethod;

const RESTLI_HEADER: &str = "X-Restli-Protocol-Version";
const RESTLI_VERSION: &str = "2.0.0";
const RESTLI_ID_HEADER: &str = "x-restli-id";
const UPLOAD_MECHANISM: &str = "com.linkedin.digitalmedia.uploading.MediaUploadHttpRequest";
const SHARE_CONTENT: &str = "com.linkedin.ugc.ShareContent";
const MEMBER_VISIBILITY: &str = "com.linkedin.ugc.MemberNetworkVisibility";

/// Public URL of a feed update.
#[must_use]
pub fn post_url(post_id: &str) -> String {
    format!("https://www.linkedin.com/feed/update/{post_id}")
}

/// A created post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedInPost {
    pub id: String,
    pub url: String,
    /// Whether the image made it into the post.
    pub with_image: bool,
}

/// Image to attach to a post.
#[derive(Debug, Clone, Copy)]
pub struct ImageAttachment<'a> {
    pub data: &'a [u8],
    pub mime: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Deserialize)]
struct Profile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RegisterUploadResponse {
    value: RegisterUploadValue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterUploadValue {
    asset: String,
    upload_mechanism: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct LinkedInErrorBody {
    message: String,
}

/// An image registered and uploaded as a LinkedIn asset.
#[derive(Debug, Clone, PartialEq, Eq)]
struct UploadTarget {
    upload_url: String,
    asset: String,
}

/// Client bound to one member access token.
pub struct LinkedInClient {
    client: Client,
    base_url: String,
    access_token: String,
    timeout: Duration,
}

impl LinkedInClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            timeout,
        }
    }

    /// Publish a post, attaching the image when one is given and uploads.
    pub async fn publish(
        &self,
        text: &str,
        image: Option<ImageAttachment<'_>>,
    ) -> Result<LinkedInPost, DeliveryError> {
        let member_id = self.me().await?;
        let author = format!("urn:li:person:{member_id}");

        let asset = match image {
            Some(image) => match self.upload_image(&author, image).await {
                Ok(asset) => Some((asset, image.description)),
                Err(e) => {
                    tracing::warn!(error = %e, "Image upload failed, posting text only");
                    None
                }
            },
            None => None,
        };

        let with_image = asset.is_some();
        let id = self
            .create_post(&author, text, asset.as_ref().map(|(a, d)| (a.as_str(), *d)))
            .await?;

        tracing::info!(post_id = %id, with_image, "LinkedIn post created");

        Ok(LinkedInPost {
            url: post_url(&id),
            id,
            with_image,
        })
    }

    /// Resolve the authenticated member id.
    pub async fn me(&self) -> Result<String, DeliveryError> {
        let response = self
            .send(self.client.get(format!("{}/me", self.base_url)))
            .await?;
        let profile: Profile = parse_json(response).await?;
        Ok(profile.id)
    }

    async fn upload_image(
        &self,
        author: &str,
        image: ImageAttachment<'_>,
    ) -> Result<String, DeliveryError> {
        let target = self.register_upload(author).await?;

        self.send(
            self.client
                .put(&target.upload_url)
                .header(reqwest::header::CONTENT_TYPE, image.mime)
                .body(image.data.to_vec()),
        )
        .await?;

        tracing::debug!(asset = %target.asset, bytes = image.data.len(), "Image uploaded");
        Ok(target.asset)
    }

    async fn register_upload(&self, author: &str) -> Result<UploadTarget, DeliveryError> {
        let body = json!({
            "registerUploadRequest": {
                "recipes": ["urn:li:digitalmediaRecipe:feedshare-image"],
                "owner": author,
                "serviceRelationships": [{
                    "relationshipType": "OWNER",
                    "identifier": "urn:li:userGeneratedContent"
                }]
            }
        });

        let response = self
            .send(
                self.client
                    .post(format!("{}/assets?action=registerUpload", self.base_url))
                    .json(&body),
            )
            .await?;

        let parsed: RegisterUploadResponse = parse_json(response).await?;
        let upload_url = parsed
            .value
            .upload_mechanism
            .get(UPLOAD_MECHANISM)
            .and_then(|m| m.get("uploadUrl"))
            .and_then(Value::as_str)
            .ok_or_else(|| provider_error("registerUpload response has no upload URL"))?
            .to_string();

        Ok(UploadTarget {
            upload_url,
            asset: parsed.value.asset,
        })
    }

    async fn create_post(
        &self,
        author: &str,
        text: &str,
        media: Option<(&str, &str)>,
    ) -> Result<String, DeliveryError> {
        let body = ugc_post_body(author, text, media);

        let response = self
            .send(
                self.client
                    .post(format!("{}/ugcPosts", self.base_url))
                    .json(&body),
            )
            .await?;

        let header_id = response
            .headers()
            .get(RESTLI_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let text = response.text().await.map_err(transport_error)?;
        let body_id = serde_json::from_str::<Value>(&text)
            .ok()
            .and_then(|v| v.get("id").and_then(Value::as_str).map(ToString::to_string));

        body_id
            .or(header_id)
            .ok_or_else(|| provider_error("ugcPosts response carried no post id"))
    }

    /// Attach auth headers, send, and map non-success statuses.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, DeliveryError> {
        let response = request
            .bearer_auth(&self.access_token)
            .header(RESTLI_HEADER, RESTLI_VERSION)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = retry_after_secs(response.headers());
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<LinkedInErrorBody>(&text)
            .map_or(text, |e| e.message);

        Err(status_error(status, message, retry_after))
    }
}

fn ugc_post_body(author: &str, text: &str, media: Option<(&str, &str)>) -> Value {
    let share_content = match media {
        Some((asset, description)) => json!({
            "shareCommentary": { "text": text },
            "shareMediaCategory": "IMAGE",
            "media": [{
                "status": "READY",
                "description": { "text": description },
                "media": asset,
                "title": { "text": description }
            }]
        }),
        None => json!({
            "shareCommentary": { "text": text },
            "shareMediaCategory": "NONE"
        }),
    };

    json!({
        "author": author,
        "lifecycleState": "PUBLISHED",
        "specificContent": { SHARE_CONTENT: share_content },
        "visibility": { MEMBER_VISIBILITY: "PUBLIC" }
    })
}

/// Map a LinkedIn status onto a delivery error.
fn status_error(status: StatusCode, message: String, retry_after: Option<u64>) -> DeliveryError {
    let kind = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DeliveryErrorKind::Auth,
        StatusCode::TOO_MANY_REQUESTS => DeliveryErrorKind::RateLimited,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            DeliveryErrorKind::MalformedPayload
        }
        _ => DeliveryErrorKind::Provider,
    };

    tracing::warn!(status = status.as_u16(), kind = %kind, "LinkedIn API error");

    DeliveryError::new(
        DeliveryMethod::LinkedIn,
        kind,
        format!("LinkedIn API error ({}): {message}", status.as_u16()),
    )
    .with_retry_after(retry_after)
}

fn retry_after_secs(headers: &HeaderMap<HeaderValue>) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

async fn parse_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, DeliveryError> {
    let text = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&text)
        .map_err(|e| provider_error(format!("unexpected LinkedIn response: {e}")))
}

fn transport_error(e: reqwest::Error) -> DeliveryError {
    provider_error(format!("LinkedIn request failed: {e}"))
}

fn provider_error(message: impl Into<String>) -> DeliveryError {
    DeliveryError::new(DeliveryMethod::LinkedIn, DeliveryErrorKind::Provider, message)
}
