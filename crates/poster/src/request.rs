//! Request validation.
//!
//! Turns the raw JSON body into a typed [`PostRequest`]. Nothing downstream
//! runs until this succeeds.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use url::Url;

use crate::config::DEFAULT_MAX_LENGTH;
use crate::error::ValidationError;

/// Which delivery branch a request takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    LinkedIn,
    Email,
}

impl DeliveryMethod {
    /// Wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LinkedIn => "linkedin",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for DeliveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selected delivery branch with its credentials.
#[derive(Clone, PartialEq, Eq)]
pub enum DeliveryTarget {
    LinkedIn {
        access_token: String,
    },
    Email {
        destination: String,
        app_password: String,
    },
}

impl DeliveryTarget {
    #[must_use]
    pub const fn method(&self) -> DeliveryMethod {
        match self {
            Self::LinkedIn { .. } => DeliveryMethod::LinkedIn,
            Self::Email { .. } => DeliveryMethod::Email,
        }
    }
}

impl fmt::Debug for DeliveryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkedIn { .. } => f
                .debug_struct("LinkedIn")
                .field("access_token", &"[redacted]")
                .finish(),
            Self::Email { destination, .. } => f
                .debug_struct("Email")
                .field("destination", destination)
                .field("app_password", &"[redacted]")
                .finish(),
        }
    }
}

/// A validated post request.
#[derive(Clone)]
pub struct PostRequest {
    /// What the post is about.
    pub topic: String,
    /// Pages to research, in request order.
    pub links: Vec<Url>,
    /// Whether to also generate an image.
    pub generate_image: bool,
    /// Requested maximum post length in characters (not yet clamped).
    pub max_length: usize,
    /// OpenAI key used for every generation call of this request.
    pub openai_api_key: String,
    /// Delivery branch.
    pub delivery: DeliveryTarget,
}

impl fmt::Debug for PostRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostRequest")
            .field("topic", &self.topic)
            .field("links", &self.links)
            .field("generate_image", &self.generate_image)
            .field("max_length", &self.max_length)
            .field("openai_api_key", &"[redacted]")
            .field("delivery", &self.delivery)
            .finish()
    }
}

/// Validate a raw request body.
pub fn validate(body: &Value) -> Result<PostRequest, ValidationError> {
    let map = body
        .as_object()
        .ok_or_else(|| ValidationError::invalid("body", "request body must be a JSON object"))?;

    let openai_api_key = required_string(map, "openai_api_key")?;
    let topic = required_string(map, "topic")?;
    let links = parse_links(map)?;
    let generate_image = optional_bool(map, "generate_image")?.unwrap_or(false);
    let max_length = parse_max_length(map)?;

    let post_to_linkedin = optional_bool(map, "post_to_linkedin")?;
    let send_email = optional_bool(map, "send_email")?.unwrap_or(false);

    let delivery = match (post_to_linkedin, send_email) {
        (Some(true), true) => {
            return Err(ValidationError::invalid(
                "send_email",
                "cannot both post to LinkedIn and send email; choose one delivery method",
            ))
        }
        (_, true) => {
            let app_password = required_string(map, "email_app_password")?;
            let destination = required_string(map, "destination_email")?;
            destination.parse::<lettre::Address>().map_err(|e| {
                ValidationError::invalid(
                    "destination_email",
                    format!("not a valid email address: {e}"),
                )
            })?;
            DeliveryTarget::Email {
                destination,
                app_password,
            }
        }
        // LinkedIn is the default when no method is selected.
        (_, false) => DeliveryTarget::LinkedIn {
            access_token: required_string(map, "linkedin_token")?,
        },
    };

    Ok(PostRequest {
        topic,
        links,
        generate_image,
        max_length,
        openai_api_key,
        delivery,
    })
}

fn field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn required_string(map: &Map<String, Value>, key: &str) -> Result<String, ValidationError> {
    match field(map, key) {
        None => Err(ValidationError::missing(key)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ValidationError::missing(key)),
        Some(Value::String(s)) => Ok(s.trim().to_string()),
        Some(_) => Err(ValidationError::invalid(key, "must be a string")),
    }
}

fn optional_bool(map: &Map<String, Value>, key: &str) -> Result<Option<bool>, ValidationError> {
    match field(map, key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ValidationError::invalid(key, "must be a boolean")),
    }
}

fn parse_max_length(map: &Map<String, Value>) -> Result<usize, ValidationError> {
    let Some(value) = field(map, "max_length") else {
        return Ok(DEFAULT_MAX_LENGTH);
    };

    value
        .as_u64()
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| ValidationError::invalid("max_length", "must be a positive integer"))
}

fn parse_links(map: &Map<String, Value>) -> Result<Vec<Url>, ValidationError> {
    let Some(value) = field(map, "links") else {
        return Ok(Vec::new());
    };

    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::invalid("links", "must be an array of URL strings"))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let name = format!("links[{i}]");
            let raw = item
                .as_str()
                .map(str::trim)
                .ok_or_else(|| ValidationError::invalid(&name, "must be a string"))?;
            let url = Url::parse(raw)
                .map_err(|e| ValidationError::invalid(&name, format!("not a valid URL: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ValidationError::invalid(&name, "only http and https links are supported"));
            }
            Ok(url)
        })
        .collect()
}
