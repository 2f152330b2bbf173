//! AI provider traits and common types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIRole {
    /// System message (sets context/behavior)
    System,
    /// User message (input)
    User,
    /// Assistant message (AI response)
    Assistant,
}

/// A message in a conversation with an AI model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIMessage {
    /// Role of the message sender
    pub role: AIRole,
    /// Content of the message
    pub content: String,
}

impl AIMessage {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: AIRole::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: AIRole::User,
            content: content.into(),
        }
    }
}

/// Token usage information from an AI response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Number of input tokens
    pub input_tokens: u32,
    /// Number of output tokens
    pub output_tokens: u32,
    /// Total tokens (input + output)
    pub total_tokens: u32,
}

/// Response from an AI model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AIResponse {
    /// Generated text content
    pub text: String,
    /// Token usage information
    pub usage: TokenUsage,
    /// Model that generated the response
    pub model: String,
}

/// Options for text generation.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Let the model search the web (search-capable models only)
    pub web_search: bool,
}

/// Parameters for a single image.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    /// Image model.
    pub model: String,
    /// Description of the image.
    pub prompt: String,
    /// Dimensions, e.g. `1024x1024`.
    pub size: String,
    /// Quality tier, e.g. `standard`.
    pub quality: String,
}

/// An image produced by an image model.
#[derive(Debug, Clone, Default)]
pub struct GeneratedImage {
    /// Hosted URL of the image, when the provider returns one.
    pub url: Option<String>,
    /// Base64 payload, when the provider returns the bytes inline.
    pub b64_json: Option<String>,
    /// Prompt after provider-side rewriting.
    pub revised_prompt: Option<String>,
}

/// Text generation provider.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Get the provider name (e.g., "openai").
    fn name(&self) -> &'static str;

    /// Generate text from messages.
    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> Result<AIResponse, UpstreamError>;
}

/// Image generation provider.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generate one image.
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, UpstreamError>;
}

/// Strip the wrapping models like to put around plain-text answers:
/// markdown code fences and a single pair of surrounding quotes.
#[must_use]
pub fn clean_model_text(text: &str) -> String {
    let text = text.trim();

    let unfenced = if let Some(rest) = text.strip_prefix("```") {
        // Drop an optional language tag on the opening fence.
        let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
        rest.strip_suffix("```").unwrap_or(rest).trim()
    } else {
        text
    };

    let unquoted = unfenced
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .filter(|s| !s.contains('"'))
        .unwrap_or(unfenced);

    unquoted.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_plain_text_untouched() {
        assert_eq!(clean_model_text("  Hello world  "), "Hello world");
    }

    #[test]
    fn test_clean_code_fence() {
        assert_eq!(clean_model_text("```text\nHello\nworld\n```"), "Hello\nworld");
        assert_eq!(clean_model_text("```\nHello\n```"), "Hello");
    }

    #[test]
    fn test_clean_surrounding_quotes() {
        assert_eq!(clean_model_text("\"Big news today\""), "Big news today");
        // Inner quotes mean the quotes are content, not wrapping.
        assert_eq!(
            clean_model_text("\"A\" and \"B\""),
            "\"A\" and \"B\""
        );
    }
}
