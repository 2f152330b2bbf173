//! OpenAI provider implementation (chat completions and image generation).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::DEFAULT_OPENAI_API_BASE;
use crate::error::UpstreamError;

use super::provider::{
    AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, GeneratedImage, ImageProvider,
    ImageRequest, TokenUsage,
};

const SERVICE: &str = "OpenAI";

/// OpenAI API request message
#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

/// Empty options object that switches on web search for search models.
#[derive(Debug, Serialize)]
struct WebSearchOptions {}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    web_search_options: Option<WebSearchOptions>,
}

/// OpenAI API response choice message
#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// OpenAI API response choice
#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

/// OpenAI API usage
#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: Usage,
}

/// OpenAI image generation request
#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    quality: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
    b64_json: Option<String>,
    revised_prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    data: Vec<ImageData>,
}

/// OpenAI API error
#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

/// OpenAI API error response
#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

/// OpenAI provider bound to one API key.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Set a custom base URL (useful for Azure OpenAI or proxies).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Reuse an existing connection pool.
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Set the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Convert messages to OpenAI format.
    fn convert_messages(messages: &[AIMessage]) -> Vec<OpenAIMessage> {
        messages
            .iter()
            .map(|msg| OpenAIMessage {
                role: match msg.role {
                    AIRole::System => "system",
                    AIRole::User => "user",
                    AIRole::Assistant => "assistant",
                },
                content: msg.content.clone(),
            })
            .collect()
    }

    /// POST a JSON body and return the raw response text, mapping failures.
    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String, UpstreamError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|source| UpstreamError::Http {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| UpstreamError::Http {
            service: SERVICE,
            source,
        })?;

        if !status.is_success() {
            // Try to parse error response
            let message = serde_json::from_str::<OpenAIErrorResponse>(&text)
                .map_or(text, |e| e.error.message);
            return Err(UpstreamError::Api {
                service: SERVICE,
                status: status.as_u16(),
                message,
            });
        }

        Ok(text)
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> Result<AIResponse, UpstreamError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: Self::convert_messages(messages),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            web_search_options: options.web_search.then_some(WebSearchOptions {}),
        };

        let body = self.post_json("/chat/completions", &request).await?;

        let api_response: ChatResponse =
            serde_json::from_str(&body).map_err(|e| UpstreamError::InvalidResponse {
                service: SERVICE,
                reason: format!("failed to parse chat completion: {e}"),
            })?;

        // Extract text from first choice
        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(AIResponse {
            text,
            usage: TokenUsage {
                input_tokens: api_response.usage.prompt_tokens,
                output_tokens: api_response.usage.completion_tokens,
                total_tokens: api_response.usage.total_tokens,
            },
            model: api_response.model,
        })
    }
}

#[async_trait]
impl ImageProvider for OpenAIProvider {
    async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, UpstreamError> {
        let body = ImagesRequest {
            model: &request.model,
            prompt: &request.prompt,
            n: 1,
            size: &request.size,
            quality: &request.quality,
        };

        let text = self.post_json("/images/generations", &body).await?;

        let parsed: ImagesResponse =
            serde_json::from_str(&text).map_err(|e| UpstreamError::InvalidResponse {
                service: SERVICE,
                reason: format!("failed to parse image response: {e}"),
            })?;

        let image = parsed
            .data
            .into_iter()
            .next()
            .filter(|d| d.url.is_some() || d.b64_json.is_some())
            .ok_or_else(|| UpstreamError::InvalidResponse {
                service: SERVICE,
                reason: "image response contained no image".to_string(),
            })?;

        Ok(GeneratedImage {
            url: image.url,
            b64_json: image.b64_json,
            revised_prompt: image.revised_prompt,
        })
    }
}
