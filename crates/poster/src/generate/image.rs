//! Optional post image.
//!
//! Image generation never fails a request: every error is logged and the
//! post continues without an image (or with a URL-only reference when the
//! download step is what failed).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use std::sync::Arc;

use crate::ai::{ImageProvider, ImageRequest};
use crate::config::{OpenAIConfig, PostConfig};
use crate::error::UpstreamError;

use super::prompts::{PromptManager, IMAGE_TEMPLATE};

/// A generated image attached to a post.
#[derive(Clone, Default)]
pub struct PostImage {
    /// Hosted image URL, when the provider returned one.
    pub url: Option<String>,
    /// Downloaded bytes, needed for LinkedIn upload and email embedding.
    pub data: Option<Vec<u8>>,
    /// MIME type of `data`.
    pub mime: &'static str,
}

impl std::fmt::Debug for PostImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostImage")
            .field("url", &self.url)
            .field("bytes", &self.data.as_ref().map(Vec::len))
            .field("mime", &self.mime)
            .finish()
    }
}

#[derive(Serialize)]
struct ImagePromptData<'a> {
    topic: &'a str,
    excerpt: String,
}

/// Generates and downloads the post image.
pub struct ImageGenerator {
    provider: Arc<dyn ImageProvider>,
    http: reqwest::Client,
    prompts: Arc<PromptManager>,
    openai: OpenAIConfig,
    post: PostConfig,
}

impl ImageGenerator {
    pub fn new(
        provider: Arc<dyn ImageProvider>,
        http: reqwest::Client,
        prompts: Arc<PromptManager>,
        openai: OpenAIConfig,
        post: PostConfig,
    ) -> Self {
        Self {
            provider,
            http,
            prompts,
            openai,
            post,
        }
    }

    /// Generate an image for the post, or `None` if generation failed.
    pub async fn generate(&self, topic: &str, body: &str) -> Option<PostImage> {
        match self.try_generate(topic, body).await {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(error = %e, "Image generation failed, continuing without image");
                None
            }
        }
    }

    async fn try_generate(&self, topic: &str, body: &str) -> Result<PostImage, UpstreamError> {
        let prompt = self.prompts.render(
            IMAGE_TEMPLATE,
            &ImagePromptData {
                topic,
                excerpt: body.chars().take(self.post.image_prompt_excerpt).collect(),
            },
        )?;

        let generated = self
            .provider
            .generate_image(&ImageRequest {
                model: self.openai.image_model.clone(),
                prompt,
                size: self.post.image_size.clone(),
                quality: self.post.image_quality.clone(),
            })
            .await?;

        if let Some(revised) = &generated.revised_prompt {
            tracing::debug!(revised_prompt = %revised, "Image prompt revised by provider");
        }

        let data = match (&generated.b64_json, &generated.url) {
            (Some(b64), _) => match STANDARD.decode(b64) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    tracing::warn!(error = %e, "Inline image payload was not valid base64");
                    None
                }
            },
            (None, Some(url)) => self.download(url).await,
            (None, None) => None,
        };

        let mime = data.as_deref().map_or("image/png", sniff_mime);
        tracing::info!(
            has_url = generated.url.is_some(),
            bytes = data.as_ref().map_or(0, Vec::len),
            "Image generated"
        );

        Ok(PostImage {
            url: generated.url,
            data,
            mime,
        })
    }

    /// Download the hosted image once. Failure keeps the URL-only reference.
    async fn download(&self, url: &str) -> Option<Vec<u8>> {
        let result = async {
            let response = self
                .http
                .get(url)
                .timeout(self.openai.timeout)
                .send()
                .await?
                .error_for_status()?;
            response.bytes().await
        }
        .await;

        match result {
            Ok(bytes) if !bytes.is_empty() => Some(bytes.to_vec()),
            Ok(_) => {
                tracing::warn!("Downloaded image was empty");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to download generated image");
                None
            }
        }
    }
}

/// Identify an image format from its magic bytes.
#[must_use]
pub fn sniff_mime(data: &[u8]) -> &'static str {
    match data {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::ai::GeneratedImage;

    struct StubImages {
        result: Mutex<Option<Result<GeneratedImage, UpstreamError>>>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageProvider for StubImages {
        async fn generate_image(&self, request: &ImageRequest) -> Result<GeneratedImage, UpstreamError> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            self.result.lock().unwrap().take().unwrap()
        }
    }

    fn generator(result: Result<GeneratedImage, UpstreamError>) -> (ImageGenerator, Arc<StubImages>) {
        let stub = Arc::new(StubImages {
            result: Mutex::new(Some(result)),
            prompts: Mutex::new(Vec::new()),
        });
        let generator = ImageGenerator::new(
            stub.clone(),
            reqwest::Client::new(),
            Arc::new(PromptManager::new().unwrap()),
            OpenAIConfig::default(),
            PostConfig::default(),
        );
        (generator, stub)
    }

    #[test]
    fn test_sniff_mime() {
        assert_eq!(sniff_mime(&[0x89, b'P', b'N', b'G', 0x0D]), "image/png");
        assert_eq!(sniff_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), "image/jpeg");
        assert_eq!(sniff_mime(b"GIF89a"), "image/gif");
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8"), "image/webp");
        assert_eq!(sniff_mime(b"??"), "image/png");
    }

    #[tokio::test]
    async fn test_failure_degrades_to_none() {
        let (generator, _) = generator(Err(UpstreamError::Api {
            service: "OpenAI",
            status: 500,
            message: "boom".to_string(),
        }));
        assert!(generator.generate("AI", "A post").await.is_none());
    }

    #[tokio::test]
    async fn test_inline_payload_decoded() {
        let payload = STANDARD.encode([0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3]);
        let (generator, stub) = generator(Ok(GeneratedImage {
            url: None,
            b64_json: Some(payload),
            revised_prompt: None,
        }));

        let body = "word ".repeat(200);
        let image = generator.generate("Rust", &body).await.unwrap();
        assert_eq!(image.mime, "image/jpeg");
        assert_eq!(image.data.unwrap().len(), 7);

        let prompt = stub.prompts.lock().unwrap()[0].clone();
        assert!(prompt.contains("about Rust"));
        // Only the first 300 characters of the post are quoted.
        assert!(!prompt.contains(&"word ".repeat(61)));
    }
}
