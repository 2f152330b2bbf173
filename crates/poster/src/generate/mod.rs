//! Content generation: post body, optional image and engagement analysis.

pub mod engagement;
pub mod image;
pub mod post;
pub mod prompts;

pub use engagement::{analyze, EngagementAnalysis};
pub use image::{sniff_mime, ImageGenerator, PostImage};
pub use post::{truncate_post, PostWriter};
pub use prompts::PromptManager;

/// Output of the generation stage.
#[derive(Debug, Clone)]
pub struct GeneratedPost {
    /// Post text, at most the clamped `max_length` characters.
    pub body: String,
    /// Image, when requested and generation succeeded.
    pub image: Option<PostImage>,
}

impl GeneratedPost {
    /// Hosted image URL, if any.
    pub fn image_url(&self) -> Option<&str> {
        self.image.as_ref().and_then(|i| i.url.as_deref())
    }

    /// Downloaded image bytes and MIME type, if any.
    pub fn image_bytes(&self) -> Option<(&[u8], &'static str)> {
        self.image
            .as_ref()
            .and_then(|i| i.data.as_deref().map(|d| (d, i.mime)))
    }
}
