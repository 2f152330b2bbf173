//! AI integration.
//!
//! This module provides:
//! - Provider traits for text and image generation
//! - The OpenAI implementation used in production

pub mod openai;
pub mod provider;

// Re-exports
pub use openai::OpenAIProvider;
pub use provider::{
    clean_model_text, AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, GeneratedImage,
    ImageProvider, ImageRequest, TokenUsage,
};
