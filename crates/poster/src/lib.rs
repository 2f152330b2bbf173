//! AI-generated LinkedIn posts behind a single HTTP endpoint.
//!
//! This crate provides:
//! - Request validation with conditional credential checks
//! - Link research with readable-text extraction
//! - Post and image generation through OpenAI
//! - Delivery to LinkedIn or by email
//! - An axum router exposing the pipeline

pub mod ai;
pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod publish;
pub mod request;
pub mod research;
pub mod response;
pub mod server;

// Re-export main types
pub use config::ServiceConfig;
pub use error::{DeliveryError, DeliveryErrorKind, PosterError, PosterResult, UpstreamError, ValidationError};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use request::{validate, DeliveryMethod, DeliveryTarget, PostRequest};
pub use response::PostResponse;
pub use server::{build_router, AppState};
