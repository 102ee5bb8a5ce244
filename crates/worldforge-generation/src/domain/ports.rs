//! Ports to the remote generation backend and the call-record store.

use async_trait::async_trait;
use worldforge_core::error::DomainError;

use super::call::{GeneratedImage, ImageRequest, TextCompletion, TextRequest};
use super::error::GenerationError;
use super::record::CallAttemptRecord;

/// A text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Runs one text completion attempt.
    async fn generate_text(&self, request: &TextRequest) -> Result<TextCompletion, GenerationError>;
}

/// An image generation backend.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Runs one image generation attempt.
    async fn generate_image(&self, request: &ImageRequest)
    -> Result<GeneratedImage, GenerationError>;
}

/// Persistence for call audit records.
#[async_trait]
pub trait CallRecordRepository: Send + Sync {
    /// Stores one call record.
    async fn save_call_record(&self, record: &CallAttemptRecord) -> Result<(), DomainError>;
}
