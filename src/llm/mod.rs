pub mod gemini;
pub mod media;
pub mod types;

use async_trait::async_trait;

use crate::studio::error::ServiceFailure;

pub use gemini::GeminiImageClient;
pub use types::{GenerateContentResponse, GeneratedImage, GenerationRequest, SourceImage};

/// The external image-generation endpoint. Implementations perform exactly one
/// outbound call per invocation and never retry.
#[async_trait]
pub trait ImageService: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_content(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerateContentResponse, ServiceFailure>;
}
