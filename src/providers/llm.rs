//! Generation model trait with streaming support

use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

use crate::config::GenerationParams;
use crate::error::Result;

/// Lazy sequence of streamed text fragments, in emission order.
///
/// Finite and not restartable; dropping it cancels the underlying call.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Trait for text generation models
#[async_trait]
pub trait GenerationModel: Send + Sync {
    /// Generate a complete response for a prompt
    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Generate a streamed response, one fragment at a time
    async fn stream(&self, prompt: &str, params: &GenerationParams) -> Result<FragmentStream>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model identifier in use
    fn model(&self) -> &str;
}
