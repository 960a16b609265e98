use async_trait::async_trait;
use futures::stream::BoxStream;

use super::{
    error::LlmError,
    types::{Completion, CompletionDelta, CompletionRequest},
};

/// Fragments delivered by a provider in incremental mode, in order.
pub type CompletionStream = BoxStream<'static, Result<CompletionDelta, LlmError>>;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Single-shot completion with usage accounting.
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError>;

    /// Incremental delivery. The returned stream is finite and cannot be restarted.
    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream, LlmError>;
}

/// Builds a provider from a credential fetched for the current invocation.
pub trait ProviderFactory: Send + Sync {
    fn connect(&self, api_key: String) -> Result<Box<dyn CompletionProvider>, LlmError>;
}
