//! Truncation-aware completion.
//!
//! A single non-streaming call is made first. When the provider reports
//! that the answer was cut off by the token budget, the same messages are
//! sent again in streaming mode with a larger budget and the fragments are
//! stitched together. Partial usage from the truncated call is discarded,
//! and fragment delivery carries no usage, so the retried result reports
//! zero usage.

use futures::{Stream, StreamExt};
use tracing::info;

use crate::core::{
    CompletionDelta, CompletionProvider, CompletionRequest, CompletionResult, FinishReason,
    GenerationConfig, LanguageModelUsage, LlmError, Message,
};

/// Budget used for the streaming retry, independent of the first call's budget.
pub const ESCALATED_MAX_TOKENS: u32 = 8000;

pub struct CompletionOrchestrator<'a> {
    provider: &'a dyn CompletionProvider,
    model: String,
    generation: GenerationConfig,
    escalated_max_tokens: u32,
}

impl<'a> CompletionOrchestrator<'a> {
    pub fn new(provider: &'a dyn CompletionProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            generation: GenerationConfig::default(),
            escalated_max_tokens: ESCALATED_MAX_TOKENS,
        }
    }

    /// Sampling parameters for both calls. `max_tokens` is overridden per call.
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_escalated_max_tokens(mut self, max_tokens: u32) -> Self {
        self.escalated_max_tokens = max_tokens;
        self
    }

    fn request(&self, messages: &[Message], max_tokens: u32) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            generation: GenerationConfig {
                max_tokens,
                ..self.generation.clone()
            },
        }
    }

    /// Complete `messages`, upgrading to one streaming retry if the first
    /// answer stopped at the token limit. Provider failures are returned as-is.
    #[tracing::instrument(
        name = "orchestrate_completion",
        skip(self, messages),
        fields(model = %self.model, messages = messages.len()),
        err
    )]
    pub async fn complete(
        &self,
        messages: &[Message],
        max_tokens: u32,
    ) -> Result<CompletionResult, LlmError> {
        let completion = self
            .provider
            .complete(&self.request(messages, max_tokens))
            .await?;

        if completion.finish_reason != FinishReason::Length {
            return Ok(CompletionResult {
                text: completion.text,
                is_truncated: false,
                finish_reason: completion.finish_reason,
                usage: completion.usage,
            });
        }

        info!(
            max_tokens,
            escalated_max_tokens = self.escalated_max_tokens,
            "Response truncated, attempting streaming completion"
        );

        let stream = self
            .provider
            .stream(&self.request(messages, self.escalated_max_tokens))
            .await?;
        let text = accumulate_fragments(stream).await?;

        Ok(CompletionResult {
            text,
            is_truncated: false,
            finish_reason: FinishReason::Stop,
            usage: LanguageModelUsage::default(),
        })
    }
}

/// Concatenate fragment text in delivery order, skipping fragments without content.
/// The first failed fragment aborts accumulation.
pub async fn accumulate_fragments<S>(stream: S) -> Result<String, LlmError>
where
    S: Stream<Item = Result<CompletionDelta, LlmError>>,
{
    let mut stream = std::pin::pin!(stream);
    let mut text = String::new();

    while let Some(delta) = stream.next().await {
        if let Some(content) = delta?.content {
            text.push_str(&content);
        }
    }

    Ok(text)
}
