//! Shared client logic for providers that speak the chat-completions API.

use async_trait::async_trait;
use futures::StreamExt;

use crate::{
    Provider,
    completions::{
        request::{build_complete_request, build_stream_request},
        response::{ChatCompletion, convert_to_completion},
        sse::delta_stream,
    },
    core::{
        Completion, CompletionProvider, CompletionRequest, CompletionStream, HttpClient,
        HttpClientConfig, LlmError,
    },
};

/// Configuration trait for providers that use the chat-completions API
pub trait CompletionsProviderConfig: Send + Sync {
    /// Model Provider
    fn provider(&self) -> Provider;

    /// Base URL for the API (e.g., `https://api.openai.com/v1`)
    fn base_url(&self) -> &str;

    /// API endpoint for completions (e.g., `/chat/completions`)
    fn endpoint(&self) -> &str;

    /// Authentication header as (header_name, header_value) tuple
    fn auth_header(&self) -> (String, String);

    /// Additional headers to include with each request
    fn extra_headers(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Configuration for HTTP client resilience
    fn http_config(&self) -> HttpClientConfig {
        HttpClientConfig::default()
    }

    fn user_agent(&self) -> String {
        format!("travel-gpt/{}", env!("CARGO_PKG_VERSION"))
    }
}

/// Shared client for providers using the chat-completions API
pub struct ChatCompletionsClient<P: CompletionsProviderConfig> {
    pub config: P,
    http: HttpClient,
}

impl<P: CompletionsProviderConfig> ChatCompletionsClient<P> {
    pub fn new(config: P) -> Result<Self, LlmError> {
        let http_config = config.http_config();
        let user_agent = config.user_agent();

        let http = HttpClient::new(http_config, Some(&user_agent))?;

        Ok(Self { config, http })
    }

    fn url(&self) -> String {
        format!("{}{}", self.config.base_url(), self.config.endpoint())
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![self.config.auth_header()];
        headers.extend(self.config.extra_headers());
        headers
    }

    #[tracing::instrument(
        name = "chat_completion",
        skip(self, request),
        fields(
            provider = %self.config.provider(),
            model = %request.model,
            max_tokens = request.generation.max_tokens
        ),
        err
    )]
    pub async fn complete_chat(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        let payload = build_complete_request(request);
        let response: ChatCompletion = self
            .http
            .post_json(&self.url(), &self.headers(), &payload)
            .await?;

        tracing::debug!(id = %response.id, model = %response.model, "Received completion");
        convert_to_completion(response)
    }

    #[tracing::instrument(
        name = "chat_completion_stream",
        skip(self, request),
        fields(
            provider = %self.config.provider(),
            model = %request.model,
            max_tokens = request.generation.max_tokens
        ),
        err
    )]
    pub async fn stream_chat(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionStream, LlmError> {
        let payload = build_stream_request(request);
        let response = self
            .http
            .post_stream(&self.url(), &self.headers(), &payload)
            .await?;

        Ok(delta_stream(response.bytes_stream()).boxed())
    }
}

#[async_trait]
impl<P: CompletionsProviderConfig> CompletionProvider for ChatCompletionsClient<P> {
    async fn complete(&self, request: &CompletionRequest) -> Result<Completion, LlmError> {
        self.complete_chat(request).await
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<CompletionStream, LlmError> {
        self.stream_chat(request).await
    }
}
