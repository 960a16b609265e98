use crate::{
    Provider,
    completions::{ChatCompletionsClient, CompletionsProviderConfig},
    core::{CompletionProvider, HttpClientConfig, LlmError, ProviderFactory},
    provider::constants::openai,
};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub http_config: HttpClientConfig,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: openai::API_BASE.to_string(),
            http_config: HttpClientConfig::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_http_config(mut self, http_config: HttpClientConfig) -> Self {
        self.http_config = http_config;
        self
    }
}

impl CompletionsProviderConfig for OpenAiConfig {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self) -> &str {
        openai::CHAT_COMPLETIONS_ENDPOINT
    }

    fn auth_header(&self) -> (String, String) {
        (
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )
    }

    fn http_config(&self) -> HttpClientConfig {
        self.http_config.clone()
    }
}

pub type OpenAiClient = ChatCompletionsClient<OpenAiConfig>;

/// Builds an [`OpenAiClient`] per invocation from the freshly fetched key.
#[derive(Debug, Clone)]
pub struct OpenAiProviderFactory {
    base_url: String,
    http_config: HttpClientConfig,
}

impl OpenAiProviderFactory {
    pub fn new(base_url: impl Into<String>, http_config: HttpClientConfig) -> Self {
        Self {
            base_url: base_url.into(),
            http_config,
        }
    }
}

impl Default for OpenAiProviderFactory {
    fn default() -> Self {
        Self::new(openai::API_BASE, HttpClientConfig::default())
    }
}

impl ProviderFactory for OpenAiProviderFactory {
    fn connect(&self, api_key: String) -> Result<Box<dyn CompletionProvider>, LlmError> {
        let config = OpenAiConfig::new(api_key)
            .with_base_url(self.base_url.clone())
            .with_http_config(self.http_config.clone());
        Ok(Box::new(OpenAiClient::new(config)?))
    }
}
