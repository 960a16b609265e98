pub(crate) mod constants;
pub(crate) mod openai;

pub use constants::openai::{API_BASE as OPENAI_API_BASE, DEFAULT_MODEL};
pub use openai::{OpenAiClient, OpenAiConfig, OpenAiProviderFactory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAI => write!(f, "OpenAI"),
        }
    }
}
