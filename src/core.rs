pub mod error;
pub mod http;
pub mod traits;
pub mod types;

pub use error::LlmError;
pub use http::{HttpClient, HttpClientConfig};
pub use traits::{CompletionProvider, CompletionStream, ProviderFactory};
pub use types::{
    ChatRole, Completion, CompletionDelta, CompletionRequest, CompletionResult, FinishReason,
    GenerationConfig, LanguageModelUsage, Message,
};
