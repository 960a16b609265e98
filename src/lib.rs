//! # travel-gpt
//!
//! A request handler that answers travel questions with an OpenAI chat model.
//! Requests are validated (method, source address, caller key), routed by
//! method, and answered with a JSON envelope carrying permissive CORS headers.
//!
//! Answers cut off by the token budget are retried once in streaming mode
//! with a larger budget, and the streamed fragments are stitched together.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use travel_gpt::{Handler, HandlerConfig, MemorySecretStore, OpenAiProviderFactory, Request};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = HandlerConfig::default();
//!     let secrets = MemorySecretStore::new()
//!         .with_api_key(config.api_key_secret_name.clone(), "caller-key")
//!         .with_api_key(config.openai_secret_name.clone(), "sk-...");
//!     let providers = OpenAiProviderFactory::new(&config.openai_base_url, config.http.clone());
//!
//!     let handler = Handler::new(config, Arc::new(secrets), Arc::new(providers));
//!     let response = handler
//!         .handle(
//!             &Request::new("POST")
//!                 .with_header("X-API-Key", "caller-key")
//!                 .with_body(r#"{"query":"Three days in Lisbon?"}"#),
//!         )
//!         .await;
//!
//!     println!("{}", response.body);
//! }
//! ```

pub mod completions;
pub mod config;
pub mod core;
pub mod error;
pub mod handler;
pub mod orchestrator;
pub mod provider;
pub mod secrets;

pub use config::{CompletionConfig, HandlerConfig};
pub use core::{
    ChatRole, CompletionProvider, CompletionResult, FinishReason, LanguageModelUsage, LlmError,
    Message, ProviderFactory,
};
pub use error::HandlerError;
pub use handler::{ApiResponse, Handler, Request};
pub use orchestrator::CompletionOrchestrator;
pub use provider::{OpenAiClient, OpenAiConfig, OpenAiProviderFactory, Provider};
pub use secrets::{AwsSecretStore, MemorySecretStore, SecretError, SecretStore};
