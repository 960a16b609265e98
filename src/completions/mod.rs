//! Chat-completions API: wire types, streaming decoder and the generic client.

pub mod client;
pub(crate) mod request;
pub(crate) mod response;
pub mod sse;

pub use client::{ChatCompletionsClient, CompletionsProviderConfig};
pub use sse::SseDecoder;
