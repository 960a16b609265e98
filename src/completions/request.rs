use serde::Serialize;

use crate::core::{ChatRole, CompletionRequest};

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,

    pub messages: Vec<ChatMessage>,

    pub max_tokens: u32,

    pub temperature: f32,

    /// Alter this or temperature but not both.
    pub top_p: f32,

    pub frequency_penalty: f32,

    pub presence_penalty: f32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: ChatMessageRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMessageRole {
    System,
    User,
}

impl From<ChatRole> for ChatMessageRole {
    fn from(value: ChatRole) -> Self {
        match value {
            ChatRole::System => ChatMessageRole::System,
            ChatRole::User => ChatMessageRole::User,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub r#type: ResponseFormatType,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormatType {
    Text,
}

fn convert_messages(request: &CompletionRequest) -> Vec<ChatMessage> {
    request
        .messages
        .iter()
        .map(|m| ChatMessage {
            role: m.role.into(),
            content: m.content.clone(),
        })
        .collect()
}

/// Non-streaming payload; asks for plain-text output.
pub(crate) fn build_complete_request(request: &CompletionRequest) -> ChatCompletionRequest {
    let generation = &request.generation;
    ChatCompletionRequest {
        model: request.model.clone(),
        messages: convert_messages(request),
        max_tokens: generation.max_tokens,
        temperature: generation.temperature,
        top_p: generation.top_p,
        frequency_penalty: generation.frequency_penalty,
        presence_penalty: generation.presence_penalty,
        response_format: Some(ResponseFormat {
            r#type: ResponseFormatType::Text,
        }),
        stream: None,
    }
}

pub(crate) fn build_stream_request(request: &CompletionRequest) -> ChatCompletionRequest {
    ChatCompletionRequest {
        response_format: None,
        stream: Some(true),
        ..build_complete_request(request)
    }
}
