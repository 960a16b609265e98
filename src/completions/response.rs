use serde::Deserialize;

use crate::core::{Completion, CompletionDelta, FinishReason, LanguageModelUsage, LlmError};

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    /// The refusal explanation from the model.
    #[serde(default)]
    pub refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<Usage> for LanguageModelUsage {
    fn from(value: Usage) -> Self {
        Self {
            prompt_tokens: value.prompt_tokens,
            completion_tokens: value.completion_tokens,
            total_tokens: value.total_tokens,
        }
    }
}

/// One `data:` payload of a streamed completion.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Set when the provider aborts the stream with an error payload.
    #[serde(default)]
    pub error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkError {
    pub message: String,
    #[serde(default, rename = "type")]
    pub r#type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Convert the first choice of a completion into the provider-agnostic shape.
pub(crate) fn convert_to_completion(res: ChatCompletion) -> Result<Completion, LlmError> {
    let choice = res
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Provider {
            message: "No choices in response".to_string(),
            source: None,
        })?;

    let text = match (choice.message.content, choice.message.refusal) {
        (Some(text), _) => text,
        (None, Some(refusal)) => {
            return Err(LlmError::Provider {
                message: format!("Model refused: {refusal}"),
                source: None,
            });
        }
        (None, None) => String::new(),
    };

    let finish_reason = choice
        .finish_reason
        .as_deref()
        .map(FinishReason::from)
        .unwrap_or(FinishReason::Stop);

    Ok(Completion {
        text,
        finish_reason,
        usage: res.usage.map(Into::into).unwrap_or_default(),
    })
}

/// An error payload ends the stream; anything else becomes one fragment.
pub(crate) fn convert_to_delta(chunk: ChatCompletionChunk) -> Result<CompletionDelta, LlmError> {
    if let Some(error) = chunk.error {
        let message = match error.r#type {
            Some(kind) => format!("Stream aborted ({kind}): {}", error.message),
            None => format!("Stream aborted: {}", error.message),
        };
        return Err(LlmError::Provider {
            message,
            source: None,
        });
    }

    Ok(CompletionDelta {
        content: chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> ChatCompletion {
        serde_json::from_value(value).expect("valid completion")
    }

    #[test]
    fn test_convert_reads_first_choice_and_usage() {
        let completion = convert_to_completion(parse(json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Visit Alfama." },
                "finish_reason": "length"
            }],
            "usage": { "prompt_tokens": 20, "completion_tokens": 4000, "total_tokens": 4020 }
        })))
        .unwrap();

        assert_eq!(completion.text, "Visit Alfama.");
        assert_eq!(completion.finish_reason, FinishReason::Length);
        assert_eq!(completion.usage.total_tokens, 4020);
    }

    #[test]
    fn test_convert_without_choices_errors() {
        let err = convert_to_completion(parse(json!({
            "id": "chatcmpl-2",
            "model": "gpt-4o",
            "choices": []
        })))
        .unwrap_err();

        match err {
            LlmError::Provider { message, .. } => assert!(message.contains("No choices")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn test_convert_refusal_errors() {
        let err = convert_to_completion(parse(json!({
            "id": "chatcmpl-3",
            "model": "gpt-4o",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "refusal": "I can't help with that."
                },
                "finish_reason": "stop"
            }]
        })))
        .unwrap_err();

        match err {
            LlmError::Provider { message, .. } => assert!(message.contains("Model refused")),
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_usage_is_zero() {
        let completion = convert_to_completion(parse(json!({
            "id": "chatcmpl-4",
            "model": "gpt-4o",
            "choices": [{ "message": { "content": "ok" }, "finish_reason": "stop" }]
        })))
        .unwrap();

        assert_eq!(completion.usage, LanguageModelUsage::default());
    }

    #[test]
    fn test_chunk_without_choices_has_no_content() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "id": "chatcmpl-5",
            "choices": [],
            "usage": { "prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2 }
        }))
        .unwrap();

        assert_eq!(convert_to_delta(chunk).unwrap(), CompletionDelta::empty());
    }

    #[test]
    fn test_chunk_with_error_is_provider_error() {
        let chunk: ChatCompletionChunk = serde_json::from_value(json!({
            "error": { "message": "The server had an error" }
        }))
        .unwrap();

        match convert_to_delta(chunk) {
            Err(LlmError::Provider { message, .. }) => {
                assert_eq!(message, "Stream aborted: The server had an error")
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }
}
