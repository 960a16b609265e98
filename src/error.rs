use thiserror::Error;

use crate::core::LlmError;

/// Every way a request can fail. Each variant is terminal for the request.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// Bad method, malformed body or missing field
    #[error("{0}")]
    Validation(String),

    /// Source address or caller key rejected
    #[error("{0}")]
    Auth(String),

    /// A required secret is unavailable
    #[error("{0}")]
    Configuration(String),

    #[error("OpenAI API error: {source}")]
    Provider {
        #[source]
        source: LlmError,
        query: String,
    },

    /// Detail is logged, never returned to the caller
    #[error("Internal server error")]
    Internal(String),
}

impl HandlerError {
    /// Validation and auth failures share the 400 path.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::Validation(_) | HandlerError::Auth(_) => 400,
            HandlerError::Configuration(_)
            | HandlerError::Provider { .. }
            | HandlerError::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_per_kind() {
        assert_eq!(HandlerError::Validation("x".into()).status_code(), 400);
        assert_eq!(HandlerError::Auth("x".into()).status_code(), 400);
        assert_eq!(HandlerError::Configuration("x".into()).status_code(), 500);
        assert_eq!(HandlerError::Internal("x".into()).status_code(), 500);
    }

    #[test]
    fn test_provider_message_embeds_detail() {
        let err = HandlerError::Provider {
            source: LlmError::Api {
                message: "Fatal API Error (401 Unauthorized): bad key".to_string(),
                status_code: Some(401),
                source: None,
            },
            query: "Rome?".to_string(),
        };

        assert_eq!(err.status_code(), 500);
        assert_eq!(
            err.to_string(),
            "OpenAI API error: API error: Fatal API Error (401 Unauthorized): bad key"
        );
    }

    #[test]
    fn test_internal_hides_detail() {
        let err = HandlerError::Internal("serializer exploded".to_string());
        assert_eq!(err.to_string(), "Internal server error");
    }
}
