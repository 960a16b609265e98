//! Named-credential lookup.
//!
//! Secrets are stored as JSON objects; the handler only ever reads their
//! `api_key` field.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::{
    config::Region,
    error::{DisplayErrorContext, SdkError},
    operation::get_secret_value::GetSecretValueError,
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SecretError {
    #[error("Secret not found: {0}")]
    NotFound(String),

    #[error("Secret {name} is not valid JSON")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Secret store error: {message}")]
    Backend { message: String },
}

#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Raw secret text for `name`.
    async fn secret_string(&self, name: &str) -> Result<String, SecretError>;

    /// The `api_key` field of the JSON secret `name`, if present.
    async fn api_key(&self, name: &str) -> Result<Option<String>, SecretError> {
        let raw = self.secret_string(name).await?;
        let secret: serde_json::Value =
            serde_json::from_str(&raw).map_err(|source| SecretError::Malformed {
                name: name.to_string(),
                source,
            })?;

        Ok(secret
            .get("api_key")
            .and_then(|key| key.as_str())
            .map(str::to_string))
    }
}

/// AWS Secrets Manager in a fixed region.
pub struct AwsSecretStore {
    client: aws_sdk_secretsmanager::Client,
}

impl AwsSecretStore {
    /// Load credentials from the environment and target `region`.
    pub async fn connect(region: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.into()))
            .load()
            .await;

        Self {
            client: aws_sdk_secretsmanager::Client::new(&config),
        }
    }
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn secret_string(&self, name: &str) -> Result<String, SecretError> {
        debug!(secret = name, "Fetching secret");

        let output = self
            .client
            .get_secret_value()
            .secret_id(name)
            .send()
            .await
            .map_err(|e| lookup_error(name, e))?;

        output
            .secret_string()
            .map(str::to_string)
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}

fn lookup_error<R>(name: &str, err: SdkError<GetSecretValueError, R>) -> SecretError
where
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(GetSecretValueError::ResourceNotFoundException(_)) => {
            SecretError::NotFound(name.to_string())
        }
        _ => SecretError::Backend {
            message: format!("{}", DisplayErrorContext(&err)),
        },
    }
}

/// In-process secrets keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    secrets: HashMap<String, String>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }

    /// Store `{"api_key": key}` under `name`.
    pub fn with_api_key(self, name: impl Into<String>, key: &str) -> Self {
        let value = serde_json::json!({ "api_key": key }).to_string();
        self.with_secret(name, value)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn secret_string(&self, name: &str) -> Result<String, SecretError> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| SecretError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_secretsmanager::types::error::ResourceNotFoundException;

    #[tokio::test]
    async fn test_api_key_reads_field_from_json_secret() {
        let store = MemorySecretStore::new().with_api_key("travel-gpt/api-key", "k-123");

        let key = store.api_key("travel-gpt/api-key").await.unwrap();

        assert_eq!(key.as_deref(), Some("k-123"));
    }

    #[tokio::test]
    async fn test_api_key_missing_field_is_none() {
        let store = MemorySecretStore::new().with_secret("travel-gpt/api-key", r#"{"token":"x"}"#);

        assert_eq!(store.api_key("travel-gpt/api-key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_api_key_non_string_field_is_none() {
        let store = MemorySecretStore::new().with_secret("travel-gpt/api-key", r#"{"api_key":42}"#);

        assert_eq!(store.api_key("travel-gpt/api-key").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_api_key_rejects_non_json_secret() {
        let store = MemorySecretStore::new().with_secret("travel-gpt/api-key", "plain-text");

        let err = store.api_key("travel-gpt/api-key").await.unwrap_err();

        assert!(matches!(err, SecretError::Malformed { .. }));
    }

    #[test]
    fn test_missing_aws_secret_is_not_found() {
        let missing = GetSecretValueError::ResourceNotFoundException(
            ResourceNotFoundException::builder()
                .message("Secrets Manager can't find the specified secret.")
                .build(),
        );

        let err = lookup_error("prod/openai", SdkError::service_error(missing, ()));

        assert!(matches!(err, SecretError::NotFound(name) if name == "prod/openai"));
    }

    #[test]
    fn test_other_aws_failures_are_backend_errors() {
        let err = lookup_error::<()>(
            "prod/openai",
            SdkError::construction_failure("region not configured"),
        );

        match err {
            SecretError::Backend { message } => {
                assert!(message.contains("region not configured"), "{message}")
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_secret_is_not_found() {
        let store = MemorySecretStore::new();

        let err = store.api_key("missing").await.unwrap_err();

        assert!(matches!(err, SecretError::NotFound(name) if name == "missing"));
    }
}
