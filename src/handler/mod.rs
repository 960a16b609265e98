//! Request entry point: validate, route by method, shape the response.

pub mod request;
pub mod response;
pub mod validate;

pub use request::Request;
pub use response::ApiResponse;
pub use validate::{AllowedMethod, validate_request};

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    config::HandlerConfig,
    core::{LanguageModelUsage, Message, ProviderFactory},
    error::HandlerError,
    orchestrator::CompletionOrchestrator,
    secrets::SecretStore,
};

const PROVIDER_KEY_NOT_CONFIGURED: &str = "OpenAI API key not configured";

#[derive(Debug, Serialize)]
struct PreflightBody {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
    message: &'static str,
    has_api_key: bool,
    timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    status: &'static str,
    query: &'a str,
    response: &'a str,
    model: &'a str,
    is_truncated: bool,
    finish_reason: &'a str,
    usage: LanguageModelUsage,
    timestamp: Option<i64>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    has_api_key: Option<bool>,
}

pub struct Handler {
    config: HandlerConfig,
    secrets: Arc<dyn SecretStore>,
    providers: Arc<dyn ProviderFactory>,
}

impl Handler {
    pub fn new(
        config: HandlerConfig,
        secrets: Arc<dyn SecretStore>,
        providers: Arc<dyn ProviderFactory>,
    ) -> Self {
        Self {
            config,
            secrets,
            providers,
        }
    }

    /// Handle one request. Every outcome, including failures, is an [`ApiResponse`].
    #[tracing::instrument(
        name = "handle_request",
        skip(self, request),
        fields(
            method = %request.method,
            source_ip = request.source_ip.as_deref().unwrap_or("unknown")
        )
    )]
    pub async fn handle(&self, request: &Request) -> ApiResponse {
        info!("Received request");

        let method = match validate_request(
            request,
            &self.config.whitelisted_ips,
            self.secrets.as_ref(),
            &self.config.api_key_secret_name,
        )
        .await
        {
            Ok(method) => method,
            Err(e) => {
                warn!(error = %e, "Request validation failed");
                return error_response(&e);
            }
        };

        match method {
            AllowedMethod::Options => ApiResponse::json(
                200,
                &PreflightBody {
                    message: "CORS preflight successful",
                },
            ),
            AllowedMethod::Get => self.handle_status(request).await,
            AllowedMethod::Post => match self.handle_query(request).await {
                Ok(response) => response,
                Err(e) => error_response(&e),
            },
        }
    }

    /// Report whether the provider credential can be read.
    async fn handle_status(&self, request: &Request) -> ApiResponse {
        match self.provider_key().await {
            Ok(_) => ApiResponse::json(
                200,
                &StatusBody {
                    status: "success",
                    message: "OpenAI API key is configured",
                    has_api_key: true,
                    timestamp: request.timestamp,
                },
            ),
            Err(e) => ApiResponse::json(
                e.status_code(),
                &ErrorBody {
                    status: "error",
                    message: e.to_string(),
                    query: None,
                    has_api_key: Some(false),
                },
            ),
        }
    }

    async fn handle_query(&self, request: &Request) -> Result<ApiResponse, HandlerError> {
        let query = parse_query(request.body.as_deref())?;
        info!(query = %query, "Processing travel query");

        let api_key = self.provider_key().await?;
        let provider = self
            .providers
            .connect(api_key)
            .map_err(|source| HandlerError::Provider {
                source,
                query: query.clone(),
            })?;

        let completion = &self.config.completion;
        let messages = [
            Message::system(self.config.system_prompt.as_str()),
            Message::user(query.as_str()),
        ];

        let result = CompletionOrchestrator::new(provider.as_ref(), completion.model.as_str())
            .with_generation(completion.generation.clone())
            .with_escalated_max_tokens(completion.escalated_max_tokens)
            .complete(&messages, completion.max_tokens)
            .await
            .map_err(|source| {
                error!(error = %source, "OpenAI API call failed");
                HandlerError::Provider {
                    source,
                    query: query.clone(),
                }
            })?;

        if result.is_truncated {
            warn!(
                finish_reason = %result.finish_reason,
                "Response was truncated due to token limit"
            );
        }
        info!(
            "OpenAI API call successful. Tokens used: {}",
            result.usage.total_tokens
        );

        Ok(ApiResponse::json(
            200,
            &CompletionBody {
                status: "success",
                query: &query,
                response: &result.text,
                model: &completion.model,
                is_truncated: result.is_truncated,
                finish_reason: result.finish_reason.as_str(),
                usage: result.usage,
                timestamp: request.timestamp,
            },
        ))
    }

    async fn provider_key(&self) -> Result<String, HandlerError> {
        let secret_name = &self.config.openai_secret_name;
        match self.secrets.api_key(secret_name).await {
            Ok(Some(key)) => Ok(key),
            Ok(None) => {
                error!(secret = %secret_name, "Provider secret has no api_key field");
                Err(HandlerError::Configuration(
                    PROVIDER_KEY_NOT_CONFIGURED.to_string(),
                ))
            }
            Err(e) => {
                error!(secret = %secret_name, error = %e, "Error retrieving provider secret");
                Err(HandlerError::Configuration(
                    PROVIDER_KEY_NOT_CONFIGURED.to_string(),
                ))
            }
        }
    }
}

/// Extract the `query` field. A missing body reads as an empty object.
fn parse_query(body: Option<&str>) -> Result<String, HandlerError> {
    let body: Value = serde_json::from_str(body.unwrap_or("{}")).map_err(|e| {
        warn!(error = %e, "Request body is not valid JSON");
        HandlerError::Validation("Invalid JSON in request body".to_string())
    })?;

    match body.get("query") {
        None | Some(Value::Null) => Err(HandlerError::Validation(
            "Missing required field: query".to_string(),
        )),
        Some(Value::String(query)) => Ok(query.clone()),
        Some(_) => Err(HandlerError::Validation(
            "Field 'query' must be a string".to_string(),
        )),
    }
}

fn error_response(err: &HandlerError) -> ApiResponse {
    let query = match err {
        HandlerError::Provider { query, .. } => Some(query.as_str()),
        _ => None,
    };

    ApiResponse::json(
        err.status_code(),
        &ErrorBody {
            status: "error",
            message: err.to_string(),
            query,
            has_api_key: None,
        },
    )
}
