//! Request checks, applied in order: method, source address, caller key.
//! The first failing check decides the response.

use tracing::{error, warn};

use super::request::Request;
use crate::{error::HandlerError, secrets::SecretStore};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowedMethod {
    Get,
    Post,
    Options,
}

pub fn check_method(method: &str) -> Result<AllowedMethod, HandlerError> {
    match method {
        "GET" => Ok(AllowedMethod::Get),
        "POST" => Ok(AllowedMethod::Post),
        "OPTIONS" => Ok(AllowedMethod::Options),
        _ => Err(HandlerError::Validation(
            "Unsupported HTTP method".to_string(),
        )),
    }
}

/// An empty allow-list admits every address.
pub fn check_source_address(
    source_ip: Option<&str>,
    whitelisted_ips: &[String],
) -> Result<(), HandlerError> {
    if whitelisted_ips.is_empty() {
        return Ok(());
    }

    let source_ip = source_ip.unwrap_or_default();
    if whitelisted_ips.iter().any(|ip| ip == source_ip) {
        return Ok(());
    }

    warn!(source_ip, "IP not in whitelist");
    Err(HandlerError::Auth("IP address not authorized".to_string()))
}

/// Compare the caller's `X-API-Key` with the reference key in `secret_name`.
pub async fn check_api_key(
    request: &Request,
    secrets: &dyn SecretStore,
    secret_name: &str,
) -> Result<(), HandlerError> {
    let provided = request
        .header(API_KEY_HEADER)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| HandlerError::Auth("API key is required".to_string()))?;

    let stored = match secrets.api_key(secret_name).await {
        Ok(Some(stored)) => stored,
        Ok(None) => {
            error!(secret = secret_name, "Stored API key not found");
            return Err(validation_failed());
        }
        Err(e) => {
            error!(secret = secret_name, error = %e, "Error validating API key");
            return Err(validation_failed());
        }
    };

    if provided.as_bytes() != stored.as_bytes() {
        warn!(
            source_ip = request.source_ip.as_deref().unwrap_or("unknown"),
            "Invalid API key attempt"
        );
        return Err(HandlerError::Auth("Invalid API key".to_string()));
    }

    Ok(())
}

fn validation_failed() -> HandlerError {
    HandlerError::Auth("API key validation failed".to_string())
}

/// Run every check in order. CORS preflight skips address and key checks.
pub async fn validate_request(
    request: &Request,
    whitelisted_ips: &[String],
    secrets: &dyn SecretStore,
    api_key_secret_name: &str,
) -> Result<AllowedMethod, HandlerError> {
    let method = check_method(&request.method)?;
    if method == AllowedMethod::Options {
        return Ok(method);
    }

    check_source_address(request.source_ip.as_deref(), whitelisted_ips)?;
    check_api_key(request, secrets, api_key_secret_name).await?;

    Ok(method)
}
