//! Process-wide configuration, read once at startup.

use crate::{
    core::{GenerationConfig, HttpClientConfig},
    orchestrator::ESCALATED_MAX_TOKENS,
    provider::{DEFAULT_MODEL, OPENAI_API_BASE},
};

pub const OPENAI_SECRET_NAME_ENV_VAR: &str = "OPENAI_SECRET_NAME";
pub const API_KEY_SECRET_NAME_ENV_VAR: &str = "API_KEY_SECRET_NAME";
pub const WHITELISTED_IPS_ENV_VAR: &str = "WHITELISTED_IPS";
pub const SECRETS_REGION_ENV_VAR: &str = "SECRETS_REGION";
pub const AWS_REGION_ENV_VAR: &str = "AWS_REGION";
pub const OPENAI_BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";
pub const OPENAI_MAX_RETRIES_ENV_VAR: &str = "OPENAI_MAX_RETRIES";

pub const DEFAULT_OPENAI_SECRET_NAME: &str = "travel-gpt/openai-api-key";
pub const DEFAULT_API_KEY_SECRET_NAME: &str = "travel-gpt/api-key";
pub const DEFAULT_SECRETS_REGION: &str = "us-east-1";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a knowledgeable travel assistant specializing in providing detailed, helpful, and accurate travel advice.

When responding to travel queries:
- Provide specific, actionable recommendations
- Include practical details like best times to visit, costs, and tips
- Suggest local experiences and hidden gems
- Consider safety and accessibility
- Be enthusiastic but realistic about expectations
- Format your response in a clear, easy-to-read structure

Always be helpful, informative, and engaging in your travel advice.";

/// Model and budgets for the completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub model: String,
    /// Budget for the first, non-streaming call
    pub max_tokens: u32,
    /// Budget for the streaming retry after truncation
    pub escalated_max_tokens: u32,
    /// Sampling parameters; its `max_tokens` is replaced per call
    pub generation: GenerationConfig,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: generation.max_tokens,
            escalated_max_tokens: ESCALATED_MAX_TOKENS,
            generation,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Secret holding the provider credential
    pub openai_secret_name: String,
    /// Secret holding the key callers must present in `X-API-Key`
    pub api_key_secret_name: String,
    /// Allowed source addresses; empty allows everyone
    pub whitelisted_ips: Vec<String>,
    pub secrets_region: String,
    pub openai_base_url: String,
    pub system_prompt: String,
    pub completion: CompletionConfig,
    pub http: HttpClientConfig,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            openai_secret_name: DEFAULT_OPENAI_SECRET_NAME.to_string(),
            api_key_secret_name: DEFAULT_API_KEY_SECRET_NAME.to_string(),
            whitelisted_ips: Vec::new(),
            secrets_region: DEFAULT_SECRETS_REGION.to_string(),
            openai_base_url: OPENAI_API_BASE.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            completion: CompletionConfig::default(),
            http: HttpClientConfig::default(),
        }
    }
}

impl HandlerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            openai_secret_name: get(OPENAI_SECRET_NAME_ENV_VAR)
                .unwrap_or(defaults.openai_secret_name),
            api_key_secret_name: get(API_KEY_SECRET_NAME_ENV_VAR)
                .unwrap_or(defaults.api_key_secret_name),
            whitelisted_ips: get(WHITELISTED_IPS_ENV_VAR)
                .map(|raw| parse_address_list(&raw))
                .unwrap_or_default(),
            secrets_region: get(SECRETS_REGION_ENV_VAR)
                .or_else(|| get(AWS_REGION_ENV_VAR))
                .unwrap_or(defaults.secrets_region),
            openai_base_url: get(OPENAI_BASE_URL_ENV_VAR).unwrap_or(defaults.openai_base_url),
            http: HttpClientConfig {
                max_retries: get(OPENAI_MAX_RETRIES_ENV_VAR)
                    .and_then(|raw| raw.trim().parse().ok())
                    .unwrap_or(defaults.http.max_retries),
                ..defaults.http
            },
            ..defaults
        }
    }
}

/// Split a comma-separated address list, trimming entries and dropping blanks.
pub fn parse_address_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = HandlerConfig::from_lookup(lookup_from(&[]));

        assert_eq!(config.openai_secret_name, "travel-gpt/openai-api-key");
        assert_eq!(config.api_key_secret_name, "travel-gpt/api-key");
        assert!(config.whitelisted_ips.is_empty());
        assert_eq!(config.secrets_region, "us-east-1");
        assert_eq!(config.openai_base_url, "https://api.openai.com/v1");
        assert_eq!(config.completion.model, "gpt-4o");
        assert_eq!(config.completion.max_tokens, 4000);
        assert_eq!(config.completion.escalated_max_tokens, 8000);
        assert_eq!(config.http.max_retries, 0);
    }

    #[test]
    fn test_overrides_from_lookup() {
        let config = HandlerConfig::from_lookup(lookup_from(&[
            ("OPENAI_SECRET_NAME", "prod/openai"),
            ("API_KEY_SECRET_NAME", "prod/caller"),
            ("WHITELISTED_IPS", " 10.0.0.1, ,192.168.1.7 ,"),
            ("AWS_REGION", "eu-west-1"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1"),
        ]));

        assert_eq!(config.openai_secret_name, "prod/openai");
        assert_eq!(config.api_key_secret_name, "prod/caller");
        assert_eq!(config.whitelisted_ips, vec!["10.0.0.1", "192.168.1.7"]);
        assert_eq!(config.secrets_region, "eu-west-1");
        assert_eq!(config.openai_base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_secrets_region_wins_over_aws_region() {
        let config = HandlerConfig::from_lookup(lookup_from(&[
            ("SECRETS_REGION", "us-east-1"),
            ("AWS_REGION", "ap-southeast-2"),
        ]));

        assert_eq!(config.secrets_region, "us-east-1");
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = HandlerConfig::from_lookup(lookup_from(&[
            ("OPENAI_SECRET_NAME", "   "),
            ("WHITELISTED_IPS", ""),
        ]));

        assert_eq!(config.openai_secret_name, DEFAULT_OPENAI_SECRET_NAME);
        assert!(config.whitelisted_ips.is_empty());
    }

    #[test]
    fn test_retries_are_opt_in() {
        let config = HandlerConfig::from_lookup(lookup_from(&[("OPENAI_MAX_RETRIES", " 2 ")]));
        assert_eq!(config.http.max_retries, 2);

        let config = HandlerConfig::from_lookup(lookup_from(&[("OPENAI_MAX_RETRIES", "many")]));
        assert_eq!(config.http.max_retries, 0);
    }

    #[test]
    fn test_address_list_of_only_separators_is_empty() {
        assert!(parse_address_list(" , ,, ").is_empty());
    }
}
