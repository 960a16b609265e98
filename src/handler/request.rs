use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use tracing::warn;

/// A normalized inbound request.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    /// Case-insensitive by construction
    pub headers: HeaderMap,
    pub body: Option<String>,
    pub source_ip: Option<String>,
    /// Epoch milliseconds at which the platform received the request
    pub timestamp: Option<i64>,
}

impl Request {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_source_ip(mut self, source_ip: impl Into<String>) -> Self {
        self.source_ip = Some(source_ip.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Translate an API Gateway (REST, proxy integration) event.
    pub fn from_proxy_event(event: &Value) -> Self {
        let context = &event["requestContext"];

        let mut headers = HeaderMap::new();
        if let Some(map) = event["headers"].as_object() {
            for (name, value) in map {
                let Some(value) = value.as_str() else {
                    continue;
                };
                match (name.parse::<HeaderName>(), value.parse::<HeaderValue>()) {
                    (Ok(name), Ok(value)) => {
                        headers.insert(name, value);
                    }
                    _ => warn!(header = %name, "Dropping unrepresentable header"),
                }
            }
        }

        let body = event["body"].as_str().map(|body| {
            if event["isBase64Encoded"].as_bool().unwrap_or(false) {
                decode_base64_body(body)
            } else {
                body.to_string()
            }
        });

        let timestamp = match &context["requestTimeEpoch"] {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        };

        Self {
            method: event["httpMethod"].as_str().unwrap_or_default().to_string(),
            headers,
            body,
            source_ip: context["identity"]["sourceIp"].as_str().map(str::to_string),
            timestamp,
        }
    }
}

/// Undecodable payloads are passed through unchanged and fail JSON parsing later.
fn decode_base64_body(body: &str) -> String {
    match STANDARD.decode(body) {
        Ok(bytes) => String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
        Err(e) => {
            warn!(error = %e, "Body flagged as base64 could not be decoded");
            body.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn proxy_event() -> Value {
        json!({
            "httpMethod": "POST",
            "headers": {
                "Content-Type": "application/json",
                "X-API-Key": "caller-key"
            },
            "body": "{\"query\":\"Best time to visit Kyoto?\"}",
            "isBase64Encoded": false,
            "requestContext": {
                "identity": { "sourceIp": "203.0.113.9" },
                "requestTimeEpoch": 1_700_000_000_123_i64
            }
        })
    }

    #[test]
    fn test_proxy_event_fields_are_extracted() {
        let request = Request::from_proxy_event(&proxy_event());

        assert_eq!(request.method, "POST");
        assert_eq!(
            request.body.as_deref(),
            Some("{\"query\":\"Best time to visit Kyoto?\"}")
        );
        assert_eq!(request.source_ip.as_deref(), Some("203.0.113.9"));
        assert_eq!(request.timestamp, Some(1_700_000_000_123));
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let request = Request::from_proxy_event(&proxy_event());

        assert_eq!(request.header("x-api-key"), Some("caller-key"));
        assert_eq!(request.header("X-API-KEY"), Some("caller-key"));
        assert_eq!(request.header("X-Api-Key"), Some("caller-key"));
    }

    #[test]
    fn test_base64_body_is_decoded() {
        let mut event = proxy_event();
        event["body"] = json!(STANDARD.encode("{\"query\":\"Oslo\"}"));
        event["isBase64Encoded"] = json!(true);

        let request = Request::from_proxy_event(&event);

        assert_eq!(request.body.as_deref(), Some("{\"query\":\"Oslo\"}"));
    }

    #[test]
    fn test_sparse_event_has_no_optional_fields() {
        let request = Request::from_proxy_event(&json!({
            "httpMethod": "OPTIONS",
            "headers": null,
            "body": null
        }));

        assert_eq!(request.method, "OPTIONS");
        assert!(request.headers.is_empty());
        assert!(request.body.is_none());
        assert!(request.source_ip.is_none());
        assert!(request.timestamp.is_none());
    }

    #[test]
    fn test_string_timestamp_is_parsed() {
        let mut event = proxy_event();
        event["requestContext"]["requestTimeEpoch"] = json!("1700000000999");

        assert_eq!(
            Request::from_proxy_event(&event).timestamp,
            Some(1_700_000_000_999)
        );
    }
}
