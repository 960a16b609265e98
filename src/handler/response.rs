use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::HandlerError;

const CORS_ALLOW_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";
const CORS_ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

/// Transport envelope handed back to the hosting platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON-encoded body
    pub body: String,
}

impl ApiResponse {
    /// Wrap `body` with the permissive CORS headers every response carries.
    ///
    /// A body that cannot be encoded becomes a 500 with the generic error
    /// message; the encoding failure is logged.
    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self {
                status_code,
                headers: default_headers(),
                body,
            },
            Err(e) => {
                let err = HandlerError::Internal(e.to_string());
                error!(error = %e, status_code, "Failed to serialize response body");
                Self {
                    status_code: err.status_code(),
                    headers: default_headers(),
                    body: serde_json::json!({
                        "status": "error",
                        "message": err.to_string()
                    })
                    .to_string(),
                }
            }
        }
    }

    /// Add or override headers.
    pub fn with_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Decode the body back into JSON.
    pub fn body_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.body)
    }
}

fn default_headers() -> BTreeMap<String, String> {
    BTreeMap::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
        (
            "Access-Control-Allow-Headers".to_string(),
            CORS_ALLOW_HEADERS.to_string(),
        ),
        (
            "Access-Control-Allow-Methods".to_string(),
            CORS_ALLOW_METHODS.to_string(),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde_json::json;

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("not representable"))
        }
    }

    #[test]
    fn test_envelope_carries_cors_headers() {
        let response = ApiResponse::json(200, &json!({ "message": "ok" }));

        assert_eq!(response.status_code, 200);
        assert_eq!(response.headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(response.headers["Content-Type"], "application/json");
        assert_eq!(
            response.headers["Access-Control-Allow-Methods"],
            "GET,POST,PUT,DELETE,OPTIONS"
        );
        assert_eq!(response.body_json().unwrap(), json!({ "message": "ok" }));
    }

    #[test]
    fn test_envelope_serializes_in_platform_shape() {
        let response = ApiResponse::json(400, &json!({ "status": "error" }));
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["statusCode"], 400);
        assert!(value["headers"].is_object());
        assert_eq!(value["body"], "{\"status\":\"error\"}");
    }

    #[test]
    fn test_extra_headers_override_defaults() {
        let response = ApiResponse::json(200, &json!({}))
            .with_headers([("Content-Type", "text/plain"), ("X-Request-Id", "abc")]);

        assert_eq!(response.headers["Content-Type"], "text/plain");
        assert_eq!(response.headers["X-Request-Id"], "abc");
    }

    #[test]
    fn test_unencodable_body_becomes_internal_error() {
        let response = ApiResponse::json(200, &Unencodable);

        assert_eq!(response.status_code, 500);
        assert_eq!(
            response.body_json().unwrap(),
            json!({ "status": "error", "message": "Internal server error" })
        );
    }
}
