use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures raised while talking to a completion provider.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The request never produced an HTTP response.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: BoxError,
    },

    /// The provider answered with a non-success status.
    #[error("API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    /// A body or stream chunk could not be decoded.
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: BoxError,
    },

    /// The response was well-formed but unusable.
    #[error("Provider error: {message}")]
    Provider {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Provider configuration error: {0}")]
    ProviderConfiguration(String),
}
