//! Error types for parley-ai

use thiserror::Error;

/// Result type alias using parley-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when interacting with the completion provider
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("API error: {message} (type: {error_type})")]
    Api { error_type: String, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Invalid API key
    #[error("Invalid or missing API key")]
    InvalidApiKey,

    /// Unexpected response format
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl Error {
    /// Create an API error from type and message
    pub fn api(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Check if this error signals that an advertised tool capability is not
    /// supported by the selected model or account. The classification drives
    /// the one-shot retry without the capability; everything else surfaces
    /// unmodified.
    pub fn is_capability_unsupported(&self) -> bool {
        match self {
            Error::Api {
                error_type,
                message,
            } => {
                let et = error_type.to_lowercase();
                let msg = message.to_lowercase();
                let mentions_tooling = msg.contains("web_search")
                    || msg.contains("web_search_preview")
                    || msg.contains("tools")
                    || et.contains("tool");
                mentions_tooling
                    && (msg.contains("not supported") || msg.contains("unsupported"))
            }
            _ => false,
        }
    }

    /// Check if this error is an authentication/credential failure
    pub fn is_auth(&self) -> bool {
        match self {
            Error::Auth(_) | Error::InvalidApiKey => true,
            Error::Api { error_type, .. } => {
                error_type.to_lowercase().contains("authentication")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- is_capability_unsupported on Api variant ---

    #[test]
    fn test_capability_web_search_not_supported() {
        let e = Error::api(
            "invalid_request_error",
            "Hosted tool 'web_search' is not supported with this model",
        );
        assert!(e.is_capability_unsupported());
    }

    #[test]
    fn test_capability_web_search_preview() {
        let e = Error::api(
            "invalid_request_error",
            "web_search_preview is not supported for gpt-3.5-turbo",
        );
        assert!(e.is_capability_unsupported());
    }

    #[test]
    fn test_capability_tools_unsupported() {
        let e = Error::api("invalid_request_error", "Tools are unsupported on this model");
        assert!(e.is_capability_unsupported());
    }

    #[test]
    fn test_not_capability_plain_tools_mention() {
        // Mentioning tools without an unsupported signal is not a mismatch
        let e = Error::api("invalid_request_error", "tools[0].type must be a string");
        assert!(!e.is_capability_unsupported());
    }

    #[test]
    fn test_not_capability_unrelated_not_supported() {
        let e = Error::api("invalid_request_error", "Streaming is not supported here");
        assert!(!e.is_capability_unsupported());
    }

    #[test]
    fn test_not_capability_auth() {
        let e = Error::api("authentication_error", "Invalid API key");
        assert!(!e.is_capability_unsupported());
    }

    #[test]
    fn test_not_capability_non_api() {
        assert!(!Error::InvalidApiKey.is_capability_unsupported());
        assert!(!Error::UnexpectedResponse("garbage".into()).is_capability_unsupported());
    }

    // --- is_auth ---

    #[test]
    fn test_auth_typed_variants() {
        assert!(Error::InvalidApiKey.is_auth());
        assert!(Error::Auth("401 Unauthorized".into()).is_auth());
    }

    #[test]
    fn test_auth_api_error_type() {
        let e = Error::api("authentication_error", "Incorrect API key provided");
        assert!(e.is_auth());
    }

    #[test]
    fn test_not_auth_other_api_errors() {
        let e = Error::api("rate_limit_error", "Too many requests");
        assert!(!e.is_auth());
    }
}
