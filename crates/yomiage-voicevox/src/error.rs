//! Error types for VOICEVOX engine operations.

use thiserror::Error;

/// Result type alias for VOICEVOX operations.
pub type VoicevoxResult<T> = Result<T, VoicevoxError>;

/// Errors related to the VOICEVOX engine API.
///
/// Every variant is non-fatal from the pipeline's point of view: a failed
/// synthesis call costs that one utterance, nothing more.
#[derive(Debug, Error)]
pub enum VoicevoxError {
    /// The engine answered with a non-2xx HTTP status.
    #[error("VOICEVOX API request failed with status {status}: {url}")]
    ApiRequestFailed {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The engine returned an invalid or unexpected response.
    #[error("Invalid response from VOICEVOX engine: {message}")]
    InvalidResponse {
        /// Description of what was invalid
        message: String,
    },

    /// The voice catalog has never been populated and the shared initial
    /// fetch failed.
    #[error("Voice catalog unavailable: initial fetch did not complete")]
    CatalogUnavailable,

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_request_failed_message_contains_status_and_url() {
        let error = VoicevoxError::ApiRequestFailed {
            status: 422,
            url: "http://127.0.0.1:50021/audio_query".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("422"));
        assert!(msg.contains("/audio_query"));
    }

    #[test]
    fn invalid_response_message() {
        let error = VoicevoxError::InvalidResponse {
            message: "missing styles array".to_string(),
        };
        assert!(error.to_string().contains("missing styles array"));
    }

    #[test]
    fn catalog_unavailable_message() {
        let msg = VoicevoxError::CatalogUnavailable.to_string();
        assert!(msg.contains("catalog"));
    }
}
