//! HTTP backend abstraction for the VOICEVOX engine API.
//!
//! This module provides a trait-based HTTP backend that allows for
//! dependency injection and easy testing. The production implementation
//! uses reqwest.
//!
//! Unlike a general-purpose API client, there is deliberately no retry
//! loop here: the engine contract is at-most-one attempt per call, and a
//! failure costs exactly the one utterance (or lookup) it belongs to.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{VoicevoxError, VoicevoxResult};
use crate::models::VoicevoxConfig;

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends speaking the engine's small verb set.
///
/// This abstraction allows for dependency injection of HTTP clients,
/// making it easy to test code that depends on HTTP requests.
///
/// This is an implementation detail - external code should use
/// `DefaultVoicevoxClient`.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// `GET` a URL and deserialize the JSON response.
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> VoicevoxResult<T>;

    /// `POST` with an empty body and deserialize the JSON response.
    async fn post_json<T: DeserializeOwned + Send>(&self, url: &Url) -> VoicevoxResult<T>;

    /// `POST` a JSON body and return the raw response bytes.
    async fn post_bytes(&self, url: &Url, body: &serde_json::Value) -> VoicevoxResult<Bytes>;

    /// `POST` with an empty body, discarding any response body.
    async fn post_unit(&self, url: &Url) -> VoicevoxResult<()>;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest.
///
/// No retries and, unless configured, no deadline: a hung engine stalls the
/// caller until the transport errors out, matching the relay's documented
/// behavior.
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Create a new reqwest backend with the given configuration.
    pub fn new(config: &VoicevoxConfig) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().expect("failed to create HTTP client");

        Self { client }
    }

    /// Map a non-2xx response to an error, passing 2xx through.
    fn check_status(response: reqwest::Response) -> VoicevoxResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(VoicevoxError::ApiRequestFailed {
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> VoicevoxResult<T> {
        let response = Self::check_status(self.client.get(url.as_str()).send().await?)?;
        let data: T = response.json().await?;
        Ok(data)
    }

    async fn post_json<T: DeserializeOwned + Send>(&self, url: &Url) -> VoicevoxResult<T> {
        let response = Self::check_status(self.client.post(url.as_str()).send().await?)?;
        let data: T = response.json().await?;
        Ok(data)
    }

    async fn post_bytes(&self, url: &Url, body: &serde_json::Value) -> VoicevoxResult<Bytes> {
        let response =
            Self::check_status(self.client.post(url.as_str()).json(body).send().await?)?;
        Ok(response.bytes().await?)
    }

    async fn post_unit(&self, url: &Url) -> VoicevoxResult<()> {
        Self::check_status(self.client.post(url.as_str()).send().await?)?;
        Ok(())
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================
