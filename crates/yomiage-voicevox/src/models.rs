//! API types for the VOICEVOX engine and client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::VoicevoxResult;

/// Integer handle selecting one speaking style of one catalog speaker.
///
/// Style ids are globally unique across all speakers; the engine takes them
/// as the `speaker` query parameter on synthesis calls.
pub type StyleId = u32;

// ============================================================================
// Configuration
// ============================================================================

/// Default catalog TTL: how long a `/speakers` snapshot is served before a
/// lookup triggers a refresh.
const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(300);

/// Configuration for the VOICEVOX client.
#[derive(Debug, Clone)]
pub struct VoicevoxConfig {
    /// Base URL of the engine (default: `http://127.0.0.1:50021`)
    pub(crate) base_url: Url,
    /// How long a fetched voice catalog stays fresh
    pub(crate) catalog_ttl: Duration,
    /// Optional per-request deadline. `None` (the default) means requests
    /// wait on the engine indefinitely; set this at the call site when
    /// hardening against a hung engine.
    pub(crate) request_timeout: Option<Duration>,
}

impl Default for VoicevoxConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("http://127.0.0.1:50021").expect("default engine URL is valid"),
            catalog_ttl: DEFAULT_CATALOG_TTL,
            request_timeout: None,
        }
    }
}

impl VoicevoxConfig {
    /// Create a configuration pointing at the given engine endpoint.
    pub fn new(endpoint: &str) -> VoicevoxResult<Self> {
        Ok(Self {
            base_url: Url::parse(endpoint)?,
            ..Self::default()
        })
    }

    /// Set how long a fetched voice catalog stays fresh.
    #[must_use]
    pub const fn with_catalog_ttl(mut self, ttl: Duration) -> Self {
        self.catalog_ttl = ttl;
        self
    }

    /// Set a per-request deadline for engine calls.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

// ============================================================================
// Catalog types
// ============================================================================

/// One speaking style offered by a speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerStyle {
    /// Human-readable style name (e.g. "あまあま")
    pub name: String,
    /// Globally unique style id, passed to synthesis calls
    pub id: StyleId,
}

/// A named character in the engine's voice catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    /// Character name (e.g. "ずんだもん")
    pub name: String,
    /// Stable identity grouping this speaker's styles
    pub speaker_uuid: String,
    /// Available styles, in the engine's order
    pub styles: Vec<SpeakerStyle>,
    /// Engine-reported speaker version, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Extra per-speaker metadata from `GET /speaker_info`.
///
/// Only the terms-of-service text is carried; it is consumed by the UI
/// layer, not by the synthesis pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeakerInfo {
    /// Terms-of-service / usage policy text for the speaker
    pub policy: String,
}

// ============================================================================
// Synthesis types
// ============================================================================

/// The prepared synthesis job returned by `POST /audio_query`.
///
/// The payload is opaque to this client — it is held as raw JSON and re-sent
/// verbatim as the body of the `synthesis` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioQuery(serde_json::Value);

impl AudioQuery {
    /// Borrow the raw job payload for re-submission.
    pub(crate) const fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}
