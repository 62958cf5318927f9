//! The VOICEVOX engine client.
//!
//! Wraps the engine's HTTP API: the two-step synthesis flow
//! (`audio_query` then `synthesis`), the TTL-cached voice catalog, and
//! the per-style initialization handshake.

use std::sync::Arc;

use bytes::Bytes;

use crate::catalog::{CatalogCache, CatalogSnapshot};
use crate::error::{VoicevoxError, VoicevoxResult};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::{AudioQuery, Speaker, SpeakerInfo, SpeakerStyle, StyleId, VoicevoxConfig};
use crate::url as api;

/// Client for a VOICEVOX-compatible speech engine.
///
/// Generic over the HTTP backend for testability; use
/// [`DefaultVoicevoxClient`] in production code.
pub struct VoicevoxClient<B: HttpBackend> {
    backend: B,
    config: VoicevoxConfig,
    catalog: CatalogCache,
}

/// The production client, backed by reqwest.
pub type DefaultVoicevoxClient = VoicevoxClient<ReqwestBackend>;

impl DefaultVoicevoxClient {
    /// Create a client for the engine at `config.base_url`.
    pub fn new(config: VoicevoxConfig) -> Self {
        let backend = ReqwestBackend::new(&config);
        Self::with_backend(backend, config)
    }
}

impl<B: HttpBackend> VoicevoxClient<B> {
    /// Create a client over an explicit backend.
    pub(crate) fn with_backend(backend: B, config: VoicevoxConfig) -> Self {
        let catalog = CatalogCache::new(config.catalog_ttl);
        Self {
            backend,
            config,
            catalog,
        }
    }

    // ------------------------------------------------------------------
    // Synthesis
    // ------------------------------------------------------------------

    /// Prepare a synthesis job for `text` in the given style.
    ///
    /// This is the first half of the engine's two-step flow; feed the
    /// result to [`synthesis`](Self::synthesis) with the same style id.
    pub async fn audio_query(&self, text: &str, style_id: StyleId) -> VoicevoxResult<AudioQuery> {
        let url = api::audio_query_url(&self.config.base_url, text, style_id);
        tracing::debug!(style_id, chars = text.chars().count(), "Preparing audio query");
        self.backend.post_json(&url).await
    }

    /// Render a prepared job to a WAV byte buffer.
    pub async fn synthesis(
        &self,
        query: &AudioQuery,
        style_id: StyleId,
    ) -> VoicevoxResult<Bytes> {
        let url = api::synthesis_url(&self.config.base_url, style_id);
        let audio = self.backend.post_bytes(&url, query.as_json()).await?;
        tracing::debug!(style_id, bytes = audio.len(), "Synthesis complete");
        Ok(audio)
    }

    /// Run the full query-then-render pair for one utterance.
    pub async fn synthesize(&self, text: &str, style_id: StyleId) -> VoicevoxResult<Bytes> {
        let query = self.audio_query(text, style_id).await?;
        self.synthesis(&query, style_id).await
    }

    // ------------------------------------------------------------------
    // Voice catalog
    // ------------------------------------------------------------------

    /// List all speakers, serving from the cached catalog when fresh.
    pub async fn speakers(&self) -> VoicevoxResult<Vec<Speaker>> {
        let snapshot = self.catalog_snapshot().await?;
        Ok(snapshot.speakers().to_vec())
    }

    /// Look up a speaker by its stable UUID.
    pub async fn speaker_by_uuid(&self, uuid: &str) -> VoicevoxResult<Option<Speaker>> {
        let snapshot = self.catalog_snapshot().await?;
        Ok(snapshot.speaker_by_uuid(uuid).cloned())
    }

    /// Resolve a style id to its speaker and style entry.
    pub async fn style_by_id(
        &self,
        style_id: StyleId,
    ) -> VoicevoxResult<Option<(Speaker, SpeakerStyle)>> {
        let snapshot = self.catalog_snapshot().await?;
        Ok(snapshot
            .style_by_id(style_id)
            .map(|(speaker, style)| (speaker.clone(), style.clone())))
    }

    /// Drop the cached catalog so the next lookup refetches.
    pub fn invalidate_catalog(&self) {
        self.catalog.invalidate();
    }

    /// Fetch per-speaker metadata. Not cached; callers hit this rarely.
    pub async fn speaker_info(&self, speaker_uuid: &str) -> VoicevoxResult<SpeakerInfo> {
        let url = api::speaker_info_url(&self.config.base_url, speaker_uuid);
        self.backend.get_json(&url).await
    }

    /// Make sure the engine has the style's model loaded, initializing it
    /// on first use. Idempotent.
    pub async fn ensure_speaker_initialized(&self, style_id: StyleId) -> VoicevoxResult<()> {
        let check = api::is_initialized_speaker_url(&self.config.base_url, style_id);
        let initialized: bool = self.backend.get_json(&check).await?;
        if initialized {
            return Ok(());
        }

        tracing::info!(style_id, "Initializing speaker model");
        let init = api::initialize_speaker_url(&self.config.base_url, style_id);
        self.backend.post_unit(&init).await
    }

    /// A fresh-enough catalog snapshot, fetching when stale.
    ///
    /// Exactly one caller performs the fetch; concurrent callers serve
    /// from the stale snapshot if one exists, or wait for the shared
    /// first fetch if not. A failed refresh is reported only by the
    /// caller that performed it.
    async fn catalog_snapshot(&self) -> VoicevoxResult<Arc<CatalogSnapshot>> {
        if self.catalog.is_fresh() {
            if let Some(snapshot) = self.catalog.current() {
                return Ok(snapshot);
            }
        }

        if self.catalog.begin_refresh() {
            let url = api::speakers_url(&self.config.base_url);
            match self.backend.get_json::<Vec<Speaker>>(&url).await {
                Ok(speakers) => self.catalog.finish_refresh(Some(speakers)),
                Err(error) => {
                    tracing::warn!(error = %error, "Voice catalog refresh failed");
                    self.catalog.finish_refresh(None);
                    return Err(error);
                }
            }
        } else if self.catalog.current().is_none() {
            // First population is in flight elsewhere; wait for it rather
            // than racing a second fetch.
            self.catalog.wait_for_refresh().await;
        }

        self.catalog
            .current()
            .ok_or(VoicevoxError::CatalogUnavailable)
    }
}
