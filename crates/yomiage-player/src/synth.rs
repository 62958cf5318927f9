//! The synthesis seam of the pipeline.

use async_trait::async_trait;
use bytes::Bytes;
use yomiage_voicevox::{DefaultVoicevoxClient, StyleId, VoicevoxResult};

/// Turns text into playable audio bytes.
///
/// The pipeline spawns one `synthesize` call per utterance, up to its
/// lookahead limit; implementations must tolerate that many concurrent
/// calls.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render `text` in the given voice style to an audio byte buffer.
    async fn synthesize(&self, text: &str, style_id: StyleId) -> VoicevoxResult<Bytes>;
}

#[async_trait]
impl Synthesizer for DefaultVoicevoxClient {
    async fn synthesize(&self, text: &str, style_id: StyleId) -> VoicevoxResult<Bytes> {
        // Resolves to the client's inherent query-then-render pair.
        self.synthesize(text, style_id).await
    }
}
