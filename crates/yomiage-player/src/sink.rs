//! The audio output seam of the pipeline.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::PlayerError;

/// A single streaming audio output.
///
/// The pipeline plays exactly one item at a time; `play` resolves once,
/// either when the audio drains naturally or when [`stop`](Self::stop) cuts
/// it short. A stopped play still resolves `Ok` — interruption is a normal
/// outcome, not a failure.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play one rendered audio buffer to completion (or until stopped).
    async fn play(&self, audio: Bytes) -> Result<(), PlayerError>;

    /// Cut the current playback short. No-op when nothing is playing.
    fn stop(&self);
}
