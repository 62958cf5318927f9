//! Playback pipeline error types.

/// Errors that can occur in the playback pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    /// No audio sink attached yet.
    #[error("No audio sink attached — call attach_sink first")]
    SinkNotAttached,

    /// Failed to open or drive the audio output stream.
    #[error("Failed to open audio output stream: {0}")]
    OutputStreamError(String),

    /// Playback of one item failed (decode error, dead sink).
    #[error("Playback failed: {0}")]
    Playback(String),

    /// The pipeline actor has shut down and no longer accepts commands.
    #[error("Playback pipeline stopped")]
    PipelineStopped,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_not_attached_message_names_the_fix() {
        assert!(PlayerError::SinkNotAttached.to_string().contains("attach_sink"));
    }
}
