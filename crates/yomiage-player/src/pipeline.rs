//! The ordered playback pipeline.
//!
//! ```text
//!   enqueue → pending ──spawn render──▶ in_flight ──▶ current ──▶ sink
//!             (FIFO)    (≤ lookahead)    (FIFO)     (render/play)
//! ```
//!
//! [`Player`] is a handle to an actor task that exclusively owns the queues;
//! commands travel over an mpsc channel, so enqueueing and queue advancement
//! can never interleave. Utterances play in exactly the order they were
//! enqueued, while up to `max_in_flight` later utterances render over the
//! network in the background. That overlap is the point: the engine's
//! synthesis latency is paid while earlier audio is still playing.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use yomiage_voicevox::{StyleId, VoicevoxResult};

use crate::error::PlayerError;
use crate::sink::AudioSink;
use crate::synth::Synthesizer;

/// Default lookahead: how many utterances may render concurrently.
pub const DEFAULT_LOOKAHEAD: usize = 5;

// ── Data model ─────────────────────────────────────────────────────

/// One queued text-to-speech item.
#[derive(Debug, Clone)]
pub struct Utterance {
    /// Already-sanitized text to speak.
    pub text: String,
    /// Engine style id selecting the voice.
    pub style_id: StyleId,
}

/// Configuration for the playback pipeline.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Maximum number of simultaneously rendering utterances.
    pub max_in_flight: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_LOOKAHEAD,
        }
    }
}

// ── Events emitted by the pipeline ─────────────────────────────────

/// Events emitted by the pipeline to the application layer.
#[derive(Debug, Clone)]
pub enum PlayerEvent {
    /// An utterance finished playing naturally.
    Played {
        /// The spoken text.
        text: String,
    },

    /// Synthesis of an utterance failed; the pipeline moved on.
    RenderFailed { text: String, error: String },

    /// The sink failed to play an utterance; the pipeline moved on.
    PlaybackFailed { text: String, error: String },

    /// The current utterance was cut short by `skip_current`.
    Skipped { text: String },

    /// All queues drained and nothing is playing.
    Idle,
}

// ── Commands ───────────────────────────────────────────────────────

enum PlayerCommand {
    Enqueue(Utterance),
    AttachSink(Arc<dyn AudioSink>),
    SkipCurrent,
}

// ── Handle ─────────────────────────────────────────────────────────

/// Handle to the playback pipeline actor.
///
/// Cheap to clone; all clones feed the same ordered queue. Dropping the
/// last handle shuts the actor down.
#[derive(Clone)]
pub struct Player {
    cmd_tx: mpsc::UnboundedSender<PlayerCommand>,
    sink_attached: Arc<AtomicBool>,
}

impl Player {
    /// Spawn the pipeline actor.
    ///
    /// Returns the handle and a receiver for [`PlayerEvent`]s. No sink is
    /// attached yet; `enqueue` fails until [`attach_sink`](Self::attach_sink)
    /// is called.
    #[must_use]
    pub fn spawn(
        synthesizer: Arc<dyn Synthesizer>,
        config: PlayerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PlayerEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let actor = PlayerActor {
            cmd_rx,
            event_tx,
            synthesizer,
            sink: None,
            pending: VecDeque::new(),
            in_flight: VecDeque::new(),
            current: None,
            max_in_flight: config.max_in_flight.max(1),
            idle_reported: true,
            skipping: false,
        };
        tokio::spawn(actor.run());

        let player = Self {
            cmd_tx,
            sink_attached: Arc::new(AtomicBool::new(false)),
        };
        (player, event_rx)
    }

    /// Queue text for playback in the given voice style.
    ///
    /// Empty or whitespace-only text is silently dropped — sanitization may
    /// legitimately leave nothing to say. Fails with
    /// [`PlayerError::SinkNotAttached`] until a sink is attached.
    pub fn enqueue(&self, text: impl Into<String>, style_id: StyleId) -> Result<(), PlayerError> {
        if !self.sink_attached.load(Ordering::SeqCst) {
            return Err(PlayerError::SinkNotAttached);
        }

        let text = text.into();
        if text.trim().is_empty() {
            tracing::debug!("Dropping empty utterance");
            return Ok(());
        }

        self.cmd_tx
            .send(PlayerCommand::Enqueue(Utterance { text, style_id }))
            .map_err(|_| PlayerError::PipelineStopped)
    }

    /// Bind the audio output. Re-binding stops whatever the previous sink
    /// was playing.
    pub fn attach_sink(&self, sink: Arc<dyn AudioSink>) -> Result<(), PlayerError> {
        self.cmd_tx
            .send(PlayerCommand::AttachSink(sink))
            .map_err(|_| PlayerError::PipelineStopped)?;
        self.sink_attached.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Cut the currently playing utterance short. Queued and rendering
    /// items are unaffected; they play next. No-op when nothing is playing.
    pub fn skip_current(&self) {
        let _ = self.cmd_tx.send(PlayerCommand::SkipCurrent);
    }
}

// ── Actor ──────────────────────────────────────────────────────────

/// One in-flight render, paired with its text for event reporting.
struct Render {
    text: String,
    task: JoinHandle<VoicevoxResult<Bytes>>,
}

type PlayFuture = Pin<Box<dyn Future<Output = Result<(), PlayerError>> + Send>>;

/// The item currently occupying the head of the pipeline.
struct Stage {
    text: String,
    kind: StageKind,
}

enum StageKind {
    /// Awaiting the head render task.
    Rendering(JoinHandle<VoicevoxResult<Bytes>>),
    /// Audio handed to the sink; resolves on natural finish or stop.
    Playing(PlayFuture),
}

/// Outcome of the staged item, fed back into the driver.
struct StageOutcome {
    text: String,
    kind: OutcomeKind,
}

enum OutcomeKind {
    Rendered(Result<Bytes, String>),
    Played(Result<(), PlayerError>),
}

struct PlayerActor {
    cmd_rx: mpsc::UnboundedReceiver<PlayerCommand>,
    event_tx: mpsc::UnboundedSender<PlayerEvent>,
    synthesizer: Arc<dyn Synthesizer>,
    sink: Option<Arc<dyn AudioSink>>,

    /// Utterances not yet handed to the engine. FIFO.
    pending: VecDeque<Utterance>,
    /// Spawned render tasks, oldest first. FIFO.
    in_flight: VecDeque<Render>,
    /// Head item being rendered or played.
    current: Option<Stage>,

    max_in_flight: usize,
    /// Whether `Idle` was already emitted for the current quiet period.
    idle_reported: bool,
    /// Set by `SkipCurrent`; suppresses the `Played` event for the item
    /// whose play future resolves because of the stop.
    skipping: bool,
}

impl PlayerActor {
    async fn run(mut self) {
        loop {
            self.schedule();

            if self.current.is_none() && self.pending.is_empty() && !self.idle_reported {
                self.idle_reported = true;
                tracing::debug!("Playback queue drained");
                self.emit(PlayerEvent::Idle);
            }

            tokio::select! {
                cmd = self.cmd_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => break,
                    }
                }
                outcome = Self::run_stage(&mut self.current) => {
                    self.finish_stage(outcome);
                }
            }
        }
        self.shutdown();
    }

    /// Advance the queues as far as they go without awaiting: spawn renders
    /// while the lookahead window has room, and promote the oldest render
    /// to the head stage when it is free. Promotion frees a window slot, so
    /// the two steps loop until neither applies.
    fn schedule(&mut self) {
        loop {
            let rendering_now = usize::from(matches!(
                self.current,
                Some(Stage {
                    kind: StageKind::Rendering(_),
                    ..
                })
            ));

            if self.in_flight.len() + rendering_now < self.max_in_flight {
                if let Some(utterance) = self.pending.pop_front() {
                    self.spawn_render(utterance);
                    continue;
                }
            }

            if self.current.is_none() {
                if let Some(render) = self.in_flight.pop_front() {
                    self.current = Some(Stage {
                        text: render.text,
                        kind: StageKind::Rendering(render.task),
                    });
                    continue;
                }
            }

            break;
        }
    }

    fn spawn_render(&mut self, utterance: Utterance) {
        let Utterance { text, style_id } = utterance;
        let synthesizer = Arc::clone(&self.synthesizer);
        let task_text = text.clone();
        let task =
            tokio::spawn(async move { synthesizer.synthesize(&task_text, style_id).await });

        tracing::debug!(
            style_id,
            in_flight = self.in_flight.len() + 1,
            "Spawned synthesis"
        );
        self.in_flight.push_back(Render { text, task });
    }

    /// Await the staged item. Cancel-safe: the render handle and the play
    /// future both live in `self.current`, so losing the `select!` race to
    /// a command drops only this wrapper, not the underlying work.
    async fn run_stage(current: &mut Option<Stage>) -> StageOutcome {
        let Some(stage) = current.as_mut() else {
            return std::future::pending().await;
        };

        let kind = match &mut stage.kind {
            StageKind::Rendering(task) => {
                let result = match task.await {
                    Ok(Ok(audio)) => Ok(audio),
                    Ok(Err(error)) => Err(error.to_string()),
                    Err(join_error) => Err(join_error.to_string()),
                };
                OutcomeKind::Rendered(result)
            }
            StageKind::Playing(play) => OutcomeKind::Played(play.as_mut().await),
        };

        let stage = current.take().expect("stage present above");
        StageOutcome {
            text: stage.text,
            kind,
        }
    }

    fn finish_stage(&mut self, outcome: StageOutcome) {
        let StageOutcome { text, kind } = outcome;
        match kind {
            OutcomeKind::Rendered(Ok(audio)) => self.start_playing(text, audio),

            OutcomeKind::Rendered(Err(error)) => {
                tracing::warn!(error = %error, "Synthesis failed, skipping utterance");
                self.emit(PlayerEvent::RenderFailed { text, error });
            }

            OutcomeKind::Played(Ok(())) => {
                if self.skipping {
                    self.skipping = false;
                } else {
                    tracing::debug!("Playback finished");
                    self.emit(PlayerEvent::Played { text });
                }
            }

            OutcomeKind::Played(Err(error)) => {
                self.skipping = false;
                tracing::warn!(error = %error, "Playback failed, skipping utterance");
                self.emit(PlayerEvent::PlaybackFailed {
                    text,
                    error: error.to_string(),
                });
            }
        }
    }

    fn start_playing(&mut self, text: String, audio: Bytes) {
        let Some(sink) = self.sink.clone() else {
            // enqueue gates on sink attachment, so a rendered item without
            // a sink means the channel ordering broke somewhere upstream.
            self.emit(PlayerEvent::PlaybackFailed {
                text,
                error: PlayerError::SinkNotAttached.to_string(),
            });
            return;
        };

        tracing::debug!(bytes = audio.len(), "Starting playback");
        let play: PlayFuture = Box::pin(async move { sink.play(audio).await });
        self.current = Some(Stage {
            text,
            kind: StageKind::Playing(play),
        });
    }

    fn handle_command(&mut self, cmd: PlayerCommand) {
        match cmd {
            PlayerCommand::Enqueue(utterance) => {
                tracing::debug!(
                    style_id = utterance.style_id,
                    pending = self.pending.len() + 1,
                    "Utterance enqueued"
                );
                self.pending.push_back(utterance);
                self.idle_reported = false;
            }

            PlayerCommand::AttachSink(sink) => {
                if let Some(old) = self.sink.replace(sink) {
                    old.stop();
                }
                tracing::debug!("Audio sink attached");
            }

            PlayerCommand::SkipCurrent => {
                let playing = matches!(
                    self.current,
                    Some(Stage {
                        kind: StageKind::Playing(_),
                        ..
                    })
                );
                if !playing {
                    return;
                }
                if let Some(sink) = &self.sink {
                    sink.stop();
                }
                self.skipping = true;
                if let Some(stage) = &self.current {
                    tracing::debug!("Skipping current utterance");
                    self.emit(PlayerEvent::Skipped {
                        text: stage.text.clone(),
                    });
                }
            }
        }
    }

    /// Emit a pipeline event (best-effort; a dropped receiver is fine).
    fn emit(&self, event: PlayerEvent) {
        let _ = self.event_tx.send(event);
    }

    fn shutdown(&self) {
        if let Some(Stage {
            kind: StageKind::Rendering(task),
            ..
        }) = &self.current
        {
            task.abort();
        }
        for render in &self.in_flight {
            render.task.abort();
        }
        if let Some(sink) = &self.sink {
            sink.stop();
        }
        tracing::debug!("Playback pipeline shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;

    struct CountingSynth {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Synthesizer for CountingSynth {
        async fn synthesize(&self, _text: &str, _style_id: StyleId) -> VoicevoxResult<Bytes> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(b"audio"))
        }
    }

    struct NullSink;

    #[async_trait]
    impl AudioSink for NullSink {
        async fn play(&self, _audio: Bytes) -> Result<(), PlayerError> {
            Ok(())
        }

        fn stop(&self) {}
    }

    fn counting_player() -> (Player, mpsc::UnboundedReceiver<PlayerEvent>, Arc<CountingSynth>) {
        let synth = Arc::new(CountingSynth {
            calls: AtomicUsize::new(0),
        });
        let (player, events) = Player::spawn(Arc::clone(&synth) as Arc<dyn Synthesizer>, PlayerConfig::default());
        (player, events, synth)
    }

    #[test]
    fn default_lookahead_is_five() {
        assert_eq!(PlayerConfig::default().max_in_flight, DEFAULT_LOOKAHEAD);
    }

    #[tokio::test]
    async fn enqueue_without_sink_fails_synchronously() {
        let (player, _events, synth) = counting_player();

        let result = player.enqueue("こんにちは", 3);
        assert!(matches!(result, Err(PlayerError::SinkNotAttached)));

        tokio::task::yield_now().await;
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_text_is_dropped_without_synthesis() {
        let (player, mut events, synth) = counting_player();
        player.attach_sink(Arc::new(NullSink)).unwrap();

        player.enqueue("", 3).unwrap();
        player.enqueue("   \n\t", 3).unwrap();

        tokio::task::yield_now().await;
        assert_eq!(synth.calls.load(Ordering::SeqCst), 0);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn single_utterance_plays_then_goes_idle() {
        let (player, mut events, synth) = counting_player();
        player.attach_sink(Arc::new(NullSink)).unwrap();

        player.enqueue("こんにちは", 3).unwrap();

        let first = events.recv().await.unwrap();
        assert!(matches!(first, PlayerEvent::Played { ref text } if text == "こんにちは"));
        assert!(matches!(events.recv().await.unwrap(), PlayerEvent::Idle));
        assert_eq!(synth.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn skip_with_nothing_playing_is_a_noop() {
        let (player, mut events, _synth) = counting_player();
        player.attach_sink(Arc::new(NullSink)).unwrap();

        player.skip_current();
        tokio::task::yield_now().await;
        assert!(events.try_recv().is_err());
    }
}
