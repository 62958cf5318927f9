//! Production audio sink backed by `rodio`.
//!
//! `rodio::OutputStream` is `!Send` on some platforms (macOS CoreAudio,
//! etc.), so it is confined to a dedicated OS thread; [`RodioSink`] is the
//! `Send + Sync` proxy the pipeline holds, routing every operation through
//! a command channel.

use std::io::Cursor;
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use bytes::Bytes;
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::oneshot;

use crate::error::PlayerError;
use crate::sink::AudioSink;

// ── Commands ───────────────────────────────────────────────────────

enum SinkCommand {
    /// Decode and play one audio buffer; `done` fires when the sink drains
    /// or is stopped.
    Play {
        audio: Bytes,
        done: oneshot::Sender<Result<(), PlayerError>>,
    },

    /// Stop the current playback immediately (fire-and-forget).
    Stop,

    /// Shut down the audio thread, releasing the output stream.
    Shutdown,
}

// ── Sink ───────────────────────────────────────────────────────────

/// Audio sink playing WAV buffers on the default output device.
pub struct RodioSink {
    cmd_tx: mpsc::Sender<SinkCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioSink {
    /// Spawn the audio thread and open the default output device.
    ///
    /// Device errors surface here, via a one-shot init channel, rather
    /// than on the first play.
    pub fn new() -> Result<Self, PlayerError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<SinkCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), PlayerError>>();

        let thread = thread::Builder::new()
            .name("yomiage-audio".into())
            .spawn(move || Self::run(cmd_rx, &init_tx))
            .map_err(|e| {
                PlayerError::OutputStreamError(format!("failed to spawn audio thread: {e}"))
            })?;

        // Wait for the audio thread to finish opening the device.
        init_rx
            .recv()
            .map_err(|_| PlayerError::OutputStreamError("audio thread died".to_string()))??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    /// The body of the dedicated audio thread. Owns the `OutputStream` for
    /// its entire lifetime — it never crosses a thread boundary.
    fn run(cmd_rx: mpsc::Receiver<SinkCommand>, init_tx: &mpsc::Sender<Result<(), PlayerError>>) {
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = init_tx.send(Err(PlayerError::OutputStreamError(e.to_string())));
                return;
            }
        };
        // Must stay alive for playback to work.
        let _stream = stream;

        if init_tx.send(Ok(())).is_err() {
            return;
        }
        tracing::info!("Audio output initialized on default device");

        let mut current: Option<std::sync::Arc<Sink>> = None;

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                SinkCommand::Play { audio, done } => {
                    // One item at a time: cut off anything still playing.
                    if let Some(sink) = current.take() {
                        sink.stop();
                    }

                    let sink = match Sink::try_new(&stream_handle) {
                        Ok(sink) => sink,
                        Err(e) => {
                            let _ =
                                done.send(Err(PlayerError::OutputStreamError(e.to_string())));
                            continue;
                        }
                    };

                    let source = match Decoder::new(Cursor::new(audio)) {
                        Ok(source) => source,
                        Err(e) => {
                            let _ = done.send(Err(PlayerError::Playback(format!(
                                "failed to decode audio: {e}"
                            ))));
                            continue;
                        }
                    };

                    sink.append(source);
                    let sink = std::sync::Arc::new(sink);
                    current = Some(std::sync::Arc::clone(&sink));

                    // `Sink` is Send in rodio 0.20+, so it can move into a
                    // watcher thread. `sleep_until_end()` blocks until the
                    // queue drains or `stop()` drops the sources, at which
                    // point it returns immediately.
                    thread::spawn(move || {
                        sink.sleep_until_end();
                        let _ = done.send(Ok(()));
                    });
                }

                SinkCommand::Stop => {
                    if let Some(sink) = current.take() {
                        sink.stop();
                    }
                }

                SinkCommand::Shutdown => break,
            }
        }

        tracing::debug!("Audio thread shutting down");
    }
}

#[async_trait]
impl AudioSink for RodioSink {
    async fn play(&self, audio: Bytes) -> Result<(), PlayerError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.cmd_tx
            .send(SinkCommand::Play {
                audio,
                done: done_tx,
            })
            .map_err(|_| PlayerError::OutputStreamError("audio thread stopped".to_string()))?;
        done_rx
            .await
            .map_err(|_| PlayerError::OutputStreamError("audio thread stopped".to_string()))?
    }

    fn stop(&self) {
        let _ = self.cmd_tx.send(SinkCommand::Stop);
    }
}

impl Drop for RodioSink {
    fn drop(&mut self) {
        // Best-effort shutdown — the thread may already be dead.
        let _ = self.cmd_tx.send(SinkCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}
