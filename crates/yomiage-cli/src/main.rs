//! CLI entry point — the composition root.
//!
//! Wires a VOICEVOX client, the playback pipeline, and the rodio sink
//! together, then relays stdin lines into the pipeline. This binary is the
//! only place where the pieces meet; both libraries stay ignorant of each
//! other's construction.

mod parser;

use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncBufReadExt;
use yomiage_player::{Player, PlayerConfig, PlayerEvent, RodioSink, text};
use yomiage_voicevox::{DefaultVoicevoxClient, StyleId, VoicevoxConfig};

use crate::parser::{Cli, Commands, DEFAULT_LOOKAHEAD, DEFAULT_STYLE_ID};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = VoicevoxConfig::new(&cli.engine)?;
    let client = Arc::new(DefaultVoicevoxClient::new(config));

    match cli.command {
        Some(Commands::Speakers) => list_speakers(&client).await,
        Some(Commands::Speak {
            style_id,
            lookahead,
        }) => speak(client, style_id, lookahead).await,
        None => speak(client, DEFAULT_STYLE_ID, DEFAULT_LOOKAHEAD).await,
    }
}

fn init_tracing(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Print the engine's voice catalog, one style per line.
async fn list_speakers(client: &DefaultVoicevoxClient) -> anyhow::Result<()> {
    let speakers = client.speakers().await?;
    for speaker in &speakers {
        println!("{} ({})", speaker.name, speaker.speaker_uuid);
        for style in &speaker.styles {
            println!("  {:>4}  {}", style.id, style.name);
        }
    }
    Ok(())
}

/// Relay stdin lines into the pipeline until EOF, then wait for the last
/// utterance to finish.
async fn speak(
    client: Arc<DefaultVoicevoxClient>,
    style_id: StyleId,
    lookahead: usize,
) -> anyhow::Result<()> {
    // Warm the style's model up front; some engines don't implement the
    // initialization endpoints, so failure here is not fatal.
    if let Err(error) = client.ensure_speaker_initialized(style_id).await {
        tracing::warn!(error = %error, style_id, "Speaker initialization skipped");
    }

    let (player, mut events) = Player::spawn(
        client,
        PlayerConfig {
            max_in_flight: lookahead,
        },
    );
    let sink = Arc::new(RodioSink::new()?);
    player.attach_sink(sink)?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    let mut submitted: usize = 0;
    let mut resolved: usize = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim() == "/skip" {
                    player.skip_current();
                    continue;
                }

                let cleaned = text::sanitize(&line);
                if cleaned.is_empty() {
                    continue;
                }
                player.enqueue(cleaned, style_id)?;
                submitted += 1;
            }
            event = events.recv() => {
                let Some(event) = event else { break };
                resolved += report(&event);
            }
        }
    }

    // EOF: every submitted utterance still resolves exactly once.
    while resolved < submitted {
        let Some(event) = events.recv().await else { break };
        resolved += report(&event);
    }

    Ok(())
}

/// Log one pipeline event; returns 1 when it resolves an utterance.
fn report(event: &PlayerEvent) -> usize {
    match event {
        PlayerEvent::Played { text } => {
            tracing::info!(text = %text, "Played");
            1
        }
        PlayerEvent::RenderFailed { text, error } => {
            tracing::warn!(text = %text, error = %error, "Synthesis failed");
            1
        }
        PlayerEvent::PlaybackFailed { text, error } => {
            tracing::warn!(text = %text, error = %error, "Playback failed");
            1
        }
        PlayerEvent::Skipped { text } => {
            tracing::info!(text = %text, "Skipped");
            1
        }
        PlayerEvent::Idle => 0,
    }
}
