//! CLI argument definitions.

use clap::{Parser, Subcommand};
use yomiage_voicevox::StyleId;

/// Default voice: VOICEVOX style id 3 (ずんだもん, ノーマル).
pub const DEFAULT_STYLE_ID: StyleId = 3;

/// Default synthesis lookahead.
pub const DEFAULT_LOOKAHEAD: usize = 5;

/// Relay text to a VOICEVOX engine and play it back in order.
#[derive(Parser)]
#[command(name = "yomiage")]
#[command(about = "Read text aloud through a VOICEVOX-compatible engine")]
pub struct Cli {
    /// Base URL of the speech engine
    #[arg(
        long = "engine",
        global = true,
        env = "YOMIAGE_ENGINE",
        default_value = "http://127.0.0.1:50021"
    )]
    pub engine: String,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read stdin lines and speak them in order (the default).
    ///
    /// A line consisting of `/skip` cuts the currently playing utterance
    /// short.
    Speak {
        /// Voice style id (see `yomiage speakers` for the catalog)
        #[arg(long = "style-id", default_value_t = DEFAULT_STYLE_ID)]
        style_id: StyleId,

        /// How many utterances may render concurrently
        #[arg(long = "lookahead", default_value_t = DEFAULT_LOOKAHEAD)]
        lookahead: usize,
    },

    /// List the engine's voice catalog
    Speakers,
}
