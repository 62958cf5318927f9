#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]

pub mod error;
pub mod pipeline;
pub mod playback;
pub mod sink;
pub mod synth;
pub mod text;

// Re-export key types for convenience
pub use error::PlayerError;
pub use pipeline::{Player, PlayerConfig, PlayerEvent, Utterance};
pub use playback::RodioSink;
pub use sink::AudioSink;
pub use synth::Synthesizer;

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
