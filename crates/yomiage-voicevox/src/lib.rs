#![doc = include_str!("../README.md")]
#![deny(unsafe_code)]
#![deny(unused_crate_dependencies)]
// The generic client is meant to be used through DefaultVoicevoxClient;
// its backend parameter is an implementation detail.
#![allow(private_interfaces)]

mod catalog;
mod client;
mod error;
mod http;
mod models;
mod url;

// ============================================================================
// Public API
// ============================================================================

// Client
pub use client::DefaultVoicevoxClient;

// Configuration
pub use models::VoicevoxConfig;

// Catalog and synthesis types
pub use models::{AudioQuery, Speaker, SpeakerInfo, SpeakerStyle, StyleId};

// Errors
pub use error::{VoicevoxError, VoicevoxResult};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
