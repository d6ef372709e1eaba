//! Core pipeline for streamed speech synthesis: WAV header construction,
//! re-chunking of engine output into player-friendly frame-aligned blocks,
//! and the client for the upstream speech engine.

pub mod engine;
pub mod stream;
pub mod wav;

use std::pin::Pin;

use bytes::Bytes;
use futures_core::Stream;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use engine::RemoteEngine;
pub use wav::AudioFormat;

/// Raw audio bytes as produced by a speech engine.
///
/// Fragment sizes and pacing are unpredictable. Empty fragments may occur
/// and carry no meaning; only exhaustion of the stream marks the end of
/// generation.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Bytes, EngineError>> + Send>>;

/// Failures from the speech engine itself.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("engine returned HTTP {0}")]
    Status(u16),
}

/// Failures in the streaming pipeline around the engine.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("chunk size must be at least one byte")]
    InvalidChunkSize,

    #[error("invalid audio format: {0}")]
    InvalidFormat(&'static str),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Sampling parameters forwarded to the speech engine with every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub voice: String,
    pub repetition_penalty: f32,
    pub stop_token_ids: Vec<u32>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            voice: "tara".to_string(),
            repetition_penalty: 1.1,
            stop_token_ids: vec![128_258],
            max_tokens: 2000,
            temperature: 0.4,
            top_p: 0.9,
        }
    }
}

/// Capability interface for speech generation.
///
/// One engine handle is constructed at startup and shared across all
/// in-flight requests; implementations must therefore be safe to call
/// concurrently. Each call yields an independent fragment stream.
#[async_trait::async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<FragmentStream, EngineError>;
}
