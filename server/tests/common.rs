//! Common utilities for integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use futures_util::{stream, StreamExt};

use server::config::ServerConfig;
use server::metrics::StreamMetrics;
use server::{app, AppState};
use tts_core::{EngineError, FragmentStream, GenerationOptions, SpeechEngine};

/// Engine double that replays a scripted fragment sequence and records the
/// prompts it was asked to speak.
pub struct ScriptedEngine {
    fragments: Vec<Bytes>,
    trailing_error: Option<u16>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedEngine {
    pub fn new(fragments: &[&'static [u8]]) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.iter().map(|f| Bytes::from_static(f)).collect(),
            trailing_error: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Replays `fragments`, then fails as if the engine died mid-stream.
    pub fn failing_after(fragments: &[&'static [u8]], status: u16) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.iter().map(|f| Bytes::from_static(f)).collect(),
            trailing_error: Some(status),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechEngine for ScriptedEngine {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<FragmentStream, EngineError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let mut items: Vec<Result<Bytes, EngineError>> =
            self.fragments.iter().cloned().map(Ok).collect();
        if let Some(status) = self.trailing_error {
            items.push(Err(EngineError::Status(status)));
        }
        Ok(Box::pin(stream::iter(items)))
    }
}

/// Engine double that refuses every request before any audio exists.
pub struct RefusingEngine;

#[async_trait]
impl SpeechEngine for RefusingEngine {
    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<FragmentStream, EngineError> {
        Err(EngineError::Status(503))
    }
}

/// Engine double whose fragment stream counts how often it is pulled, to
/// observe whether a dropped response keeps pulling.
pub struct CountingEngine {
    pulled: Arc<AtomicUsize>,
    fragment: Bytes,
    total: usize,
}

impl CountingEngine {
    pub fn new(fragment: &'static [u8], total: usize) -> Arc<Self> {
        Arc::new(Self {
            pulled: Arc::new(AtomicUsize::new(0)),
            fragment: Bytes::from_static(fragment),
            total,
        })
    }

    pub fn pulled(&self) -> usize {
        self.pulled.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SpeechEngine for CountingEngine {
    async fn generate(
        &self,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<FragmentStream, EngineError> {
        let pulled = Arc::clone(&self.pulled);
        let fragment = self.fragment.clone();
        let fragments = stream::iter(0..self.total).map(move |_| {
            pulled.fetch_add(1, Ordering::Relaxed);
            Ok(fragment.clone())
        });
        Ok(Box::pin(fragments))
    }
}

/// Config with a tiny chunk size so block boundaries are easy to assert.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        chunk_bytes: 4,
        ..ServerConfig::default()
    }
}

/// Create a test app instance around an engine double.
pub fn create_test_app(engine: Arc<dyn SpeechEngine>, config: ServerConfig) -> Router {
    let state = AppState {
        engine,
        metrics: Arc::new(StreamMetrics::new()),
        config,
    };
    app(state)
}
