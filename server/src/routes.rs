use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::{pin_mut, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use tts_core::{stream as audio_stream, wav, AudioFormat, GenerationOptions, SpeechEngine, StreamError};

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::metrics::StreamMetrics;
use crate::validation::validate_prompt;

/// Spoken when the caller forgets to say anything.
pub const DEFAULT_PROMPT: &str = "Hey there, looks like you forgot to provide a prompt!";

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<dyn SpeechEngine>,
    pub metrics: Arc<StreamMetrics>,
    pub config: ServerConfig,
}

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/tts", get(stream_tts))
        .route("/metrics", get(metrics_endpoint));

    Router::new()
        .merge(api.clone()) // root paths
        .nest("/api", api) // /api prefix
        .with_state(state)
}

pub async fn health_check() -> &'static str {
    "ok"
}

#[derive(Deserialize)]
pub struct TtsParams {
    prompt: Option<String>,
}

/// `GET /tts?prompt=<text>`: stream synthesized speech as WAV.
///
/// The 44-byte header goes out as the first write so playback can start
/// immediately; audio follows in frame-aligned blocks as the engine
/// produces it. Nothing is buffered beyond one block, and the body stream
/// is pull-driven: a slow client pauses the engine pull loop, a
/// disconnected client drops the stream and cancels generation.
pub async fn stream_tts(
    State(state): State<AppState>,
    Query(params): Query<TtsParams>,
) -> Result<Response, ApiError> {
    state.metrics.record_request();

    let prompt = params
        .prompt
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_PROMPT.to_string());
    validate_prompt(&prompt, state.config.max_prompt_chars)?;

    let format = AudioFormat::default();
    let frame_bytes = format.frame_bytes();
    let header = wav::streaming_header(&format);

    let options = GenerationOptions {
        voice: state.config.voice.clone(),
        ..GenerationOptions::default()
    };

    debug!(prompt_chars = prompt.chars().count(), "starting speech stream");
    let fragments = state.engine.generate(&prompt, &options).await?;
    let blocks = audio_stream::coalesce(fragments, state.config.chunk_bytes)?;
    let guard = state.metrics.begin_stream();

    let body = async_stream::stream! {
        let guard = guard;

        // Header first; its size fields carry the streaming sentinel.
        guard.add_bytes(header.len() as u64);
        yield Ok::<Bytes, StreamError>(Bytes::from(header));

        pin_mut!(blocks);
        while let Some(block) = blocks.next().await {
            match block {
                Ok(block) => {
                    if let Some(aligned) = audio_stream::frame_align(block, frame_bytes) {
                        guard.add_bytes(aligned.len() as u64);
                        yield Ok(aligned);
                    }
                }
                Err(e) => {
                    // The 200 is already on the wire; all we can do is cut
                    // the connection short without emitting partial frames.
                    warn!("speech stream aborted: {e}");
                    yield Err(e);
                    return;
                }
            }
        }
        guard.complete();
    };

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "audio/wav")
        .header(
            header::CACHE_CONTROL,
            "no-cache, no-store, must-revalidate, max-age=0",
        )
        .header(header::PRAGMA, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        // Nginx/Cloudflare compatible hint to not buffer
        .header("x-accel-buffering", "no")
        .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(Body::from_stream(body))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

#[derive(Serialize)]
pub struct MetricsResponse {
    pub timestamp: DateTime<Utc>,
    pub cpu_usage_percent: f32,
    pub memory_used_mb: u64,
    pub memory_total_mb: u64,
    pub memory_usage_percent: f32,
    pub request_count: u64,
    pub active_streams: u64,
    pub completed_streams: u64,
    pub aborted_streams: u64,
    pub bytes_streamed: u64,
    pub uptime_seconds: u64,
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    let mut system = sysinfo::System::new();
    system.refresh_cpu();
    system.refresh_memory();

    let cpu_usage = system.global_cpu_info().cpu_usage();
    let memory_used = system.used_memory();
    let memory_total = system.total_memory();
    let memory_usage_percent = if memory_total > 0 {
        (memory_used as f64 / memory_total as f64 * 100.0) as f32
    } else {
        0.0
    };

    Json(MetricsResponse {
        timestamp: Utc::now(),
        cpu_usage_percent: cpu_usage,
        memory_used_mb: memory_used / 1024 / 1024,
        memory_total_mb: memory_total / 1024 / 1024,
        memory_usage_percent,
        request_count: state.metrics.requests(),
        active_streams: state.metrics.active_streams(),
        completed_streams: state.metrics.completed_streams(),
        aborted_streams: state.metrics.aborted_streams(),
        bytes_streamed: state.metrics.bytes_streamed(),
        uptime_seconds: state.metrics.uptime_seconds(),
    })
}
