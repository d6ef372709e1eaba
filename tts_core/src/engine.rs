//! HTTP client for the upstream speech engine.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use tracing::debug;

use crate::{EngineError, FragmentStream, GenerationOptions, SpeechEngine};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Speech engine reached over HTTP.
///
/// The engine answers a generation request with a chunked body of raw PCM
/// bytes, which is surfaced as a fragment stream without re-buffering.
/// Dropping the stream cancels the upstream request, so a client that goes
/// away stops generation instead of letting it run to completion.
pub struct RemoteEngine {
    client: reqwest::Client,
    generate_url: String,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    voice: &'a str,
    repetition_penalty: f32,
    stop_token_ids: &'a [u32],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

impl RemoteEngine {
    pub fn new(base_url: &str) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            generate_url: format!("{}/generate", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl SpeechEngine for RemoteEngine {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<FragmentStream, EngineError> {
        debug!(voice = %options.voice, prompt_chars = prompt.chars().count(), "requesting generation");

        let response = self
            .client
            .post(&self.generate_url)
            .json(&GenerateRequest {
                prompt,
                voice: &options.voice,
                repetition_penalty: options.repetition_penalty,
                stop_token_ids: &options.stop_token_ids,
                max_tokens: options.max_tokens,
                temperature: options.temperature,
                top_p: options.top_p,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EngineError::Status(status.as_u16()));
        }

        Ok(Box::pin(
            response
                .bytes_stream()
                .map(|fragment| fragment.map_err(EngineError::from)),
        ))
    }
}
