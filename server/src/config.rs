// Configuration constants for the server

use std::time::Duration;

#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub engine_url: String,
    pub voice: String,
    pub chunk_bytes: usize,
    pub max_prompt_chars: usize,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            engine_url: "http://127.0.0.1:8000".to_string(),
            voice: "tara".to_string(),
            // 20 ms of 16-bit mono at 24 kHz
            chunk_bytes: 960,
            max_prompt_chars: 5000,
            rate_limit_per_minute: 60,
            request_timeout_secs: 60,
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.port);

        let engine_url = std::env::var("ENGINE_URL").unwrap_or(defaults.engine_url);

        let voice = std::env::var("VOICE").unwrap_or(defaults.voice);

        let chunk_bytes = std::env::var("CHUNK_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.chunk_bytes);

        let max_prompt_chars = std::env::var("MAX_PROMPT_CHARS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_prompt_chars);

        let rate_limit_per_minute = std::env::var("RATE_LIMIT_PER_MINUTE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.rate_limit_per_minute);

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.request_timeout_secs);

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .ok()
            .map(|origins| origins.split(',').map(|s| s.trim().to_string()).collect());

        Self {
            port,
            engine_url,
            voice,
            chunk_bytes,
            max_prompt_chars,
            rate_limit_per_minute,
            request_timeout_secs,
            cors_allowed_origins,
        }
    }

    /// Reject settings that would only fail once a stream is in flight.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_bytes == 0 {
            anyhow::bail!("CHUNK_BYTES must be at least 1");
        }
        if self.engine_url.trim().is_empty() {
            anyhow::bail!("ENGINE_URL must not be empty");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
