use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::GlobalKeyExtractor, GovernorLayer,
};
use tracing::{info, warn};

use server::config::ServerConfig;
use server::metrics::StreamMetrics;
use server::{app, AppState};
use tts_core::RemoteEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let _ = dotenv::dotenv();

    async_main().await
}

async fn async_main() -> anyhow::Result<()> {
    info!("Starting streaming TTS server...");

    let config = ServerConfig::from_env();
    config.validate()?;

    let engine = Arc::new(
        RemoteEngine::new(&config.engine_url)
            .map_err(|e| anyhow::anyhow!("Failed to build engine client: {e}"))?,
    );
    info!("Speech engine at {}", config.engine_url);

    let state = AppState {
        engine,
        metrics: Arc::new(StreamMetrics::new()),
        config: config.clone(),
    };
    info!(
        "Server configuration loaded: port={}, voice={}, chunk_bytes={}, rate_limit={}/min",
        config.port, config.voice, config.chunk_bytes, config.rate_limit_per_minute
    );

    // CORS configuration - environment-aware
    let cors = if let Some(ref allowed_origins) = config.cors_allowed_origins {
        // Production: Use specific origins from environment
        let origins: Vec<axum::http::HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin: &String| origin.parse::<axum::http::HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            warn!("CORS_ALLOWED_ORIGINS is empty, falling back to permissive CORS");
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
                .allow_headers(tower_http::cors::Any)
                .allow_credentials(false)
        } else {
            info!("CORS configured for {} origin(s)", origins.len());
            CorsLayer::new()
                .allow_origin(tower_http::cors::AllowOrigin::list(origins))
                .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
                .allow_headers(tower_http::cors::Any)
                .allow_credentials(false)
        }
    } else {
        // Development: Allow all origins (with warning)
        warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (development mode)");
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
            .allow_headers(tower_http::cors::Any)
            .allow_credentials(false)
    };

    // Rate limiting configuration
    // Using GlobalKeyExtractor to rate limit globally (all requests share the same limit)
    // This works better in Docker/proxy environments where IP extraction can be problematic
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second((config.rate_limit_per_minute / 60).max(1) as u64)
            .burst_size(config.rate_limit_per_minute)
            .key_extractor(GlobalKeyExtractor)
            .finish()
            .unwrap(),
    );

    info!("Rate limiting: {} requests per minute", config.rate_limit_per_minute);

    // Request ID middleware for tracing
    async fn add_request_id(mut request: Request, next: Next) -> Response {
        let request_id = uuid::Uuid::new_v4().to_string();
        request.headers_mut().insert(
            "x-request-id",
            axum::http::HeaderValue::from_str(&request_id).unwrap(),
        );
        let mut response = next.run(request).await;
        response.headers_mut().insert(
            "x-request-id",
            axum::http::HeaderValue::from_str(&request_id).unwrap(),
        );
        response
    }

    // The timeout bounds time-to-first-byte, not the body stream itself;
    // a long generation keeps streaming past it once the response started.
    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors)
        .into_inner();

    let router = app(state)
        .layer(axum::middleware::from_fn(add_request_id))
        .layer(middleware_stack);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {addr}: {e}. Try a different PORT."))?;

    info!("Server listening on http://{addr}");
    axum::serve(listener, router).await?;
    Ok(())
}
