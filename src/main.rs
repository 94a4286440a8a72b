use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use lecture_scribe::{
    create_router, AppState, CaptureSource, Config, MicrophoneSource, NatsEngine, SessionConfig,
    SessionManager, SourceConfig,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cfg = Config::load("config/lecture-scribe")?;

    info!("{} v0.1.0", cfg.service.name);

    let engine = NatsEngine::connect(
        &cfg.engine.nats_url,
        cfg.engine.subject.clone(),
        Duration::from_secs(cfg.engine.request_timeout_secs),
    )
    .await
    .context("failed to connect to the transcription engine")?;

    let session_config = SessionConfig {
        segment_duration: Duration::from_secs(cfg.audio.segment_duration_secs),
        sample_rate: cfg.audio.sample_rate,
        channels: cfg.audio.channels,
        max_in_flight: cfg.pipeline.max_in_flight,
        queue_capacity: cfg.pipeline.queue_capacity,
        drain_timeout: cfg.pipeline.drain_timeout_secs.map(Duration::from_secs),
        ..SessionConfig::default()
    };

    let source_config = SourceConfig {
        target_sample_rate: cfg.audio.sample_rate,
        target_channels: cfg.audio.channels,
        ..SourceConfig::default()
    };

    let manager = Arc::new(SessionManager::new(
        session_config,
        Arc::new(engine),
        Box::new(move || {
            Ok(Box::new(MicrophoneSource::new(source_config.clone())) as Box<dyn CaptureSource>)
        }),
    ));

    let router = create_router(AppState::new(manager));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
