// Live transcription demo: microphone capture through the full
// pipeline with a NATS-backed engine.
//
// Prerequisites:
// - NATS server running: docker run -p 4222:4222 nats
// - An STT service answering requests on the configured subject
//
// Usage: cargo run --example live_session -- --duration 30

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use lecture_scribe::{
    CaptureSource, MicrophoneSource, NatsEngine, SessionConfig, SessionManager, SourceConfig,
};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "live_session")]
#[command(about = "Record the microphone and print the live transcript")]
struct Args {
    /// Duration to record in seconds
    #[arg(short, long, default_value = "30")]
    duration: u64,

    /// Segment duration in seconds
    #[arg(short, long, default_value = "5")]
    segment_duration: u64,

    /// NATS server URL
    #[arg(long, default_value = "nats://localhost:4222")]
    nats_url: String,

    /// Subject the STT service listens on
    #[arg(long, default_value = "stt.transcribe")]
    subject: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let args = Args::parse();

    info!("recording for {} seconds", args.duration);

    let engine = NatsEngine::connect(&args.nats_url, args.subject, Duration::from_secs(30)).await?;

    let manager = Arc::new(SessionManager::new(
        SessionConfig {
            segment_duration: Duration::from_secs(args.segment_duration),
            ..SessionConfig::default()
        },
        Arc::new(engine),
        Box::new(|| {
            Ok(Box::new(MicrophoneSource::new(SourceConfig::default())) as Box<dyn CaptureSource>)
        }),
    ));

    // Print the transcript as it grows
    let mut updates = manager.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let transcript = updates.borrow_and_update().clone();
            if !transcript.is_empty() {
                println!("\n--- transcript so far ---\n{}", transcript);
            }
        }
    });

    manager.start_session().await?;
    info!("speak into your microphone!");

    tokio::time::sleep(Duration::from_secs(args.duration)).await;

    if let Some(stats) = manager.stop_session().await {
        info!(
            "session finished: {} segments dispatched, {} transcribed, {} failed",
            stats.segments_dispatched, stats.segments_transcribed, stats.segments_failed
        );
    }

    printer.abort();

    println!("\n=== final transcript ===\n{}", manager.transcript());

    Ok(())
}
