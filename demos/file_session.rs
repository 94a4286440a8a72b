// Batch transcription demo: run a WAV recording through the pipeline
// as if it were live capture.
//
// Usage: cargo run --example file_session -- --path recording.wav

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use lecture_scribe::{
    CaptureSource, NatsEngine, SessionConfig, SessionManager, WavFileSource,
};
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "file_session")]
#[command(about = "Transcribe a WAV file through the live pipeline")]
struct Args {
    /// Path to the WAV file
    #[arg(short, long)]
    path: String,

    /// Segment duration in seconds
    #[arg(short, long, default_value = "5")]
    segment_duration: u64,

    /// Replay at recording speed instead of as fast as possible
    #[arg(long)]
    paced: bool,

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

    let engine = NatsEngine::connect(&args.nats_url, args.subject, Duration::from_secs(30)).await?;

    let path = args.path.clone();
    let paced = args.paced;
    let manager = Arc::new(SessionManager::new(
        SessionConfig {
            segment_duration: Duration::from_secs(args.segment_duration),
            ..SessionConfig::default()
        },
        Arc::new(engine),
        Box::new(move || {
            Ok(Box::new(WavFileSource::new(&path, paced)) as Box<dyn CaptureSource>)
        }),
    ));

    manager.start_session().await?;
    info!("transcribing {}", args.path);

    // The file source closes its stream at EOF; wait for the transcript
    // to stop growing, then shut the session down.
    let mut updates = manager.subscribe();
    loop {
        match tokio::time::timeout(Duration::from_secs(5), updates.changed()).await {
            Ok(Ok(())) => {
                updates.borrow_and_update();
            }
            _ => break, // no updates for a while: drained (or stream closed)
        }
    }

    if let Some(stats) = manager.stop_session().await {
        info!(
            "done: {} segments dispatched, {} transcribed, {} failed",
            stats.segments_dispatched, stats.segments_transcribed, stats.segments_failed
        );
    }

    println!("{}", manager.transcript());

    Ok(())
}
