// Integration tests for the WAV replay source
//
// These tests verify that a recording replays as a frame stream with
// the same shape a live device would produce.

use anyhow::Result;
use lecture_scribe::{CaptureSource, DeviceError, WavFileSource};
use std::path::Path;
use tempfile::TempDir;

/// Write a WAV fixture: `total_ms` of 16kHz mono with a constant value
fn write_fixture(path: &Path, total_ms: u64, value: i16) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for _ in 0..(16000 * total_ms / 1000) {
        writer.write_sample(value)?;
    }
    writer.finalize()?;

    Ok(())
}

#[tokio::test]
async fn test_wav_source_replays_all_samples() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("fixture.wav");
    write_fixture(&path, 500, 42)?;

    let mut source = WavFileSource::new(&path, false);
    let mut frame_rx = source.start().await?;
    assert!(source.is_capturing());

    let mut frames = Vec::new();
    while let Some(frame) = frame_rx.recv().await {
        frames.push(frame);
    }

    // 500ms at 100ms per frame
    assert_eq!(frames.len(), 5);

    let total_samples: usize = frames.iter().map(|f| f.samples.len()).sum();
    assert_eq!(total_samples, 8000);

    for frame in &frames {
        assert_eq!(frame.sample_rate, 16000);
        assert_eq!(frame.channels, 1);
        assert!(frame.samples.iter().all(|&s| s == 42));
    }

    // Timestamps step by the frame length
    assert_eq!(frames[0].timestamp_ms, 0);
    assert_eq!(frames[4].timestamp_ms, 400);

    source.stop().await?;
    assert!(!source.is_capturing());

    Ok(())
}

#[tokio::test]
async fn test_wav_source_channel_closes_at_end_of_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("short.wav");
    write_fixture(&path, 100, 0)?;

    let mut source = WavFileSource::new(&path, false);
    let mut frame_rx = source.start().await?;

    assert!(frame_rx.recv().await.is_some());
    // EOF: the stream terminates rather than blocking
    assert!(frame_rx.recv().await.is_none());

    Ok(())
}

#[tokio::test]
async fn test_wav_source_missing_file_is_unavailable() {
    let mut source = WavFileSource::new("/nonexistent/path/to/audio.wav", false);

    match source.start().await {
        Err(DeviceError::Unavailable(_)) => {}
        other => panic!("expected Unavailable, got {:?}", other.map(|_| ())),
    }
    assert!(!source.is_capturing());
}

#[tokio::test]
async fn test_wav_source_stop_is_idempotent() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("fixture.wav");
    write_fixture(&path, 200, 1)?;

    let mut source = WavFileSource::new(&path, false);
    let _frame_rx = source.start().await?;

    source.stop().await?;
    source.stop().await?; // No-op the second time

    Ok(())
}
