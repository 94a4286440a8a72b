// Shared test doubles: a scripted capture source and a scripted
// transcription engine, so pipeline tests control completion order
// and failures deterministically.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lecture_scribe::{
    AudioFrame, AudioSegment, CaptureSource, DeviceError, EngineError, SessionConfig,
    SessionManager, TranscriptionEngine,
};
use tokio::sync::{mpsc, oneshot};

pub const SAMPLE_RATE: u32 = 16000;
pub const FRAME_MS: u64 = 100;
pub const SAMPLES_PER_FRAME: usize = 1600;

/// One 100ms frame of silence at 16kHz mono
pub fn frame(index: u64) -> AudioFrame {
    AudioFrame {
        samples: vec![0i16; SAMPLES_PER_FRAME],
        sample_rate: SAMPLE_RATE,
        channels: 1,
        timestamp_ms: index * FRAME_MS,
    }
}

/// 100ms frames covering `total_ms` of audio
pub fn frames_for_ms(total_ms: u64) -> Vec<AudioFrame> {
    (0..total_ms / FRAME_MS).map(frame).collect()
}

/// Capture source that replays prepared frames.
///
/// With `hold_open` the frame channel stays open after the last frame
/// until `stop()` is called, mimicking a live device that keeps
/// capturing until released.
pub struct ScriptedSource {
    frames: Vec<AudioFrame>,
    hold_open: bool,
    release_tx: Option<oneshot::Sender<()>>,
    capturing: bool,
}

impl ScriptedSource {
    pub fn new(frames: Vec<AudioFrame>, hold_open: bool) -> Self {
        Self {
            frames,
            hold_open,
            release_tx: None,
            capturing: false,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSource for ScriptedSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, DeviceError> {
        let (tx, rx) = mpsc::channel(64);
        let (release_tx, release_rx) = oneshot::channel();
        let frames = self.frames.clone();
        let hold_open = self.hold_open;

        tokio::spawn(async move {
            for frame in frames {
                if tx.send(frame).await.is_err() {
                    return;
                }
            }
            if hold_open {
                let _ = release_rx.await;
            }
        });

        self.release_tx = Some(release_tx);
        self.capturing = true;

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), DeviceError> {
        if let Some(release_tx) = self.release_tx.take() {
            let _ = release_tx.send(());
        }
        self.capturing = false;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Engine whose per-sequence delay and outcome are scripted.
/// Unscripted sequences resolve immediately with empty text.
#[derive(Default)]
pub struct ScriptedEngine {
    outcomes: HashMap<u64, (u64, Result<String, EngineError>)>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sequence: u64, delay_ms: u64, outcome: Result<&str, EngineError>) -> Self {
        self.outcomes
            .insert(sequence, (delay_ms, outcome.map(str::to_string)));
        self
    }
}

#[async_trait::async_trait]
impl TranscriptionEngine for ScriptedEngine {
    async fn transcribe(&self, segment: &AudioSegment) -> Result<String, EngineError> {
        match self.outcomes.get(&segment.sequence) {
            Some((delay_ms, outcome)) => {
                if *delay_ms > 0 {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                }
                outcome.clone()
            }
            None => Ok(String::new()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Session config tuned for tests: 1s segments, short drain
pub fn test_config() -> SessionConfig {
    SessionConfig {
        segment_duration: Duration::from_secs(1),
        drain_timeout: Some(Duration::from_millis(500)),
        ..SessionConfig::default()
    }
}

/// Manager over a scripted source and engine
pub fn scripted_manager(
    engine: ScriptedEngine,
    frames: Vec<AudioFrame>,
    hold_open: bool,
    config: SessionConfig,
) -> SessionManager {
    SessionManager::new(
        config,
        Arc::new(engine),
        Box::new(move || {
            Ok(Box::new(ScriptedSource::new(frames.clone(), hold_open)) as Box<dyn CaptureSource>)
        }),
    )
}

/// Poll until `predicate` holds or `timeout_ms` elapses
pub async fn wait_until(predicate: impl Fn() -> bool, timeout_ms: u64) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}
