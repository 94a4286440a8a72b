use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{error, info, warn};

use super::config::SessionConfig;
use super::coordinator::{PipelineCounters, PipelineCoordinator};
use super::stats::SessionStats;
use crate::audio::{CaptureSource, Segmenter, SegmenterConfig};
use crate::engine::TranscriptionEngine;
use crate::error::DeviceError;
use crate::transcript::TranscriptAccumulator;

/// One start-to-stop recording lifecycle.
///
/// Owns the capture source exclusively while active and the segmenter
/// and coordinator tasks that carry audio from the device to the
/// transcript.
pub struct RecordingSession {
    config: SessionConfig,

    engine: Arc<dyn TranscriptionEngine>,

    /// Transcript shared with the presentation layer; reset on start
    accumulator: TranscriptAccumulator,

    /// When the session started
    started_at: chrono::DateTime<chrono::Utc>,

    /// Whether recording is currently active
    is_recording: AtomicBool,

    /// The capture source, held for the lifetime of the session
    source: Mutex<Option<Box<dyn CaptureSource>>>,

    /// Handle for the segmenter task
    segmenter_task: Mutex<Option<JoinHandle<u64>>>,

    /// Handle for the coordinator task
    coordinator_task: Mutex<Option<JoinHandle<()>>>,

    counters: PipelineCounters,
}

impl RecordingSession {
    pub fn new(
        config: SessionConfig,
        engine: Arc<dyn TranscriptionEngine>,
        accumulator: TranscriptAccumulator,
    ) -> Self {
        Self {
            config,
            engine,
            accumulator,
            started_at: Utc::now(),
            is_recording: AtomicBool::new(false),
            source: Mutex::new(None),
            segmenter_task: Mutex::new(None),
            coordinator_task: Mutex::new(None),
            counters: PipelineCounters::default(),
        }
    }

    /// Acquire the device and start the pipeline. On failure no
    /// session state is left behind.
    pub async fn start(&self, mut source: Box<dyn CaptureSource>) -> Result<(), DeviceError> {
        if self.is_recording.swap(true, Ordering::SeqCst) {
            warn!("recording already started");
            return Ok(());
        }

        info!("starting recording session: {}", self.config.session_id);

        let frame_rx = match source.start().await {
            Ok(rx) => rx,
            Err(e) => {
                self.is_recording.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        self.accumulator.reset();

        let segmenter = Segmenter::new(SegmenterConfig {
            segment_duration: self.config.segment_duration,
            target_sample_rate: self.config.sample_rate,
            target_channels: self.config.channels,
        });

        let (segment_tx, segment_rx) = tokio::sync::mpsc::channel(self.config.queue_capacity);

        let segmenter_task = tokio::spawn(segmenter.run(frame_rx, segment_tx));

        let coordinator = PipelineCoordinator::new(
            Arc::clone(&self.engine),
            self.accumulator.clone(),
            self.config.max_in_flight,
            self.counters.clone(),
        );
        let coordinator_task = tokio::spawn(coordinator.run(segment_rx));

        *self.source.lock().await = Some(source);
        *self.segmenter_task.lock().await = Some(segmenter_task);
        *self.coordinator_task.lock().await = Some(coordinator_task);

        info!("recording session started");

        Ok(())
    }

    /// Stop recording. Idempotent.
    ///
    /// Capture stops first (no new segments; the trailing partial
    /// segment flushes), then in-flight transcriptions get one drain
    /// timeout before anything still pending is discarded. Once this
    /// returns, the transcript no longer changes.
    pub async fn stop(&self) -> SessionStats {
        if !self.is_recording.swap(false, Ordering::SeqCst) {
            warn!("recording not active");
            return self.stats();
        }

        info!("stopping recording session: {}", self.config.session_id);

        // Release the device; the frame channel closes behind it.
        if let Some(mut source) = self.source.lock().await.take() {
            if let Err(e) = source.stop().await {
                error!("failed to stop capture source: {}", e);
            }
        }

        let deadline = Instant::now() + self.config.drain_timeout_or_default();

        // The segmenter ends once the frame channel closes, unless the
        // segment queue is wedged behind a stalled engine.
        if let Some(mut task) = self.segmenter_task.lock().await.take() {
            match timeout_at(deadline, &mut task).await {
                Ok(Ok(emitted)) => info!("segmenter flushed, {} segments emitted", emitted),
                Ok(Err(e)) => error!("segmenter task panicked: {}", e),
                Err(_) => {
                    warn!("segmenter did not flush in time, discarding queued segments");
                    task.abort();
                }
            }
        }

        // Drain the coordinator; whatever has not resolved by the
        // deadline is discarded, even if it would complete later.
        if let Some(mut task) = self.coordinator_task.lock().await.take() {
            match timeout_at(deadline, &mut task).await {
                Ok(Ok(())) => info!("pipeline drained"),
                Ok(Err(e)) => error!("coordinator task panicked: {}", e),
                Err(_) => {
                    warn!("drain timeout elapsed, discarding pending transcriptions");
                    task.abort();
                }
            }
        }

        info!("recording session stopped");

        self.stats()
    }

    pub fn is_active(&self) -> bool {
        self.is_recording.load(Ordering::SeqCst)
    }

    /// Current session statistics
    pub fn stats(&self) -> SessionStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        SessionStats {
            is_recording: self.is_recording.load(Ordering::SeqCst),
            session_id: self.config.session_id.clone(),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            segments_dispatched: self.counters.dispatched.load(Ordering::SeqCst),
            segments_transcribed: self.counters.transcribed.load(Ordering::SeqCst),
            segments_failed: self.counters.failed.load(Ordering::SeqCst),
            transcript_len: self.accumulator.current().len(),
        }
    }

    /// Accumulated transcript
    pub fn transcript(&self) -> String {
        self.accumulator.current()
    }
}
