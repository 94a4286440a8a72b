use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use super::source::AudioFrame;

/// Segmenter configuration
#[derive(Debug, Clone)]
pub struct SegmenterConfig {
    /// Duration of each segment (default: 5 seconds)
    pub segment_duration: Duration,
    /// Sample rate segments are normalized to
    pub target_sample_rate: u32,
    /// Channel count segments are normalized to (1 = mono)
    pub target_channels: u16,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            segment_duration: Duration::from_secs(5),
            target_sample_rate: 16000,
            target_channels: 1,
        }
    }
}

/// One fixed-duration slice of captured audio.
///
/// Immutable once emitted; owned by the pipeline until its inference
/// resolves, then dropped.
#[derive(Debug, Clone)]
pub struct AudioSegment {
    /// Sequence number, monotonically increasing from 0 per session
    pub sequence: u64,
    /// Normalized i16 PCM samples
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels after normalization
    pub channels: u16,
    /// Start time in milliseconds since capture started
    pub start_ms: u64,
    /// End time in milliseconds since capture started
    pub end_ms: u64,
}

impl AudioSegment {
    /// PCM bytes (little-endian) for the engine wire
    pub fn pcm_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Accumulates frames for the segment currently being filled
struct SegmentBuilder {
    sequence: u64,
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
    start_ms: u64,
    end_ms: u64,
}

impl SegmentBuilder {
    fn new(sequence: u64, start_ms: u64, sample_rate: u32, channels: u16) -> Self {
        Self {
            sequence,
            samples: Vec::new(),
            sample_rate,
            channels,
            start_ms,
            end_ms: start_ms,
        }
    }

    fn push_frame(&mut self, frame: &AudioFrame) {
        self.samples.extend_from_slice(&frame.samples);
        self.end_ms = frame.timestamp_ms;
    }

    fn finish(self) -> AudioSegment {
        AudioSegment {
            sequence: self.sequence,
            samples: self.samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
            start_ms: self.start_ms,
            end_ms: self.end_ms,
        }
    }
}

/// Slices the continuous frame stream into sequenced fixed-duration
/// segments.
///
/// Receives frames from a capture source and emits an `AudioSegment`
/// each time the configured duration elapses. When the frame channel
/// closes (capture stopped), a non-empty partial trailing segment is
/// flushed before the segment channel closes. The segment channel is
/// bounded: a slow consumer back-pressures segment emission here, not
/// device capture.
pub struct Segmenter {
    config: SegmenterConfig,
    current: Option<SegmentBuilder>,
    next_sequence: u64,
}

impl Segmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        info!(
            "segmenter initialized: {}s segments at {}Hz",
            config.segment_duration.as_secs_f64(),
            config.target_sample_rate
        );

        Self {
            config,
            current: None,
            next_sequence: 0,
        }
    }

    /// Consume frames until the channel closes. Returns the number of
    /// segments emitted.
    pub async fn run(
        mut self,
        mut frame_rx: mpsc::Receiver<AudioFrame>,
        segment_tx: mpsc::Sender<AudioSegment>,
    ) -> u64 {
        while let Some(frame) = frame_rx.recv().await {
            let frame = normalize_frame(
                frame,
                self.config.target_sample_rate,
                self.config.target_channels,
            );

            if self.should_rotate(&frame) {
                if let Some(builder) = self.current.take() {
                    if !self.emit(builder.finish(), &segment_tx).await {
                        return self.next_sequence;
                    }
                }

                let builder = SegmentBuilder::new(
                    self.next_sequence,
                    frame.timestamp_ms,
                    self.config.target_sample_rate,
                    frame.channels,
                );
                self.next_sequence += 1;
                self.current = Some(builder);
            }

            if let Some(builder) = &mut self.current {
                builder.push_frame(&frame);
            }
        }

        // Capture stopped: flush the partial trailing segment
        if let Some(builder) = self.current.take() {
            if !builder.samples.is_empty() {
                self.emit(builder.finish(), &segment_tx).await;
            }
        }

        info!("segmenter finished: {} segments emitted", self.next_sequence);

        self.next_sequence
    }

    fn should_rotate(&self, frame: &AudioFrame) -> bool {
        match &self.current {
            None => true,
            Some(builder) => {
                let elapsed_ms = frame.timestamp_ms.saturating_sub(builder.start_ms);
                elapsed_ms >= self.config.segment_duration.as_millis() as u64
            }
        }
    }

    async fn emit(&self, segment: AudioSegment, segment_tx: &mpsc::Sender<AudioSegment>) -> bool {
        debug!(
            "segment {} complete: {:.1}s - {:.1}s ({} samples)",
            segment.sequence,
            segment.start_ms as f64 / 1000.0,
            segment.end_ms as f64 / 1000.0,
            segment.samples.len()
        );

        segment_tx.send(segment).await.is_ok()
    }
}

/// Normalize a frame to the target rate and channel count
fn normalize_frame(frame: AudioFrame, target_sample_rate: u32, target_channels: u16) -> AudioFrame {
    let mut processed = frame;

    if processed.sample_rate != target_sample_rate {
        processed = downsample_frame(processed, target_sample_rate);
    }

    if processed.channels != target_channels && target_channels == 1 {
        processed = mix_to_mono(processed);
    }

    processed
}

/// Downsample by decimation (take every Nth sample)
fn downsample_frame(frame: AudioFrame, target_rate: u32) -> AudioFrame {
    if frame.sample_rate == target_rate {
        return frame;
    }

    let ratio = frame.sample_rate / target_rate;
    if ratio <= 1 {
        return frame; // Can't upsample
    }

    let downsampled: Vec<i16> = frame
        .samples
        .iter()
        .step_by(ratio as usize)
        .copied()
        .collect();

    AudioFrame {
        samples: downsampled,
        sample_rate: target_rate,
        channels: frame.channels,
        timestamp_ms: frame.timestamp_ms,
    }
}

/// Mix interleaved channels down to mono by averaging
fn mix_to_mono(frame: AudioFrame) -> AudioFrame {
    if frame.channels <= 1 {
        return frame;
    }

    let channels = frame.channels as usize;
    let mut mono_samples = Vec::with_capacity(frame.samples.len() / channels);

    for chunk in frame.samples.chunks_exact(channels) {
        let sum: i32 = chunk.iter().map(|&s| i32::from(s)).sum();
        mono_samples.push((sum / channels as i32) as i16);
    }

    AudioFrame {
        samples: mono_samples,
        sample_rate: frame.sample_rate,
        channels: 1,
        timestamp_ms: frame.timestamp_ms,
    }
}
