use tokio::sync::mpsc;

use crate::error::DeviceError;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for a capture source
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Target sample rate (segmenter resamples if the device differs)
    pub target_sample_rate: u32,
    /// Target channel count (1 = mono)
    pub target_channels: u16,
    /// Frame channel capacity; capture drops frames rather than block
    /// the device callback once this backlog is full
    pub frame_queue_capacity: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16000, // 16kHz for speech recognition
            target_channels: 1,        // Mono
            frame_queue_capacity: 256, // ~25s of 100ms frames
        }
    }
}

/// Live audio input abstraction
///
/// Implementations:
/// - Microphone: cpal input stream (all platforms)
/// - WAV file: replay a recording (tests/batch processing)
#[async_trait::async_trait]
pub trait CaptureSource: Send + Sync {
    /// Acquire the device and start capturing.
    ///
    /// Returns a channel receiver producing audio frames. The channel
    /// closes when capture stops.
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, DeviceError>;

    /// Release the device. Idempotent; a no-op if not capturing.
    async fn stop(&mut self) -> Result<(), DeviceError>;

    /// Whether the source is currently capturing
    fn is_capturing(&self) -> bool;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Factory producing a fresh capture source per session.
///
/// A boxed closure rather than a platform enum so sessions can be
/// started against scripted sources in tests.
pub type SourceFactory =
    Box<dyn Fn() -> Result<Box<dyn CaptureSource>, DeviceError> + Send + Sync>;
