use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier
    pub session_id: String,

    /// Duration of each audio segment
    /// Default: 5 seconds
    pub segment_duration: Duration,

    /// Sample rate segments are normalized to (speech models expect 16kHz)
    pub sample_rate: u32,

    /// Number of audio channels captured (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Maximum concurrent inference calls
    pub max_in_flight: usize,

    /// Segment queue capacity between segmenter and coordinator;
    /// a full queue back-pressures segment emission, not capture
    pub queue_capacity: usize,

    /// How long stop() waits for in-flight transcriptions before
    /// discarding them. Defaults to one segment duration when unset.
    pub drain_timeout: Option<Duration>,
}

impl SessionConfig {
    pub fn drain_timeout_or_default(&self) -> Duration {
        self.drain_timeout.unwrap_or(self.segment_duration)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("session-{}", uuid::Uuid::new_v4()),
            segment_duration: Duration::from_secs(5),
            sample_rate: 16000,
            channels: 1,
            max_in_flight: 3,
            queue_capacity: 8,
            drain_timeout: None,
        }
    }
}
