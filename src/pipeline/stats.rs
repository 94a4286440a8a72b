use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Whether recording is currently active
    pub is_recording: bool,

    /// Session identifier
    pub session_id: String,

    /// When the session started
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Segments handed to the engine so far
    pub segments_dispatched: usize,

    /// Segments that resolved with text
    pub segments_transcribed: usize,

    /// Segments that terminally failed (no text, ordering released)
    pub segments_failed: usize,

    /// Length of the accumulated transcript in bytes
    pub transcript_len: usize,
}
