//! Transcription engine seam
//!
//! The engine is an external collaborator: a stateless async function
//! from an audio segment to recognized text, with unspecified latency.
//! The pipeline only sees this trait; the NATS client below is the
//! production implementation, tests substitute scripted ones.

mod nats;

pub use nats::{NatsEngine, TranscribeReply, TranscribeRequest};

use crate::audio::AudioSegment;
use crate::error::EngineError;

#[async_trait::async_trait]
pub trait TranscriptionEngine: Send + Sync {
    /// Recognize speech in one segment. Errors are scoped to that
    /// segment and never retried.
    async fn transcribe(&self, segment: &AudioSegment) -> Result<String, EngineError>;

    /// Engine name for logging
    fn name(&self) -> &str;
}
