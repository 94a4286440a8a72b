use std::time::Duration;

use async_nats::{Client, RequestErrorKind};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::TranscriptionEngine;
use crate::audio::AudioSegment;
use crate::error::EngineError;

/// Segment transcription request sent to the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeRequest {
    pub sequence: u64,
    pub pcm: String, // Base64-encoded PCM bytes
    pub sample_rate: u32,
    pub channels: u16,
    pub timestamp: String, // RFC3339 timestamp
}

/// Reply from the STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscribeReply {
    pub text: String,
    pub confidence: Option<f32>,
}

/// NATS-backed transcription engine.
///
/// One request/reply round trip per segment. A missing responder means
/// the STT service has not come up yet, which is `NotReady`: terminal
/// for that segment, never retried.
pub struct NatsEngine {
    client: Client,
    subject: String,
    request_timeout: Duration,
}

impl NatsEngine {
    pub async fn connect(
        url: &str,
        subject: String,
        request_timeout: Duration,
    ) -> Result<Self, EngineError> {
        info!("connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .map_err(|e| EngineError::InitializationFailed(e.to_string()))?;

        info!("connected to NATS, requests go to {}", subject);

        Ok(Self {
            client,
            subject,
            request_timeout,
        })
    }
}

#[async_trait::async_trait]
impl TranscriptionEngine for NatsEngine {
    async fn transcribe(&self, segment: &AudioSegment) -> Result<String, EngineError> {
        let request = TranscribeRequest {
            sequence: segment.sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(segment.pcm_bytes()),
            sample_rate: segment.sample_rate,
            channels: segment.channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload =
            serde_json::to_vec(&request).map_err(|e| EngineError::InferenceFailed(e.to_string()))?;

        let response = tokio::time::timeout(
            self.request_timeout,
            self.client.request(self.subject.clone(), payload.into()),
        )
        .await
        .map_err(|_| EngineError::InferenceFailed("request timed out".to_string()))?
        .map_err(map_request_error)?;

        let reply: TranscribeReply = serde_json::from_slice(&response.payload)
            .map_err(|e| EngineError::InferenceFailed(format!("malformed reply: {}", e)))?;

        debug!(
            "segment {} transcribed: {} chars (confidence {:?})",
            segment.sequence,
            reply.text.len(),
            reply.confidence
        );

        Ok(reply.text)
    }

    fn name(&self) -> &str {
        "nats"
    }
}

fn map_request_error(e: async_nats::RequestError) -> EngineError {
    match e.kind() {
        RequestErrorKind::NoResponders => EngineError::NotReady,
        RequestErrorKind::TimedOut => EngineError::InferenceFailed("request timed out".to_string()),
        RequestErrorKind::Other => EngineError::InferenceFailed(e.to_string()),
    }
}
