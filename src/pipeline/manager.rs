use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::info;

use super::config::SessionConfig;
use super::session::RecordingSession;
use super::stats::SessionStats;
use crate::audio::SourceFactory;
use crate::engine::TranscriptionEngine;
use crate::error::SessionError;
use crate::transcript::TranscriptAccumulator;

/// The presentation boundary: owns the single allowed active session.
///
/// `start_session` / `stop_session` are the only operations the shell
/// above invokes; reads go through `transcript` / `subscribe` /
/// `stats`. At most one session is active at a time; a second start
/// fails without disturbing the running session.
pub struct SessionManager {
    /// Template for new sessions; each start gets a fresh session id
    config: SessionConfig,

    engine: Arc<dyn TranscriptionEngine>,

    /// Produces a fresh capture source per session
    source_factory: SourceFactory,

    /// Transcript outlives individual sessions; reset on each start
    accumulator: TranscriptAccumulator,

    active: Mutex<Option<Arc<RecordingSession>>>,
}

impl SessionManager {
    pub fn new(
        config: SessionConfig,
        engine: Arc<dyn TranscriptionEngine>,
        source_factory: SourceFactory,
    ) -> Self {
        Self {
            config,
            engine,
            source_factory,
            accumulator: TranscriptAccumulator::new(),
            active: Mutex::new(None),
        }
    }

    /// Start a new recording session.
    pub async fn start_session(&self) -> Result<(), SessionError> {
        let mut active = self.active.lock().await;

        if active.as_ref().is_some_and(|s| s.is_active()) {
            return Err(SessionError::AlreadyActive);
        }

        let source = (self.source_factory)()?;

        let mut config = self.config.clone();
        config.session_id = format!("session-{}", uuid::Uuid::new_v4());

        info!("starting session {}", config.session_id);

        let session = Arc::new(RecordingSession::new(
            config,
            Arc::clone(&self.engine),
            self.accumulator.clone(),
        ));
        session.start(source).await?;

        *active = Some(session);

        Ok(())
    }

    /// Stop the active session. Idempotent; `None` when nothing was
    /// running.
    pub async fn stop_session(&self) -> Option<SessionStats> {
        let session = self.active.lock().await.take()?;
        Some(session.stop().await)
    }

    /// Whether a session is currently recording
    pub async fn is_active(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|s| s.is_active())
    }

    /// Stats for the active session, if any
    pub async fn stats(&self) -> Option<SessionStats> {
        let active = self.active.lock().await;
        active.as_ref().map(|s| s.stats())
    }

    /// The transcript as of now; survives session stop until the next
    /// start resets it
    pub fn transcript(&self) -> String {
        self.accumulator.current()
    }

    /// Read-only stream of transcript updates
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.accumulator.subscribe()
    }
}
