use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

use super::state::AppState;
use crate::error::{DeviceError, SessionError};
use crate::pipeline::SessionStats;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct StopSessionResponse {
    pub status: String,
    pub message: String,
    pub stats: Option<SessionStats>,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub transcript: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub active: bool,
    pub stats: Option<SessionStats>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /session/start
/// Start the recording session
pub async fn start_session(State(state): State<AppState>) -> impl IntoResponse {
    info!("start session requested");

    match state.manager.start_session().await {
        Ok(()) => (
            StatusCode::OK,
            Json(StartSessionResponse {
                status: "recording".to_string(),
                message: "Recording session started".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("failed to start session: {}", e);
            let status = match &e {
                SessionError::AlreadyActive => StatusCode::CONFLICT,
                SessionError::Device(DeviceError::PermissionDenied) => StatusCode::FORBIDDEN,
                SessionError::Device(DeviceError::Unavailable(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
            };
            (
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /session/stop
/// Stop the recording session; a no-op when nothing is recording
pub async fn stop_session(State(state): State<AppState>) -> impl IntoResponse {
    info!("stop session requested");

    match state.manager.stop_session().await {
        Some(stats) => (
            StatusCode::OK,
            Json(StopSessionResponse {
                status: "stopped".to_string(),
                message: "Recording session stopped".to_string(),
                stats: Some(stats),
            }),
        ),
        None => (
            StatusCode::OK,
            Json(StopSessionResponse {
                status: "idle".to_string(),
                message: "No recording session active".to_string(),
                stats: None,
            }),
        ),
    }
}

/// GET /session/transcript
/// The transcript accumulated so far
pub async fn get_transcript(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(TranscriptResponse {
            transcript: state.manager.transcript(),
        }),
    )
}

/// GET /session/status
/// Current session statistics
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let stats = state.manager.stats().await;

    (
        StatusCode::OK,
        Json(StatusResponse {
            active: stats.as_ref().is_some_and(|s| s.is_recording),
            stats,
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
