use thiserror::Error;

/// Errors opening or operating the audio input device.
///
/// Permission denial is distinguished from a missing/busy device so the
/// control surface can tell the user which one to fix.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// The OS refused microphone access for this process.
    #[error("microphone access denied")]
    PermissionDenied,

    /// No usable input device, or the device could not be opened.
    #[error("audio input device unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the transcription engine, scoped to a single segment.
///
/// None of these abort a session; the affected segment resolves with no
/// text so later segments are not blocked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// No engine is listening yet (e.g. the STT service has not come up).
    /// Terminal for the submitted segment, not retryable.
    #[error("transcription engine not ready")]
    NotReady,

    /// The engine could not be initialized at all.
    #[error("transcription engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Inference failed for this segment.
    #[error("inference failed: {0}")]
    InferenceFailed(String),
}

/// Errors starting a recording session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A session is already running; the existing session is untouched.
    #[error("a recording session is already active")]
    AlreadyActive,

    /// The input device could not be opened.
    #[error(transparent)]
    Device(#[from] DeviceError),
}
