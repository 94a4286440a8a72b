pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod http;
pub mod pipeline;
pub mod transcript;

pub use audio::{
    AudioFrame, AudioSegment, CaptureSource, MicrophoneSource, Segmenter, SegmenterConfig,
    SourceConfig, SourceFactory, WavFileSource,
};
pub use config::Config;
pub use engine::{NatsEngine, TranscriptionEngine};
pub use error::{DeviceError, EngineError, SessionError};
pub use http::{create_router, AppState};
pub use pipeline::{RecordingSession, ReorderBuffer, SessionConfig, SessionManager, SessionStats};
pub use transcript::TranscriptAccumulator;
