pub mod file;
pub mod microphone;
pub mod segmenter;
pub mod source;

pub use file::WavFileSource;
pub use microphone::MicrophoneSource;
pub use segmenter::{AudioSegment, Segmenter, SegmenterConfig};
pub use source::{AudioFrame, CaptureSource, SourceConfig, SourceFactory};
