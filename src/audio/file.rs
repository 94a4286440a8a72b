use std::path::{Path, PathBuf};

use hound::WavReader;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::source::{AudioFrame, CaptureSource};
use crate::error::DeviceError;

/// Frame length used when replaying a file, matching the cadence of a
/// live device.
const FRAME_MS: u64 = 100;

/// WAV-file-backed capture source.
///
/// Replays a recording as a stream of frames; the frame channel closes
/// at end of file, so a session over a file drains on its own. Used
/// for batch transcription and tests.
pub struct WavFileSource {
    path: PathBuf,
    /// Pace frames to wall clock instead of emitting as fast as the
    /// consumer accepts them.
    paced: bool,
    task: Option<JoinHandle<()>>,
    capturing: bool,
}

impl WavFileSource {
    pub fn new(path: impl AsRef<Path>, paced: bool) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            paced,
            task: None,
            capturing: false,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSource for WavFileSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, DeviceError> {
        if self.capturing {
            return Err(DeviceError::Unavailable("already capturing".to_string()));
        }

        let reader = WavReader::open(&self.path)
            .map_err(|e| DeviceError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DeviceError::Unavailable(format!("{}: {}", self.path.display(), e)))?;

        let duration_seconds =
            samples.len() as f64 / (f64::from(spec.sample_rate) * f64::from(spec.channels));

        info!(
            "replaying {}: {:.1}s, {}Hz, {} channels",
            self.path.display(),
            duration_seconds,
            spec.sample_rate,
            spec.channels
        );

        let (tx, rx) = mpsc::channel(64);
        let paced = self.paced;
        let sample_rate = spec.sample_rate;
        let channels = spec.channels;

        let task = tokio::spawn(async move {
            let samples_per_frame =
                (u64::from(sample_rate) * u64::from(channels) * FRAME_MS / 1000) as usize;

            for (i, chunk) in samples.chunks(samples_per_frame.max(1)).enumerate() {
                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate,
                    channels,
                    timestamp_ms: i as u64 * FRAME_MS,
                };

                if tx.send(frame).await.is_err() {
                    break;
                }

                if paced {
                    tokio::time::sleep(std::time::Duration::from_millis(FRAME_MS)).await;
                }
            }
        });

        self.task = Some(task);
        self.capturing = true;

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), DeviceError> {
        if !self.capturing {
            return Ok(());
        }

        if let Some(task) = self.task.take() {
            task.abort();
        }

        self.capturing = false;

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "wav file"
    }
}
