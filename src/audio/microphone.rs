// Live microphone capture via cpal.
//
// cpal streams are not Send, so the stream lives on a dedicated thread
// for the whole capture; the device-open outcome is reported back
// through a oneshot before start() returns. The audio callback never
// blocks: frames are forwarded with try_send and dropped (counted) if
// the consumer backlog is full.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

use super::source::{AudioFrame, CaptureSource, SourceConfig};
use crate::error::DeviceError;

pub struct MicrophoneSource {
    config: SourceConfig,
    stop_tx: Option<std::sync::mpsc::Sender<()>>,
    thread: Option<std::thread::JoinHandle<()>>,
    capturing: bool,
}

impl MicrophoneSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            stop_tx: None,
            thread: None,
            capturing: false,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSource for MicrophoneSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>, DeviceError> {
        if self.capturing {
            return Err(DeviceError::Unavailable("already capturing".to_string()));
        }

        let (frame_tx, frame_rx) = mpsc::channel(self.config.frame_queue_capacity);
        let (ready_tx, ready_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel();

        let thread = std::thread::spawn(move || capture_thread(frame_tx, ready_tx, stop_rx));

        match ready_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => {
                return Err(DeviceError::Unavailable(
                    "capture thread exited before opening the device".to_string(),
                ))
            }
        }

        self.stop_tx = Some(stop_tx);
        self.thread = Some(thread);
        self.capturing = true;

        info!("microphone capture started");

        Ok(frame_rx)
    }

    async fn stop(&mut self) -> Result<(), DeviceError> {
        if !self.capturing {
            return Ok(());
        }

        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }

        self.capturing = false;

        info!("microphone capture stopped");

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "microphone (cpal)"
    }
}

impl Drop for MicrophoneSource {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }
}

/// Forwards callback buffers as AudioFrames without blocking the
/// device thread. Timestamps derive from the running sample count.
struct FrameForwarder {
    tx: mpsc::Sender<AudioFrame>,
    sample_rate: u32,
    channels: u16,
    samples_seen: u64,
    frames_dropped: u64,
}

impl FrameForwarder {
    fn push(&mut self, samples: Vec<i16>) {
        let timestamp_ms =
            self.samples_seen * 1000 / (u64::from(self.sample_rate) * u64::from(self.channels));
        self.samples_seen += samples.len() as u64;

        let frame = AudioFrame {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
            timestamp_ms,
        };

        if self.tx.try_send(frame).is_err() {
            self.frames_dropped += 1;
            if self.frames_dropped == 1 || self.frames_dropped % 100 == 0 {
                warn!("frame queue full, {} frames dropped", self.frames_dropped);
            }
        }
    }
}

fn capture_thread(
    frame_tx: mpsc::Sender<AudioFrame>,
    ready_tx: oneshot::Sender<Result<(), DeviceError>>,
    stop_rx: std::sync::mpsc::Receiver<()>,
) {
    let stream = match open_input_stream(frame_tx) {
        Ok(stream) => {
            let _ = ready_tx.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    // Park until stop() signals or the source is dropped; the stream
    // (and with it the OS capture indicator) is released on return.
    let _ = stop_rx.recv();
    drop(stream);
}

fn open_input_stream(frame_tx: mpsc::Sender<AudioFrame>) -> Result<cpal::Stream, DeviceError> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| DeviceError::Unavailable("no default input device".to_string()))?;

    info!(
        "input device: {}",
        device.name().unwrap_or_else(|_| "unknown".to_string())
    );

    let supported = device
        .default_input_config()
        .map_err(map_default_config_error)?;
    let sample_format = supported.sample_format();
    let stream_config: cpal::StreamConfig = supported.into();

    let mut forwarder = FrameForwarder {
        tx: frame_tx,
        sample_rate: stream_config.sample_rate.0,
        channels: stream_config.channels,
        samples_seen: 0,
        frames_dropped: 0,
    };

    let err_fn = |err| warn!("input stream error: {}", err);

    let stream = match sample_format {
        SampleFormat::F32 => device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &_| {
                forwarder.push(data.iter().map(|&s| f32_to_i16(s)).collect());
            },
            err_fn,
            None,
        ),
        SampleFormat::I16 => device.build_input_stream(
            &stream_config,
            move |data: &[i16], _: &_| {
                forwarder.push(data.to_vec());
            },
            err_fn,
            None,
        ),
        SampleFormat::U16 => device.build_input_stream(
            &stream_config,
            move |data: &[u16], _: &_| {
                forwarder.push(data.iter().map(|&s| u16_to_i16(s)).collect());
            },
            err_fn,
            None,
        ),
        other => {
            return Err(DeviceError::Unavailable(format!(
                "unsupported sample format {:?}",
                other
            )))
        }
    }
    .map_err(map_build_stream_error)?;

    stream
        .play()
        .map_err(|e| DeviceError::Unavailable(e.to_string()))?;

    Ok(stream)
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0) as i16
}

fn u16_to_i16(sample: u16) -> i16 {
    (i32::from(sample) - 32768) as i16
}

fn map_default_config_error(e: cpal::DefaultStreamConfigError) -> DeviceError {
    match e {
        cpal::DefaultStreamConfigError::DeviceNotAvailable => {
            DeviceError::Unavailable("device not available".to_string())
        }
        cpal::DefaultStreamConfigError::StreamTypeNotSupported => {
            DeviceError::Unavailable("input stream type not supported".to_string())
        }
        cpal::DefaultStreamConfigError::BackendSpecific { err } => {
            classify_backend_error(err.description)
        }
    }
}

fn map_build_stream_error(e: cpal::BuildStreamError) -> DeviceError {
    match e {
        cpal::BuildStreamError::DeviceNotAvailable => {
            DeviceError::Unavailable("device not available".to_string())
        }
        cpal::BuildStreamError::BackendSpecific { err } => classify_backend_error(err.description),
        other => DeviceError::Unavailable(other.to_string()),
    }
}

/// Backends report permission problems as free-form text; match the
/// usual phrasings so denial surfaces as its own error kind.
fn classify_backend_error(description: String) -> DeviceError {
    let lower = description.to_lowercase();
    if lower.contains("permission") || lower.contains("denied") || lower.contains("not permitted") {
        DeviceError::PermissionDenied
    } else {
        DeviceError::Unavailable(description)
    }
}
