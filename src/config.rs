use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub engine: EngineConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub segment_duration_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    pub nats_url: String,
    pub subject: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    pub max_in_flight: usize,
    pub queue_capacity: usize,
    /// Defaults to one segment duration when unset.
    pub drain_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
