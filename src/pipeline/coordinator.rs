use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tracing::{info, warn};

use super::reorder::ReorderBuffer;
use crate::audio::AudioSegment;
use crate::engine::TranscriptionEngine;
use crate::error::EngineError;
use crate::transcript::TranscriptAccumulator;

/// Shared progress counters, read by the session for stats
#[derive(Clone, Default)]
pub(crate) struct PipelineCounters {
    pub dispatched: Arc<AtomicUsize>,
    pub transcribed: Arc<AtomicUsize>,
    pub failed: Arc<AtomicUsize>,
}

type InFlight = BoxFuture<'static, (u64, Result<Result<String, EngineError>, JoinError>)>;

/// Orchestrates segments into engine calls and delivers results to the
/// accumulator in emission order.
///
/// A new segment is accepted only while the in-flight set is below the
/// cap; beyond that, segments wait in the bounded queue. Completions
/// feed the reorder buffer, and every contiguously-resolved fragment is
/// appended. Per-segment failures are logged and resolved with no text;
/// they never end the session.
pub struct PipelineCoordinator {
    engine: Arc<dyn TranscriptionEngine>,
    accumulator: TranscriptAccumulator,
    max_in_flight: usize,
    counters: PipelineCounters,
}

impl PipelineCoordinator {
    pub(crate) fn new(
        engine: Arc<dyn TranscriptionEngine>,
        accumulator: TranscriptAccumulator,
        max_in_flight: usize,
        counters: PipelineCounters,
    ) -> Self {
        Self {
            engine,
            accumulator,
            max_in_flight: max_in_flight.max(1),
            counters,
        }
    }

    /// Consume segments until the channel closes and every in-flight
    /// transcription has resolved.
    pub async fn run(self, mut segment_rx: mpsc::Receiver<AudioSegment>) {
        let mut reorder = ReorderBuffer::new();
        let mut in_flight: FuturesUnordered<InFlight> = FuturesUnordered::new();
        let mut input_open = true;

        loop {
            tokio::select! {
                maybe_segment = segment_rx.recv(),
                    if input_open && in_flight.len() < self.max_in_flight =>
                {
                    match maybe_segment {
                        Some(segment) => in_flight.push(self.dispatch(segment)),
                        None => input_open = false,
                    }
                }
                Some((seq, joined)) = in_flight.next() => {
                    let outcome = match joined {
                        Ok(result) => result,
                        Err(e) => Err(EngineError::InferenceFailed(format!(
                            "inference task failed: {}",
                            e
                        ))),
                    };
                    self.deliver(&mut reorder, seq, outcome);
                }
                else => break,
            }
        }

        info!(
            "pipeline drained: {} dispatched, {} transcribed, {} failed",
            self.counters.dispatched.load(Ordering::SeqCst),
            self.counters.transcribed.load(Ordering::SeqCst),
            self.counters.failed.load(Ordering::SeqCst),
        );
    }

    /// Start the engine call for one segment. The segment moves into
    /// the spawned task and is dropped when the call resolves.
    fn dispatch(&self, segment: AudioSegment) -> InFlight {
        self.counters.dispatched.fetch_add(1, Ordering::SeqCst);

        let seq = segment.sequence;
        let engine = Arc::clone(&self.engine);
        let task = tokio::spawn(async move { engine.transcribe(&segment).await });

        async move { (seq, task.await) }.boxed()
    }

    /// Record one completion and append every fragment the reorder
    /// buffer releases.
    fn deliver(
        &self,
        reorder: &mut ReorderBuffer,
        seq: u64,
        outcome: Result<String, EngineError>,
    ) {
        let fragment = match outcome {
            Ok(text) => {
                self.counters.transcribed.fetch_add(1, Ordering::SeqCst);
                text
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::SeqCst);
                warn!("segment {} failed, continuing without it: {}", seq, e);
                String::new()
            }
        };

        for ready in reorder.complete(seq, fragment) {
            self.accumulator.append(&ready);
        }
    }
}
