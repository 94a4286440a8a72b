//! Transcript accumulation
//!
//! The transcript is the one value written by the pipeline and read by
//! the presentation layer. It lives inside a `watch` channel: appends
//! run under the channel's lock (readers never observe a partially
//! written fragment) and every append notifies subscribers, so the
//! channel doubles as the read-only update stream.

use std::sync::Arc;

use tokio::sync::watch;

/// Monotonically growing transcript shared between the pipeline and
/// its readers. Cheap to clone.
#[derive(Clone)]
pub struct TranscriptAccumulator {
    updates: Arc<watch::Sender<String>>,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(String::new());
        Self {
            updates: Arc::new(tx),
        }
    }

    /// Append a fragment, separated from the previous content by a
    /// single space. An empty fragment leaves the text untouched but
    /// still publishes an update tick, keeping notification order
    /// aligned with sequence order.
    pub fn append(&self, fragment: &str) {
        self.updates.send_modify(|text| {
            if !fragment.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(fragment);
            }
        });
    }

    /// The transcript as of now
    pub fn current(&self) -> String {
        self.updates.borrow().clone()
    }

    /// Clear the transcript; called when a new session starts
    pub fn reset(&self) {
        self.updates.send_modify(|text| text.clear());
    }

    /// Read-only stream of transcript updates: the full text after
    /// each append.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.updates.subscribe()
    }
}

impl Default for TranscriptAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
