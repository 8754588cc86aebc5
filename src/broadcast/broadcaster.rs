//! Fan-out of payloads to every registered sink

use super::payload::BroadcastPayload;
use super::sink::BroadcastSink;
use crate::error::SinkError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

pub struct Broadcaster {
    sinks: Vec<Arc<dyn BroadcastSink>>,
    sink_timeout: Duration,
}

impl Broadcaster {
    pub fn new(sink_timeout: Duration) -> Self {
        Self {
            sinks: Vec::new(),
            sink_timeout,
        }
    }

    pub fn add_sink(&mut self, sink: Arc<dyn BroadcastSink>) {
        log::info!("📡 Registered broadcast sink: {}", sink.name());
        self.sinks.push(sink);
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Deliver `payload` to every sink without waiting on any of them
    ///
    /// Each delivery runs in its own task under `sink_timeout`. Failures are
    /// logged and dropped. The handles are returned for callers that need
    /// to wait, such as tests and shutdown.
    pub fn publish(&self, payload: BroadcastPayload) -> Vec<JoinHandle<()>> {
        let payload = Arc::new(payload);

        self.sinks
            .iter()
            .map(|sink| {
                let sink = Arc::clone(sink);
                let payload = Arc::clone(&payload);
                let limit = self.sink_timeout;

                tokio::spawn(async move {
                    let result = match timeout(limit, sink.deliver(&payload)).await {
                        Ok(result) => result,
                        Err(_) => Err(SinkError::Timeout(limit.as_millis() as u64)),
                    };
                    if let Err(e) = result {
                        log::warn!("⚠️  Broadcast to {} failed: {}", sink.name(), e);
                    }
                })
            })
            .collect()
    }
}
