//! Listener trait for broadcast payloads

use super::payload::BroadcastPayload;
use crate::error::SinkError;
use async_trait::async_trait;

/// A destination for broadcast payloads
///
/// Implementations must not assume they are called in order or one at a
/// time: every tick delivers to each sink from its own task.
#[async_trait]
pub trait BroadcastSink: Send + Sync {
    async fn deliver(&self, payload: &BroadcastPayload) -> Result<(), SinkError>;

    /// Sink name for logging
    fn name(&self) -> &str;
}

/// Logs a one-line summary of every payload
pub struct LogSink {
    top: usize,
}

impl LogSink {
    pub fn new(top: usize) -> Self {
        Self { top }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(5)
    }
}

#[async_trait]
impl BroadcastSink for LogSink {
    async fn deliver(&self, payload: &BroadcastPayload) -> Result<(), SinkError> {
        let leaders: Vec<String> = payload
            .data
            .heatmap
            .iter()
            .take(self.top)
            .map(|e| format!("{}={:.2}", e.ticker, e.hype))
            .collect();

        log::info!(
            "🔥 Heatmap [{}] | {} mentions ({:.2}/min) | featured: {}",
            leaders.join(" "),
            payload.data.stats.total_mentions,
            payload.data.stats.velocity,
            payload.featured_ticker().unwrap_or("-")
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
