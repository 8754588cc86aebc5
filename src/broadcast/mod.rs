//! Broadcast layer - pushes heatmap payloads to listeners
//!
//! ```text
//! HypeEngine::broadcast_tick() → BroadcastPayload
//!     ↓
//! Broadcaster::publish()  (one task per listener, bounded by a timeout)
//!     ↓
//! JsonlSink | LogSink | WebhookSink
//! ```
//!
//! A failing or slow listener only affects its own delivery.

pub mod broadcaster;
pub mod jsonl_sink;
pub mod payload;
pub mod sink;
pub mod webhook_sink;

pub use broadcaster::Broadcaster;
pub use jsonl_sink::JsonlSink;
pub use payload::{BroadcastPayload, HeatmapEntry, LatestMention, PayloadKind};
pub use sink::{BroadcastSink, LogSink};
pub use webhook_sink::WebhookSink;
