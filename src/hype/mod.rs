//! Hype aggregation - exponentially decayed popularity per ticker
//!
//! ## Architecture
//!
//! ```text
//! MentionRecord
//!     ↓
//! HypeAggregator::add_mention()   (live window, periodic prune)
//!     ↓
//! HypeAggregator::snapshot()      (recomputed from the window every call)
//!     ↓
//! Vec<HypeSnapshot> ranked by hype, ties by ticker
//! ```
//!
//! The record window is the only state. Per-ticker aggregates are rebuilt
//! from it on every query and discarded afterwards, so decay is always
//! evaluated against the query instant.

pub mod aggregator;
pub mod decay;
pub mod snapshot;

pub use aggregator::{AggregatorSettings, HypeAggregator};
pub use decay::DecayModel;
pub use snapshot::{GlobalStats, HypeSnapshot, TickerAccumulator};

/// Trailing window used for velocity, in minutes
pub const VELOCITY_WINDOW_MINUTES: i64 = 5;

/// How far ahead of the aggregator clock a mention may be stamped
pub const MAX_CLOCK_SKEW_SECS: i64 = 5;
