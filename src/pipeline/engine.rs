//! Hype engine - shared state behind the ingestion and broadcast tasks
//!
//! ```text
//! RawFragment
//!     ↓
//! HypeEngine::process_fragment()   (resolve, build one record per ticker)
//!     ↓
//! EngineState { HypeAggregator, PendingBatch }   (one lock)
//!     ↓
//! HypeEngine::broadcast_tick()     (snapshot + stats + drain, then select)
//!     ↓
//! BroadcastPayload
//! ```
//!
//! Every public operation takes the state lock once and never holds it
//! across an `.await`, so either task can be cancelled between operations
//! without leaving a partially applied fragment behind.

use super::batch::PendingBatch;
use crate::broadcast::{BroadcastPayload, PayloadKind};
use crate::config::HypeConfig;
use crate::error::{LexiconError, MentionError};
use crate::hype::{
    AggregatorSettings, GlobalStats, HypeAggregator, HypeSnapshot, MAX_CLOCK_SKEW_SECS,
};
use crate::lexicon::LexiconStore;
use crate::mention::{FeaturedMention, MentionRecord, RawFragment};
use crate::resolver::TickerResolver;
use crate::selector::{FeaturedSelector, SelectionPolicy};
use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

struct EngineState {
    aggregator: HypeAggregator,
    pending: PendingBatch,
}

/// Summary of one broadcast tick, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub batch_size: usize,
    pub dropped: u64,
}

pub struct HypeEngine {
    resolver: TickerResolver,
    selector: FeaturedSelector,
    top_n: usize,
    state: Mutex<EngineState>,
}

impl HypeEngine {
    pub fn new(
        resolver: TickerResolver,
        aggregator: HypeAggregator,
        selector: FeaturedSelector,
        pending_capacity: usize,
        top_n: usize,
    ) -> Self {
        Self {
            resolver,
            selector,
            top_n,
            state: Mutex::new(EngineState {
                aggregator,
                pending: PendingBatch::new(pending_capacity),
            }),
        }
    }

    /// Build the engine for a runtime, on the system clock
    pub fn from_config(
        config: &HypeConfig,
        lexicon: Arc<LexiconStore>,
    ) -> Result<Self, LexiconError> {
        let resolver = TickerResolver::new(lexicon)?;
        let aggregator = HypeAggregator::new(AggregatorSettings::from(config));
        Ok(Self::new(
            resolver,
            aggregator,
            FeaturedSelector::new(config.selection_policy),
            config.pending_batch_capacity,
            config.top_n,
        ))
    }

    pub fn selection_policy(&self) -> SelectionPolicy {
        self.selector.policy()
    }

    /// Resolve a fragment and record one mention per distinct ticker
    ///
    /// Returns the number of mentions recorded. A fragment with no tickers
    /// is not an error. Out-of-range sentiment, or a timestamp further
    /// ahead of the engine clock than `MAX_CLOCK_SKEW_SECS`, rejects the
    /// whole fragment before anything is recorded.
    pub fn process_fragment(&self, fragment: &RawFragment) -> Result<usize, MentionError> {
        let tickers = self.resolver.resolve(&fragment.text);
        if tickers.is_empty() {
            return Ok(0);
        }
        if !(-1.0..=1.0).contains(&fragment.sentiment) {
            return Err(MentionError::SentimentOutOfRange(fragment.sentiment));
        }

        let mut state = self.state.lock();
        let now = state.aggregator.now();
        let timestamp = fragment.timestamp.unwrap_or(now);
        check_not_future(timestamp, now)?;

        let records = tickers
            .into_iter()
            .map(|ticker| {
                MentionRecord::new(ticker, fragment.content_kind, fragment.sentiment, timestamp)
                    .map(|r| r.with_engagement(fragment.engagement_score()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = records.len();
        for record in records {
            state
                .pending
                .push(FeaturedMention::from_fragment(record.clone(), fragment));
            state.aggregator.add_mention(record);
        }
        Ok(count)
    }

    /// Record an already-resolved mention
    pub fn record_mention(&self, mention: FeaturedMention) -> Result<(), MentionError> {
        let mut state = self.state.lock();
        check_not_future(mention.record.timestamp(), state.aggregator.now())?;
        state.aggregator.add_mention(mention.record.clone());
        state.pending.push(mention);
        Ok(())
    }

    /// One broadcast tick: rank, count, drain the batch and feature one mention
    ///
    /// The ranking, stats and drained batch come from a single lock
    /// acquisition; selection runs after the lock is released.
    pub fn broadcast_tick(&self) -> (BroadcastPayload, TickReport) {
        let (snapshots, stats, batch, dropped, now) = {
            let mut state = self.state.lock();
            let now = state.aggregator.now();
            let snapshots = state.aggregator.snapshot_at(now, self.top_n);
            let stats = state.aggregator.global_stats_at(now);
            let batch = state.pending.drain();
            let dropped = state.pending.take_dropped();
            (snapshots, stats, batch, dropped, now)
        };

        let top_tickers: HashSet<String> = snapshots.iter().map(|s| s.ticker.clone()).collect();
        let featured = self.selector.select_featured(&batch, &top_tickers);

        let payload = BroadcastPayload::new(PayloadKind::Update, &snapshots, stats, featured, now);
        let report = TickReport {
            batch_size: batch.len(),
            dropped,
        };
        (payload, report)
    }

    /// Full current state for a newly attached listener
    ///
    /// Leaves the pending batch untouched.
    pub fn current_view(&self) -> BroadcastPayload {
        let state = self.state.lock();
        let now = state.aggregator.now();
        let snapshots = state.aggregator.snapshot_at(now, self.top_n);
        let stats = state.aggregator.global_stats_at(now);
        BroadcastPayload::new(PayloadKind::Init, &snapshots, stats, None, now)
    }

    /// On-demand ranking, no tick required
    pub fn snapshot(&self) -> Vec<HypeSnapshot> {
        self.state.lock().aggregator.snapshot(self.top_n)
    }

    pub fn score_ticker(&self, ticker: &str) -> Option<HypeSnapshot> {
        self.state.lock().aggregator.score_ticker(ticker)
    }

    pub fn global_stats(&self) -> GlobalStats {
        self.state.lock().aggregator.global_stats()
    }

    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    pub fn window_len(&self) -> usize {
        self.state.lock().aggregator.len()
    }
}

/// Reject timestamps more than `MAX_CLOCK_SKEW_SECS` ahead of `now`
fn check_not_future(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), MentionError> {
    let limit = now
        .checked_add_signed(Duration::seconds(MAX_CLOCK_SKEW_SECS))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    if timestamp > limit {
        return Err(MentionError::FutureTimestamp { timestamp, now });
    }
    Ok(())
}
