//! Per-ticker accumulation and the snapshot types it produces

use serde::Serialize;

/// Ranked hype figures for one ticker at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HypeSnapshot {
    pub ticker: String,
    /// Sum of decayed weights
    pub hype: f64,
    pub mention_count: usize,
    pub avg_sentiment: f64,
    /// Mentions per minute over the trailing velocity window
    pub velocity: f64,
}

/// Counts over the live window, independent of decay
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalStats {
    pub total_mentions: usize,
    pub unique_tickers: usize,
    #[serde(rename = "mentions_last_5min")]
    pub mentions_last_5_min: usize,
    pub mentions_last_hour: usize,
    pub velocity: f64,
}

/// Running totals for one ticker, built and dropped within a single query
#[derive(Debug, Clone, Default)]
pub struct TickerAccumulator {
    pub total_weight: f64,
    pub sentiment_sum: f64,
    pub count: usize,
    pub recent_count: usize,
}

impl TickerAccumulator {
    pub fn add(&mut self, weight: f64, sentiment: f64, recent: bool) {
        self.total_weight += weight;
        self.sentiment_sum += sentiment;
        self.count += 1;
        if recent {
            self.recent_count += 1;
        }
    }

    /// `None` when nothing was accumulated
    pub fn finish(self, ticker: &str, velocity_window_minutes: f64) -> Option<HypeSnapshot> {
        if self.count == 0 {
            return None;
        }
        Some(HypeSnapshot {
            ticker: ticker.to_string(),
            hype: self.total_weight,
            mention_count: self.count,
            avg_sentiment: self.sentiment_sum / self.count as f64,
            velocity: self.recent_count as f64 / velocity_window_minutes,
        })
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
