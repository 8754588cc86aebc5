//! Dashboard payload shape
//!
//! ```json
//! {"type": "update",
//!  "data": {"heatmap": [...], "stats": {...}, "latest": null},
//!  "timestamp": "2024-03-01T12:00:00Z"}
//! ```

use crate::hype::snapshot::round_to;
use crate::hype::{GlobalStats, HypeSnapshot};
use crate::mention::{ContentKind, FeaturedMention, SentimentLabel};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    /// Full state for a newly attached listener
    Init,
    /// Periodic tick
    Update,
}

/// One heatmap cell, rounded for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapEntry {
    pub ticker: String,
    pub hype: f64,
    pub sentiment: f64,
    pub label: SentimentLabel,
    pub mentions: usize,
    pub velocity: f64,
}

impl From<&HypeSnapshot> for HeatmapEntry {
    fn from(snapshot: &HypeSnapshot) -> Self {
        Self {
            ticker: snapshot.ticker.clone(),
            hype: round_to(snapshot.hype, 2),
            sentiment: round_to(snapshot.avg_sentiment, 3),
            label: SentimentLabel::from_compound(snapshot.avg_sentiment),
            mentions: snapshot.mention_count,
            velocity: round_to(snapshot.velocity, 2),
        }
    }
}

/// The mention featured in the live feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestMention {
    pub ticker: String,
    pub content: String,
    pub sentiment: f64,
    pub source: String,
    pub author: String,
    pub content_type: ContentKind,
    pub timestamp: DateTime<Utc>,
    pub score: u64,
    pub permalink: String,
}

impl From<&FeaturedMention> for LatestMention {
    fn from(mention: &FeaturedMention) -> Self {
        Self {
            ticker: mention.ticker().to_string(),
            content: mention.content.clone(),
            sentiment: mention.record.sentiment(),
            source: mention.source.clone(),
            author: mention.author.clone(),
            content_type: mention.record.content_kind(),
            timestamp: mention.record.timestamp(),
            score: mention.engagement_score(),
            permalink: mention.permalink.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadData {
    pub heatmap: Vec<HeatmapEntry>,
    pub stats: GlobalStats,
    /// `null` when nothing is featured
    pub latest: Option<LatestMention>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BroadcastPayload {
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    pub data: PayloadData,
    pub timestamp: DateTime<Utc>,
}

impl BroadcastPayload {
    pub fn new(
        kind: PayloadKind,
        snapshots: &[HypeSnapshot],
        stats: GlobalStats,
        featured: Option<&FeaturedMention>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let stats = GlobalStats {
            velocity: round_to(stats.velocity, 2),
            ..stats
        };
        Self {
            kind,
            data: PayloadData {
                heatmap: snapshots.iter().map(HeatmapEntry::from).collect(),
                stats,
                latest: featured.map(LatestMention::from),
            },
            timestamp,
        }
    }

    pub fn featured_ticker(&self) -> Option<&str> {
        self.data.latest.as_ref().map(|m| m.ticker.as_str())
    }
}
