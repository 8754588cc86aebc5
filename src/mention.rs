//! Mention records and the raw fragments they are built from

use crate::error::MentionError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Featured-mention content is cut to this many characters
pub const MAX_CONTENT_CHARS: usize = 500;

pub const DELETED_AUTHOR: &str = "[deleted]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Post,
    Comment,
}

impl ContentKind {
    /// Decay base weight: posts are rarer and set the agenda
    pub fn base_weight(&self) -> f64 {
        match self {
            ContentKind::Post => 1.5,
            ContentKind::Comment => 1.0,
        }
    }

}

/// Human-readable bucket for a compound sentiment score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Bullish,
    Bearish,
    Neutral,
}

impl SentimentLabel {
    pub fn from_compound(score: f64) -> Self {
        if score >= 0.05 {
            SentimentLabel::Bullish
        } else if score <= -0.05 {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }
}

/// A single ticker mention, the unit the hype aggregator consumes
///
/// Immutable once built; `new` rejects out-of-range sentiment and
/// malformed symbols instead of clamping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MentionRecord {
    ticker: String,
    content_kind: ContentKind,
    sentiment: f64,
    timestamp: DateTime<Utc>,
    engagement_score: u64,
}

impl MentionRecord {
    pub fn new(
        ticker: impl Into<String>,
        content_kind: ContentKind,
        sentiment: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, MentionError> {
        let ticker = ticker.into();
        if ticker.is_empty() || !ticker.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(MentionError::InvalidTicker(ticker));
        }
        // NaN fails the range check too
        if !(-1.0..=1.0).contains(&sentiment) {
            return Err(MentionError::SentimentOutOfRange(sentiment));
        }
        Ok(Self {
            ticker,
            content_kind,
            sentiment,
            timestamp,
            engagement_score: 0,
        })
    }

    pub fn with_engagement(mut self, engagement_score: u64) -> Self {
        self.engagement_score = engagement_score;
        self
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn content_kind(&self) -> ContentKind {
        self.content_kind
    }

    pub fn sentiment(&self) -> f64 {
        self.sentiment
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn engagement_score(&self) -> u64 {
        self.engagement_score
    }
}

/// Raw text fragment as delivered by the upstream social-media client
///
/// Sentiment is pre-computed upstream. Missing timestamps default to
/// ingestion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFragment {
    pub text: String,
    pub content_kind: ContentKind,
    pub sentiment: f64,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Platform score, upvotes minus downvotes
    #[serde(default)]
    pub engagement: i64,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub permalink: String,
}

impl RawFragment {
    /// Engagement as recorded on mentions; downvoted fragments count as zero
    pub fn engagement_score(&self) -> u64 {
        self.engagement.max(0) as u64
    }
}

/// A mention plus the display context needed to feature it live
#[derive(Debug, Clone, PartialEq)]
pub struct FeaturedMention {
    pub record: MentionRecord,
    pub content: String,
    pub source: String,
    pub author: String,
    pub permalink: String,
}

impl FeaturedMention {
    /// Build a featured candidate for one resolved ticker of a fragment
    pub fn from_fragment(record: MentionRecord, fragment: &RawFragment) -> Self {
        Self {
            record,
            content: truncate_chars(&fragment.text, MAX_CONTENT_CHARS),
            source: fragment.source.clone(),
            author: fragment
                .author
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| DELETED_AUTHOR.to_string()),
            permalink: fragment.permalink.clone(),
        }
    }

    pub fn ticker(&self) -> &str {
        self.record.ticker()
    }

    pub fn engagement_score(&self) -> u64 {
        self.record.engagement_score()
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}
