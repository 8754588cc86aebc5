//! Featured-mention selection for each broadcast tick
//!
//! Exactly one policy is active per runtime:
//!
//! - `Engagement` (default): the mention with the highest platform
//!   engagement score.
//! - `Influence`: `base_weight(kind) * (1 + |sentiment|) * top_bonus`, where
//!   `top_bonus` rewards mentions of tickers currently on the heatmap.
//!
//! Ties always go to the mention seen first in the batch.

use crate::error::ConfigError;
use crate::mention::FeaturedMention;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Multiplier for mentions of tickers in the current top ranking
pub const TOP_TICKER_BONUS: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    #[default]
    Engagement,
    Influence,
}

impl SelectionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionPolicy::Engagement => "engagement",
            SelectionPolicy::Influence => "influence",
        }
    }
}

impl fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SelectionPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "engagement" => Ok(SelectionPolicy::Engagement),
            "influence" => Ok(SelectionPolicy::Influence),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown selection policy '{}' (expected engagement or influence)",
                other
            ))),
        }
    }
}

pub struct FeaturedSelector {
    policy: SelectionPolicy,
}

impl FeaturedSelector {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Pick the mention to feature, `None` for an empty batch
    pub fn select_featured<'a>(
        &self,
        batch: &'a [FeaturedMention],
        top_tickers: &HashSet<String>,
    ) -> Option<&'a FeaturedMention> {
        match self.policy {
            SelectionPolicy::Engagement => first_max_by(batch, |m| m.engagement_score() as f64),
            SelectionPolicy::Influence => {
                first_max_by(batch, |m| influence_score(m, top_tickers))
            }
        }
    }
}

impl Default for FeaturedSelector {
    fn default() -> Self {
        Self::new(SelectionPolicy::default())
    }
}

pub fn influence_score(mention: &FeaturedMention, top_tickers: &HashSet<String>) -> f64 {
    let record = &mention.record;
    let bonus = if top_tickers.contains(record.ticker()) {
        TOP_TICKER_BONUS
    } else {
        1.0
    };
    record.content_kind().base_weight() * (1.0 + record.sentiment().abs()) * bonus
}

/// Maximum by `score`, keeping the earliest element on ties
fn first_max_by<T, F>(items: &[T], score: F) -> Option<&T>
where
    F: Fn(&T) -> f64,
{
    let mut best: Option<(&T, f64)> = None;
    for item in items {
        let s = score(item);
        match best {
            Some((_, best_score)) if s <= best_score => {}
            _ => best = Some((item, s)),
        }
    }
    best.map(|(item, _)| item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::{ContentKind, MentionRecord};
    use chrono::Utc;

    fn make_featured(ticker: &str, kind: ContentKind, sentiment: f64, engagement: u64) -> FeaturedMention {
        FeaturedMention {
            record: MentionRecord::new(ticker, kind, sentiment, Utc::now())
                .unwrap()
                .with_engagement(engagement),
            content: format!("Test content for {}", ticker),
            source: "wallstreetbets".to_string(),
            author: "test_user".to_string(),
            permalink: format!("https://reddit.com/r/test/{}", ticker),
        }
    }

    #[test]
    fn test_empty_batch_is_none() {
        let selector = FeaturedSelector::default();
        assert!(selector.select_featured(&[], &HashSet::new()).is_none());

        let selector = FeaturedSelector::new(SelectionPolicy::Influence);
        assert!(selector.select_featured(&[], &HashSet::new()).is_none());
    }

    #[test]
    fn test_engagement_picks_max() {
        let batch = vec![
            make_featured("AAA", ContentKind::Comment, 0.5, 10),
            make_featured("BBB", ContentKind::Comment, 0.5, 99),
            make_featured("CCC", ContentKind::Post, 0.9, 50),
        ];
        let selector = FeaturedSelector::default();
        let featured = selector.select_featured(&batch, &HashSet::new()).unwrap();
        assert_eq!(featured.ticker(), "BBB");
    }

    #[test]
    fn test_engagement_tie_keeps_first_seen() {
        let batch = vec![
            make_featured("AAA", ContentKind::Comment, 0.0, 5),
            make_featured("BBB", ContentKind::Comment, 0.0, 42),
            make_featured("CCC", ContentKind::Comment, 0.0, 42),
        ];
        let featured = FeaturedSelector::default()
            .select_featured(&batch, &HashSet::new())
            .unwrap();
        assert_eq!(featured.ticker(), "BBB");
    }

    #[test]
    fn test_engagement_all_zero_returns_first() {
        let batch = vec![
            make_featured("AAA", ContentKind::Comment, 0.0, 0),
            make_featured("BBB", ContentKind::Post, 0.9, 0),
        ];
        let featured = FeaturedSelector::default()
            .select_featured(&batch, &HashSet::new())
            .unwrap();
        assert_eq!(featured.ticker(), "AAA");
    }

    #[test]
    fn test_influence_ignores_engagement() {
        let batch = vec![
            make_featured("AAA", ContentKind::Comment, 0.1, 5000),
            make_featured("BBB", ContentKind::Post, -0.9, 1),
        ];
        let selector = FeaturedSelector::new(SelectionPolicy::Influence);
        let featured = selector.select_featured(&batch, &HashSet::new()).unwrap();
        assert_eq!(featured.ticker(), "BBB");
    }

    #[test]
    fn test_influence_top_ticker_bonus() {
        let batch = vec![
            make_featured("AAA", ContentKind::Comment, 0.5, 0),
            make_featured("BBB", ContentKind::Comment, 0.5, 0),
        ];
        let top: HashSet<String> = ["BBB".to_string()].into_iter().collect();
        let selector = FeaturedSelector::new(SelectionPolicy::Influence);
        assert_eq!(selector.select_featured(&batch, &top).unwrap().ticker(), "BBB");
        assert!((influence_score(&batch[1], &top) - 2.25).abs() < 1e-12);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Engagement".parse::<SelectionPolicy>(), Ok(SelectionPolicy::Engagement));
        assert_eq!(" influence ".parse::<SelectionPolicy>(), Ok(SelectionPolicy::Influence));
        assert!("blend".parse::<SelectionPolicy>().is_err());
    }
}
