//! Ticker resolution from free text
//!
//! Three independent strategies, in priority order:
//!
//! 1. Cashtags (`$TSLA`): 1-5 uppercase letters after `$`. The excluded-word
//!    list does not apply.
//! 2. Standalone uppercase (`TSLA`): 2-5 uppercase letters on word
//!    boundaries, rejected when the symbol is an excluded word.
//! 3. Entities (`tesla`, `elon`): lowercase phrase match on word boundaries
//!    against the lexicon's entity index.
//!
//! `resolve` returns the union. `resolve_with_context` reports each ticker
//! once, attributed to the highest-priority strategy that found it.

use crate::error::LexiconError;
use crate::lexicon::LexiconStore;
use regex::{Regex, RegexSet};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

const CASHTAG_PATTERN: &str = r"\$([A-Z]{1,5})\b";
const STANDALONE_PATTERN: &str = r"\b([A-Z]{2,5})\b";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Cashtag,
    Standalone,
    Entity,
}

/// A resolved ticker with the strategy that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerMatch {
    pub ticker: String,
    pub match_type: MatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_entity: Option<String>,
}

pub struct TickerResolver {
    lexicon: Arc<LexiconStore>,
    cashtag: Regex,
    standalone: Regex,
    /// One `\b<phrase>\b` pattern per entity, indexed like `entity_targets`
    entity_set: RegexSet,
    /// (phrase, ticker) in lexical phrase order
    entity_targets: Vec<(String, String)>,
}

impl TickerResolver {
    pub fn new(lexicon: Arc<LexiconStore>) -> Result<Self, LexiconError> {
        let entity_targets: Vec<(String, String)> = lexicon
            .entities()
            .map(|(phrase, ticker)| (phrase.to_string(), ticker.to_string()))
            .collect();

        let entity_set = RegexSet::new(
            entity_targets
                .iter()
                .map(|(phrase, _)| format!(r"\b{}\b", regex::escape(phrase))),
        )?;

        Ok(Self {
            lexicon,
            cashtag: Regex::new(CASHTAG_PATTERN)?,
            standalone: Regex::new(STANDALONE_PATTERN)?,
            entity_set,
            entity_targets,
        })
    }

    /// Distinct tickers found by any strategy
    pub fn resolve(&self, text: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        if text.is_empty() {
            return found;
        }

        found.extend(self.cashtag_hits(text).map(str::to_string));
        found.extend(self.standalone_hits(text).map(str::to_string));
        found.extend(self.entity_hits(text).map(|(_, ticker)| ticker.to_string()));
        found
    }

    /// Tickers with match provenance, first strategy wins per ticker
    ///
    /// Order: cashtags in text order, then standalone symbols in text order,
    /// then entity phrases in lexical order.
    pub fn resolve_with_context(&self, text: &str) -> Vec<TickerMatch> {
        let mut results = Vec::new();
        if text.is_empty() {
            return results;
        }
        let mut seen: HashSet<String> = HashSet::new();

        for ticker in self.cashtag_hits(text) {
            if seen.insert(ticker.to_string()) {
                results.push(TickerMatch {
                    ticker: ticker.to_string(),
                    match_type: MatchType::Cashtag,
                    matched_entity: None,
                });
            }
        }

        for ticker in self.standalone_hits(text) {
            if seen.insert(ticker.to_string()) {
                results.push(TickerMatch {
                    ticker: ticker.to_string(),
                    match_type: MatchType::Standalone,
                    matched_entity: None,
                });
            }
        }

        for (phrase, ticker) in self.entity_hits(text) {
            if seen.insert(ticker.to_string()) {
                results.push(TickerMatch {
                    ticker: ticker.to_string(),
                    match_type: MatchType::Entity,
                    matched_entity: Some(phrase.to_string()),
                });
            }
        }

        results
    }

    fn cashtag_hits<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.cashtag
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(move |symbol| self.lexicon.is_valid_ticker(symbol))
    }

    fn standalone_hits<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        self.standalone
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(move |symbol| {
                self.lexicon.is_valid_ticker(symbol) && !self.lexicon.is_excluded(symbol)
            })
    }

    /// Entity phrases present in the lowercased text
    fn entity_hits(&self, text: &str) -> impl Iterator<Item = (&str, &str)> + '_ {
        let lowered = text.to_lowercase();
        self.entity_set
            .matches(&lowered)
            .into_iter()
            .map(move |idx| {
                let (phrase, ticker) = &self.entity_targets[idx];
                (phrase.as_str(), ticker.as_str())
            })
    }
}
