//! Lexicon store - valid tickers, excluded words, and entity phrases
//!
//! Loaded once at startup from two static JSON datasets and read-only
//! afterwards:
//!
//! - `tickers.json`: `{"tickers": [...], "excluded_words": [...]}`
//! - `entity_mappings.json`: `{"TSLA": {"names": [...], "people": [...], "products": [...]}}`
//!
//! Every entity phrase is lowercased. A mapping whose ticker is absent from
//! the ticker set fails the load.

use crate::error::LexiconError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

pub const TICKERS_FILE: &str = "tickers.json";
pub const ENTITY_MAPPINGS_FILE: &str = "entity_mappings.json";

#[derive(Debug, Deserialize)]
struct TickerFile {
    tickers: Vec<String>,
    #[serde(default)]
    excluded_words: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EntityMapping {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub people: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LexiconStore {
    valid_tickers: HashSet<String>,
    excluded_words: HashSet<String>,
    /// Lowercased phrase -> ticker, ordered by phrase
    entity_index: BTreeMap<String, String>,
}

impl LexiconStore {
    /// Build a lexicon from in-memory data, validating entity targets
    pub fn new<T, E>(
        tickers: T,
        excluded_words: E,
        entities: HashMap<String, EntityMapping>,
    ) -> Result<Self, LexiconError>
    where
        T: IntoIterator,
        T::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        let valid_tickers: HashSet<String> = tickers.into_iter().map(Into::into).collect();
        if valid_tickers.is_empty() {
            return Err(LexiconError::Empty);
        }

        let excluded_words = excluded_words.into_iter().map(Into::into).collect();

        // Sorted by ticker so phrase collisions resolve the same way every load
        let entities: BTreeMap<String, EntityMapping> = entities.into_iter().collect();

        let mut entity_index = BTreeMap::new();
        for (ticker, mapping) in entities {
            if !valid_tickers.contains(&ticker) {
                return Err(LexiconError::UnknownEntityTicker { ticker });
            }
            let phrases = mapping
                .names
                .iter()
                .chain(mapping.people.iter())
                .chain(mapping.products.iter());
            for phrase in phrases {
                let phrase = phrase.trim().to_lowercase();
                if phrase.is_empty() {
                    continue;
                }
                if let Some(previous) = entity_index.insert(phrase.clone(), ticker.clone()) {
                    if previous != ticker {
                        log::warn!(
                            "Entity phrase '{}' mapped to both {} and {}, keeping {}",
                            phrase,
                            previous,
                            ticker,
                            ticker
                        );
                    }
                }
            }
        }

        Ok(Self {
            valid_tickers,
            excluded_words,
            entity_index,
        })
    }

    /// Load `tickers.json` and `entity_mappings.json` from a directory
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, LexiconError> {
        let dir = dir.as_ref();
        let ticker_file: TickerFile = read_json(&dir.join(TICKERS_FILE))?;
        let entities: HashMap<String, EntityMapping> =
            read_json(&dir.join(ENTITY_MAPPINGS_FILE))?;

        let store = Self::new(ticker_file.tickers, ticker_file.excluded_words, entities)?;

        log::info!(
            "📚 Lexicon loaded from {}: {} tickers, {} excluded words, {} entity phrases",
            dir.display(),
            store.ticker_count(),
            store.excluded_words.len(),
            store.entity_count()
        );

        Ok(store)
    }

    pub fn is_valid_ticker(&self, symbol: &str) -> bool {
        self.valid_tickers.contains(symbol)
    }

    pub fn is_excluded(&self, symbol: &str) -> bool {
        self.excluded_words.contains(symbol)
    }

    /// Phrase/ticker pairs in lexical phrase order
    pub fn entities(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entity_index
            .iter()
            .map(|(phrase, ticker)| (phrase.as_str(), ticker.as_str()))
    }

    pub fn ticker_count(&self) -> usize {
        self.valid_tickers.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entity_index.len()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LexiconError> {
    let raw = fs::read_to_string(path).map_err(|source| LexiconError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LexiconError::Parse {
        path: path.display().to_string(),
        source,
    })
}
