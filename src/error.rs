//! Error types shared across the hype pipeline

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Failure while loading the static lexicon datasets
///
/// Every variant is fatal at startup: the runtime refuses to resolve
/// tickers against a partial lexicon.
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lexicon file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("entity mapping references unknown ticker {ticker}")]
    UnknownEntityTicker { ticker: String },

    #[error("lexicon contains no valid tickers")]
    Empty,

    #[error("failed to compile match patterns: {0}")]
    Pattern(#[from] regex::Error),
}

/// Contract violation when building a mention record
#[derive(Debug, Error, PartialEq)]
pub enum MentionError {
    #[error("sentiment {0} outside [-1.0, 1.0]")]
    SentimentOutOfRange(f64),

    #[error("invalid ticker symbol: {0:?}")]
    InvalidTicker(String),

    #[error("timestamp {timestamp} is ahead of the clock ({now})")]
    FutureTimestamp {
        timestamp: DateTime<Utc>,
        now: DateTime<Utc>,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Delivery failure for a single broadcast listener
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listener responded with status {0}")]
    Status(u16),

    #[error("delivery timed out after {0}ms")]
    Timeout(u64),
}
