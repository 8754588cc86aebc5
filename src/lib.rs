//! hypeflow - live ticker hype from social-media text
//!
//! Resolves stock tickers in free text, keeps an exponentially decayed
//! hype ranking over a bounded window, and periodically broadcasts the
//! ranking together with one featured mention.

pub mod broadcast;
pub mod config;
pub mod error;
pub mod hype;
pub mod lexicon;
pub mod mention;
pub mod pipeline;
pub mod resolver;
pub mod selector;
pub mod source;

pub use config::HypeConfig;
pub use error::{ConfigError, LexiconError, MentionError, SinkError};
pub use hype::{GlobalStats, HypeAggregator, HypeSnapshot};
pub use lexicon::LexiconStore;
pub use mention::{ContentKind, FeaturedMention, MentionRecord, RawFragment};
pub use pipeline::HypeEngine;
pub use resolver::{MatchType, TickerMatch, TickerResolver};
pub use selector::{FeaturedSelector, SelectionPolicy};
