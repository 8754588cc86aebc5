//! Runtime configuration from environment variables

use crate::error::ConfigError;
use crate::selector::SelectionPolicy;
use std::env;
use std::str::FromStr;

/// Longest supported live window, one week
pub const MAX_AGE_LIMIT_MINUTES: i64 = 7 * 24 * 60;

/// Configuration for the hype runtime
///
/// Loaded from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct HypeConfig {
    /// Decay half-life in seconds
    pub half_life_secs: f64,

    /// Records older than this are dropped from the live window
    pub max_age_minutes: i64,

    /// Minimum spacing between housekeeping prunes in seconds
    pub prune_interval_secs: i64,

    /// Absolute cap on live records (oldest dropped first)
    pub max_window_records: usize,

    /// Broadcast tick period in milliseconds
    pub broadcast_interval_ms: u64,

    /// Number of tickers in each heatmap
    pub top_n: usize,

    /// Capacity of the pending batch between ticks
    pub pending_batch_capacity: usize,

    /// Channel buffer between the fragment reader and ingestion
    pub channel_buffer: usize,

    pub selection_policy: SelectionPolicy,

    /// Directory holding tickers.json and entity_mappings.json
    pub lexicon_dir: String,

    /// JSONL file of raw fragments tailed by the runtime
    pub fragment_source_path: String,

    /// Read the fragment file from the top instead of only new lines
    pub replay_fragments: bool,

    /// JSONL file receiving every broadcast payload
    pub broadcast_output_path: String,

    /// HTTP listeners receiving every broadcast payload
    pub webhook_urls: Vec<String>,

    /// Per-listener delivery timeout in milliseconds
    pub sink_timeout_ms: u64,
}

impl Default for HypeConfig {
    fn default() -> Self {
        Self {
            half_life_secs: 600.0,
            max_age_minutes: 60,
            prune_interval_secs: 300,
            max_window_records: 200_000,
            broadcast_interval_ms: 3_000,
            top_n: 30,
            pending_batch_capacity: 1_000,
            channel_buffer: 10_000,
            selection_policy: SelectionPolicy::Engagement,
            lexicon_dir: "data".to_string(),
            fragment_source_path: "streams/fragments.jsonl".to_string(),
            replay_fragments: false,
            broadcast_output_path: "streams/broadcast.jsonl".to_string(),
            webhook_urls: Vec::new(),
            sink_timeout_ms: 2_000,
        }
    }
}

impl HypeConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `HYPE_HALF_LIFE_SECS` (default: 600)
    /// - `HYPE_MAX_AGE_MINUTES` (default: 60)
    /// - `HYPE_PRUNE_INTERVAL_SECS` (default: 300)
    /// - `HYPE_MAX_WINDOW_RECORDS` (default: 200000)
    /// - `BROADCAST_INTERVAL_MS` (default: 3000)
    /// - `HEATMAP_TOP_N` (default: 30)
    /// - `PENDING_BATCH_CAPACITY` (default: 1000)
    /// - `INGEST_CHANNEL_BUFFER` (default: 10000)
    /// - `SELECTION_POLICY` (default: engagement)
    /// - `LEXICON_DIR` (default: data)
    /// - `FRAGMENT_SOURCE_PATH` (default: streams/fragments.jsonl)
    /// - `FRAGMENT_REPLAY` (default: false)
    /// - `BROADCAST_OUTPUT_PATH` (default: streams/broadcast.jsonl)
    /// - `BROADCAST_WEBHOOK_URLS` (default: none, comma-separated)
    /// - `SINK_TIMEOUT_MS` (default: 2000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let selection_policy = match env::var("SELECTION_POLICY") {
            Ok(raw) => raw.parse::<SelectionPolicy>()?,
            Err(_) => defaults.selection_policy,
        };

        let webhook_urls = env::var("BROADCAST_WEBHOOK_URLS")
            .map(|s| {
                s.split(',')
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let config = Self {
            half_life_secs: parse_or("HYPE_HALF_LIFE_SECS", defaults.half_life_secs),
            max_age_minutes: parse_or("HYPE_MAX_AGE_MINUTES", defaults.max_age_minutes),
            prune_interval_secs: parse_or("HYPE_PRUNE_INTERVAL_SECS", defaults.prune_interval_secs),
            max_window_records: parse_or("HYPE_MAX_WINDOW_RECORDS", defaults.max_window_records),
            broadcast_interval_ms: parse_or("BROADCAST_INTERVAL_MS", defaults.broadcast_interval_ms),
            top_n: parse_or("HEATMAP_TOP_N", defaults.top_n),
            pending_batch_capacity: parse_or("PENDING_BATCH_CAPACITY", defaults.pending_batch_capacity),
            channel_buffer: parse_or("INGEST_CHANNEL_BUFFER", defaults.channel_buffer),
            selection_policy,
            lexicon_dir: env::var("LEXICON_DIR").unwrap_or(defaults.lexicon_dir),
            fragment_source_path: env::var("FRAGMENT_SOURCE_PATH")
                .unwrap_or(defaults.fragment_source_path),
            replay_fragments: parse_or("FRAGMENT_REPLAY", defaults.replay_fragments),
            broadcast_output_path: env::var("BROADCAST_OUTPUT_PATH")
                .unwrap_or(defaults.broadcast_output_path),
            webhook_urls,
            sink_timeout_ms: parse_or("SINK_TIMEOUT_MS", defaults.sink_timeout_ms),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.half_life_secs.is_finite() && self.half_life_secs > 0.0) {
            return Err(ConfigError::InvalidValue(format!(
                "half-life must be positive, got {}",
                self.half_life_secs
            )));
        }
        if !(1..=MAX_AGE_LIMIT_MINUTES).contains(&self.max_age_minutes) {
            return Err(ConfigError::InvalidValue(format!(
                "max age must be between 1 and {} minutes, got {}",
                MAX_AGE_LIMIT_MINUTES, self.max_age_minutes
            )));
        }
        let max_age_secs = self.max_age_minutes * 60;
        if !(1..=max_age_secs).contains(&self.prune_interval_secs) {
            return Err(ConfigError::InvalidValue(format!(
                "prune interval must be between 1 and {} seconds, got {}",
                max_age_secs, self.prune_interval_secs
            )));
        }
        if self.broadcast_interval_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "broadcast interval cannot be zero".to_string(),
            ));
        }
        for (name, value) in [
            ("pending batch capacity", self.pending_batch_capacity),
            ("channel buffer", self.channel_buffer),
            ("max window records", self.max_window_records),
            ("top N", self.top_n),
        ] {
            if value == 0 {
                return Err(ConfigError::InvalidValue(format!("{} cannot be zero", name)));
            }
        }
        Ok(())
    }
}

/// Parse an env var, falling back to `default` when unset or malformed
fn parse_or<T: FromStr + std::fmt::Display>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("Invalid {} '{}', defaulting to {}", key, raw, default);
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env vars are process-global; keep every env mutation in one test.
    #[test]
    fn test_config_from_env() {
        for key in [
            "HYPE_HALF_LIFE_SECS",
            "HEATMAP_TOP_N",
            "SELECTION_POLICY",
            "BROADCAST_WEBHOOK_URLS",
            "PENDING_BATCH_CAPACITY",
        ] {
            env::remove_var(key);
        }

        let config = HypeConfig::from_env().unwrap();
        assert_eq!(config.half_life_secs, 600.0);
        assert_eq!(config.top_n, 30);
        assert_eq!(config.selection_policy, SelectionPolicy::Engagement);
        assert!(config.webhook_urls.is_empty());

        env::set_var("HYPE_HALF_LIFE_SECS", "120");
        env::set_var("HEATMAP_TOP_N", "not-a-number");
        env::set_var("SELECTION_POLICY", "influence");
        env::set_var("BROADCAST_WEBHOOK_URLS", "http://a.local/hook, ,http://b.local/hook");

        let config = HypeConfig::from_env().unwrap();
        assert_eq!(config.half_life_secs, 120.0);
        assert_eq!(config.top_n, 30);
        assert_eq!(config.selection_policy, SelectionPolicy::Influence);
        assert_eq!(
            config.webhook_urls,
            vec!["http://a.local/hook".to_string(), "http://b.local/hook".to_string()]
        );

        env::set_var("PENDING_BATCH_CAPACITY", "0");
        assert!(HypeConfig::from_env().is_err());

        env::set_var("PENDING_BATCH_CAPACITY", "10");
        env::set_var("SELECTION_POLICY", "loudest");
        assert!(HypeConfig::from_env().is_err());

        for key in [
            "HYPE_HALF_LIFE_SECS",
            "HEATMAP_TOP_N",
            "SELECTION_POLICY",
            "BROADCAST_WEBHOOK_URLS",
            "PENDING_BATCH_CAPACITY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_validate_rejects_zero_half_life() {
        let config = HypeConfig {
            half_life_secs: 0.0,
            ..HypeConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(HypeConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_bounds_window_durations() {
        let huge_age = HypeConfig {
            max_age_minutes: 1_000_000_000_000,
            ..HypeConfig::default()
        };
        assert!(huge_age.validate().is_err());

        let week = HypeConfig {
            max_age_minutes: MAX_AGE_LIMIT_MINUTES,
            ..HypeConfig::default()
        };
        assert!(week.validate().is_ok());

        for prune_interval_secs in [0, -5, 60 * 60 + 1, i64::MAX] {
            let config = HypeConfig {
                prune_interval_secs,
                ..HypeConfig::default()
            };
            assert!(
                config.validate().is_err(),
                "prune interval {} accepted",
                prune_interval_secs
            );
        }
    }
}
