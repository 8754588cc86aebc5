//! Live mention window with decayed, ranked snapshots

use super::decay::DecayModel;
use super::snapshot::{round_to, GlobalStats, HypeSnapshot, TickerAccumulator};
use super::VELOCITY_WINDOW_MINUTES;
use crate::config::HypeConfig;
use crate::mention::MentionRecord;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet, VecDeque};

/// Tunables for a `HypeAggregator`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorSettings {
    pub half_life_secs: f64,
    /// Hard memory bound, unrelated to the half-life
    pub max_age_minutes: i64,
    /// Minimum spacing between housekeeping prunes
    pub prune_interval_secs: i64,
    /// Absolute cap on live records, oldest dropped first
    pub max_records: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            half_life_secs: 600.0,
            max_age_minutes: 60,
            prune_interval_secs: 300,
            max_records: 200_000,
        }
    }
}

impl From<&HypeConfig> for AggregatorSettings {
    fn from(config: &HypeConfig) -> Self {
        Self {
            half_life_secs: config.half_life_secs,
            max_age_minutes: config.max_age_minutes,
            prune_interval_secs: config.prune_interval_secs,
            max_records: config.max_window_records,
        }
    }
}

/// Stateful hype engine over a bounded window of mention records
///
/// The window is the single source of truth. Nothing per-ticker survives
/// between calls; `snapshot` and `score_ticker` rebuild their accumulators
/// from the window at the evaluation instant.
pub struct HypeAggregator {
    /// Live records in arrival order
    window: VecDeque<MentionRecord>,
    decay: DecayModel,
    max_age: Duration,
    prune_interval: Duration,
    max_records: usize,
    last_prune: DateTime<Utc>,

    /// Timestamp function (for testing with mock time)
    now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
}

impl HypeAggregator {
    /// Create an aggregator on the system clock
    pub fn new(settings: AggregatorSettings) -> Self {
        Self::new_with_clock(settings, Box::new(Utc::now))
    }

    /// Create an aggregator with a custom clock
    ///
    /// Used for testing with deterministic timestamps.
    pub fn new_with_clock(
        settings: AggregatorSettings,
        now_fn: Box<dyn Fn() -> DateTime<Utc> + Send + Sync>,
    ) -> Self {
        let last_prune = now_fn();
        Self {
            window: VecDeque::new(),
            decay: DecayModel::new(settings.half_life_secs),
            max_age: Duration::try_minutes(settings.max_age_minutes).unwrap_or(Duration::MAX),
            prune_interval: Duration::try_seconds(settings.prune_interval_secs)
                .unwrap_or(Duration::MAX),
            max_records: settings.max_records.max(1),
            last_prune,
            now_fn,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.now_fn)()
    }

    /// Append a record to the live window
    ///
    /// Triggers a prune when the housekeeping interval has elapsed, and
    /// drops the oldest arrivals once the record cap is exceeded.
    pub fn add_mention(&mut self, record: MentionRecord) {
        self.window.push_back(record);

        while self.window.len() > self.max_records {
            self.window.pop_front();
        }

        let now = self.now();
        if now - self.last_prune > self.prune_interval {
            self.prune_at(now);
        }
    }

    /// Drop every record older than the max age, relative to `now`
    ///
    /// Returns the number of records removed.
    pub fn prune_at(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = cutoff(now, self.max_age);
        let before = self.window.len();
        self.window.retain(|r| r.timestamp() > cutoff);
        self.last_prune = now;

        let removed = before - self.window.len();
        if removed > 0 {
            log::debug!(
                "🧹 Pruned {} mentions older than {}m ({} live)",
                removed,
                self.max_age.num_minutes(),
                self.window.len()
            );
        }
        removed
    }

    /// Ranked hype for every live ticker, truncated to `top_n`
    pub fn snapshot(&self, top_n: usize) -> Vec<HypeSnapshot> {
        self.snapshot_at(self.now(), top_n)
    }

    /// Same as `snapshot`, evaluated at an explicit instant
    ///
    /// Order: hype (rounded to 2 dp) descending, then ticker ascending.
    pub fn snapshot_at(&self, now: DateTime<Utc>, top_n: usize) -> Vec<HypeSnapshot> {
        let mut accumulators: HashMap<&str, TickerAccumulator> = HashMap::new();
        for record in self.live_records(now) {
            self.accumulate(
                accumulators.entry(record.ticker()).or_default(),
                record,
                now,
            );
        }

        let velocity_minutes = VELOCITY_WINDOW_MINUTES as f64;
        let mut snapshots: Vec<HypeSnapshot> = accumulators
            .into_iter()
            .filter_map(|(ticker, acc)| acc.finish(ticker, velocity_minutes))
            .collect();

        snapshots.sort_by(|a, b| {
            round_to(b.hype, 2)
                .total_cmp(&round_to(a.hype, 2))
                .then_with(|| a.ticker.cmp(&b.ticker))
        });
        snapshots.truncate(top_n);
        snapshots
    }

    /// Hype for one ticker, `None` when it has no live records
    pub fn score_ticker(&self, ticker: &str) -> Option<HypeSnapshot> {
        self.score_ticker_at(ticker, self.now())
    }

    pub fn score_ticker_at(&self, ticker: &str, now: DateTime<Utc>) -> Option<HypeSnapshot> {
        let mut acc = TickerAccumulator::default();
        for record in self.live_records(now).filter(|r| r.ticker() == ticker) {
            self.accumulate(&mut acc, record, now);
        }
        acc.finish(ticker, VELOCITY_WINDOW_MINUTES as f64)
    }

    /// Window-wide counts, independent of decay weighting
    pub fn global_stats(&self) -> GlobalStats {
        self.global_stats_at(self.now())
    }

    pub fn global_stats_at(&self, now: DateTime<Utc>) -> GlobalStats {
        let recent_cutoff = cutoff(now, Duration::minutes(VELOCITY_WINDOW_MINUTES));
        let hour_cutoff = cutoff(now, Duration::hours(1));

        let mut stats = GlobalStats::default();
        let mut tickers: HashSet<&str> = HashSet::new();

        for record in self.live_records(now) {
            stats.total_mentions += 1;
            tickers.insert(record.ticker());
            if record.timestamp() > recent_cutoff {
                stats.mentions_last_5_min += 1;
            }
            if record.timestamp() > hour_cutoff {
                stats.mentions_last_hour += 1;
            }
        }

        stats.unique_tickers = tickers.len();
        stats.velocity = stats.mentions_last_5_min as f64 / VELOCITY_WINDOW_MINUTES as f64;
        stats
    }

    /// Records currently held, live or awaiting prune
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Records within the max age at `now`
    ///
    /// Records past the max age that the housekeeping prune has not yet
    /// removed are already excluded here.
    fn live_records(&self, now: DateTime<Utc>) -> impl Iterator<Item = &MentionRecord> {
        let cutoff = cutoff(now, self.max_age);
        self.window.iter().filter(move |r| r.timestamp() > cutoff)
    }

    fn accumulate(&self, acc: &mut TickerAccumulator, record: &MentionRecord, now: DateTime<Utc>) {
        let age_secs = (now - record.timestamp()).num_milliseconds() as f64 / 1000.0;
        let weight = self.decay.weight(record.content_kind(), age_secs);
        let recent = record.timestamp() > cutoff(now, Duration::minutes(VELOCITY_WINDOW_MINUTES));
        acc.add(weight, record.sentiment(), recent);
    }
}

/// `now - span`, saturating at the earliest representable instant
fn cutoff(now: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    now.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl Default for HypeAggregator {
    fn default() -> Self {
        Self::new(AggregatorSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mention::ContentKind;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    const EPS: f64 = 1e-9;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    /// Aggregator on a clock the test can move
    fn make_aggregator(settings: AggregatorSettings) -> (HypeAggregator, Arc<Mutex<DateTime<Utc>>>) {
        let clock = Arc::new(Mutex::new(base_time()));
        let clock_fn = clock.clone();
        let aggregator =
            HypeAggregator::new_with_clock(settings, Box::new(move || *clock_fn.lock().unwrap()));
        (aggregator, clock)
    }

    fn make_mention(ticker: &str, kind: ContentKind, sentiment: f64, at: DateTime<Utc>) -> MentionRecord {
        MentionRecord::new(ticker, kind, sentiment, at).unwrap()
    }

    #[test]
    fn test_decay_halves_each_half_life() {
        let (mut agg, _clock) = make_aggregator(AggregatorSettings::default());
        let t0 = base_time();
        agg.add_mention(make_mention("TSLA", ContentKind::Post, 0.5, t0));

        let at_t0 = agg.score_ticker_at("TSLA", t0).unwrap();
        let at_h = agg.score_ticker_at("TSLA", t0 + Duration::seconds(600)).unwrap();
        let at_2h = agg.score_ticker_at("TSLA", t0 + Duration::seconds(1200)).unwrap();

        assert!((at_t0.hype - 1.5).abs() < EPS);
        assert!((at_h.hype - 0.75).abs() < EPS);
        assert!((at_2h.hype - 0.375).abs() < EPS);
    }

    #[test]
    fn test_hype_non_increasing_without_new_mentions() {
        let (mut agg, _clock) = make_aggregator(AggregatorSettings::default());
        let t0 = base_time();
        for i in 0..5 {
            agg.add_mention(make_mention("GME", ContentKind::Comment, 0.1, t0 + Duration::seconds(i * 7)));
        }

        let mut previous = f64::INFINITY;
        for step in 0..200 {
            let now = t0 + Duration::seconds(35 + step * 20);
            let hype = agg
                .snapshot_at(now, 10)
                .first()
                .map(|s| s.hype)
                .unwrap_or(0.0);
            assert!(hype <= previous, "hype grew at step {}: {} > {}", step, hype, previous);
            previous = hype;
        }
    }

    #[test]
    fn test_adding_mention_increases_hype_by_its_weight() {
        let (mut agg, _clock) = make_aggregator(AggregatorSettings::default());
        let t0 = base_time();
        agg.add_mention(make_mention("AMD", ContentKind::Comment, 0.0, t0 - Duration::seconds(90)));

        let before = agg.score_ticker_at("AMD", t0).unwrap().hype;
        agg.add_mention(make_mention("AMD", ContentKind::Post, 0.0, t0));
        let after = agg.score_ticker_at("AMD", t0).unwrap().hype;

        assert!((after - before - 1.5).abs() < EPS);
    }

    #[test]
    fn test_score_ticker_absent_for_unknown() {
        let (agg, _clock) = make_aggregator(AggregatorSettings::default());
        assert!(agg.score_ticker("NEVER").is_none());
        assert!(agg.snapshot(10).is_empty());
    }

    #[test]
    fn test_snapshot_aggregates_per_ticker() {
        let (mut agg, _clock) = make_aggregator(AggregatorSettings::default());
        let t0 = base_time();
        agg.add_mention(make_mention("NVDA", ContentKind::Post, 0.8, t0 - Duration::minutes(1)));
        agg.add_mention(make_mention("NVDA", ContentKind::Comment, 0.2, t0 - Duration::minutes(10)));
        agg.add_mention(make_mention("AMD", ContentKind::Comment, -0.4, t0));

        let snapshots = agg.snapshot_at(t0, 10);
        assert_eq!(snapshots.len(), 2);

        let nvda = &snapshots[0];
        assert_eq!(nvda.ticker, "NVDA");
        assert_eq!(nvda.mention_count, 2);
        assert!((nvda.avg_sentiment - 0.5).abs() < EPS);
        // Only the 1-minute-old mention is inside the 5-minute velocity window
        assert!((nvda.velocity - 0.2).abs() < EPS);

        let amd = &snapshots[1];
        assert_eq!(amd.ticker, "AMD");
        assert!((amd.hype - 1.0).abs() < EPS);
    }

    #[test]
    fn test_snapshot_tie_break_is_lexical() {
        let (mut agg, _clock) = make_aggregator(AggregatorSettings::default());
        let t0 = base_time();
        for ticker in ["TSLA", "AAPL", "MSFT"] {
            agg.add_mention(make_mention(ticker, ContentKind::Comment, 0.0, t0));
        }

        for _ in 0..3 {
            let order: Vec<String> = agg.snapshot_at(t0, 10).into_iter().map(|s| s.ticker).collect();
            assert_eq!(order, vec!["AAPL", "MSFT", "TSLA"]);
        }
    }

    #[test]
    fn test_tie_break_compares_rounded_hype() {
        let (mut agg, _clock) = make_aggregator(AggregatorSettings::default());
        let t0 = base_time();
        // A few milliseconds of extra decay: raw hype differs, rounded hype does not
        agg.add_mention(make_mention("ZZZ", ContentKind::Comment, 0.0, t0));
        agg.add_mention(make_mention("AAA", ContentKind::Comment, 0.0, t0 - Duration::milliseconds(5)));

        let snapshots = agg.snapshot_at(t0, 10);
        assert_eq!(snapshots[0].ticker, "AAA");
        assert_eq!(snapshots[1].ticker, "ZZZ");
        assert!(snapshots[0].hype < snapshots[1].hype);
        assert!(snapshots[1].hype - snapshots[0].hype < 0.005);
        assert_eq!(round_to(snapshots[0].hype, 2), round_to(snapshots[1].hype, 2));
    }

    #[test]
    fn test_extreme_durations_do_not_panic() {
        let settings = AggregatorSettings {
            max_age_minutes: i64::MAX,
            prune_interval_secs: i64::MAX,
            ..AggregatorSettings::default()
        };
        let (mut agg, _clock) = make_aggregator(settings);
        let t0 = base_time();
        agg.add_mention(make_mention("GME", ContentKind::Comment, 0.0, t0));

        assert_eq!(agg.snapshot(10).len(), 1);
        assert_eq!(agg.global_stats().total_mentions, 1);
        assert_eq!(agg.prune_at(t0), 0);

        let settings = AggregatorSettings {
            max_age_minutes: 1_000_000_000_000,
            ..AggregatorSettings::default()
        };
        let (mut agg, _clock) = make_aggregator(settings);
        agg.add_mention(make_mention("GME", ContentKind::Comment, 0.0, t0));
        assert!(agg.score_ticker("GME").is_some());
    }

    #[test]
    fn test_snapshot_truncates_to_top_n() {
        let (mut agg, _clock) = make_aggregator(AggregatorSettings::default());
        let t0 = base_time();
        for (i, ticker) in ["AAA", "BBB", "CCC", "DDD"].iter().enumerate() {
            for _ in 0..=i {
                agg.add_mention(make_mention(ticker, ContentKind::Comment, 0.0, t0));
            }
        }

        let top: Vec<String> = agg.snapshot_at(t0, 2).into_iter().map(|s| s.ticker).collect();
        assert_eq!(top, vec!["DDD", "CCC"]);
    }

    #[test]
    fn test_prune_bounds_window() {
        let settings = AggregatorSettings {
            max_age_minutes: 10,
            prune_interval_secs: 60,
            ..AggregatorSettings::default()
        };
        let (mut agg, clock) = make_aggregator(settings);
        let t0 = base_time();

        // 1000 mentions spread over ~100 minutes, clock advancing with them
        for i in 0..1000 {
            let at = t0 + Duration::seconds(i * 6);
            *clock.lock().unwrap() = at;
            agg.add_mention(make_mention("GME", ContentKind::Comment, 0.0, at));
        }

        // 10 minutes of mentions plus at most one prune interval of slack
        assert!(agg.len() <= 110, "window holds {} records", agg.len());

        let now = *clock.lock().unwrap();
        let snapshot = agg.snapshot_at(now, 10);
        // Mentions strictly newer than now - 10m: one every 6s
        assert_eq!(snapshot[0].mention_count, 100);
    }

    #[test]
    fn test_snapshot_excludes_expired_records_before_prune() {
        let settings = AggregatorSettings {
            max_age_minutes: 10,
            prune_interval_secs: 3600,
            ..AggregatorSettings::default()
        };
        let (mut agg, _clock) = make_aggregator(settings);
        let t0 = base_time();
        agg.add_mention(make_mention("BB", ContentKind::Comment, 0.0, t0 - Duration::minutes(30)));
        agg.add_mention(make_mention("NOK", ContentKind::Comment, 0.0, t0));

        assert_eq!(agg.len(), 2);
        let tickers: Vec<String> = agg.snapshot_at(t0, 10).into_iter().map(|s| s.ticker).collect();
        assert_eq!(tickers, vec!["NOK"]);
        assert!(agg.score_ticker_at("BB", t0).is_none());

        assert_eq!(agg.prune_at(t0), 1);
        assert_eq!(agg.len(), 1);
    }

    #[test]
    fn test_record_cap_drops_oldest() {
        let settings = AggregatorSettings {
            max_records: 3,
            ..AggregatorSettings::default()
        };
        let (mut agg, _clock) = make_aggregator(settings);
        let t0 = base_time();
        for ticker in ["AAA", "BBB", "CCC", "DDD"] {
            agg.add_mention(make_mention(ticker, ContentKind::Comment, 0.0, t0));
        }

        assert_eq!(agg.len(), 3);
        assert!(agg.score_ticker_at("AAA", t0).is_none());
        assert!(agg.score_ticker_at("DDD", t0).is_some());
    }

    #[test]
    fn test_global_stats() {
        let (mut agg, _clock) = make_aggregator(AggregatorSettings::default());
        let t0 = base_time();
        agg.add_mention(make_mention("TSLA", ContentKind::Post, 0.0, t0));
        agg.add_mention(make_mention("TSLA", ContentKind::Comment, 0.0, t0 - Duration::minutes(2)));
        agg.add_mention(make_mention("GME", ContentKind::Comment, 0.0, t0 - Duration::minutes(20)));

        let stats = agg.global_stats_at(t0);
        assert_eq!(stats.total_mentions, 3);
        assert_eq!(stats.unique_tickers, 2);
        assert_eq!(stats.mentions_last_5_min, 2);
        assert_eq!(stats.mentions_last_hour, 3);
        assert!((stats.velocity - 0.4).abs() < EPS);
    }
}
