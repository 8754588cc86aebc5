//! Broadcast tick scheduler

use super::engine::HypeEngine;
use crate::broadcast::Broadcaster;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Broadcast loop - every `interval_ms`, run one tick and publish it
///
/// The tick itself is synchronous and short. Publishing hands the payload
/// to per-sink tasks and returns immediately, so a slow listener never
/// delays the next tick.
///
/// Runs until `shutdown` flips to `true`.
pub async fn start_broadcast_loop(
    engine: Arc<HypeEngine>,
    broadcaster: Arc<Broadcaster>,
    interval_ms: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    log::info!("⏰ Starting broadcast loop (interval: {}ms)", interval_ms);

    let mut timer = interval(Duration::from_millis(interval_ms));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = timer.tick() => {
                let tick_start = std::time::Instant::now();
                let (payload, report) = engine.broadcast_tick();

                if report.dropped > 0 {
                    log::warn!(
                        "⚠️  Pending batch overflowed: dropped {} oldest mentions",
                        report.dropped
                    );
                }

                log::debug!(
                    "📊 Tick: {} tickers | batch {} | featured {} | {}ms",
                    payload.data.heatmap.len(),
                    report.batch_size,
                    payload.featured_ticker().unwrap_or("-"),
                    tick_start.elapsed().as_millis()
                );

                broadcaster.publish(payload);
            }

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    log::info!("🛑 Shutdown requested, stopping broadcast loop");
                    break;
                }
            }
        }
    }

    log::info!("✅ Broadcast loop stopped");
}
