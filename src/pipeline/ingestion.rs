//! Fragment ingestion - async channel processor feeding the engine

use super::engine::HypeEngine;
use crate::mention::RawFragment;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Start ingesting fragments from the reader channel
///
/// Main loop:
/// 1. Receives raw fragments from the source reader via mpsc channel
/// 2. Resolves and records each one through `HypeEngine::process_fragment`
/// 3. Logs throughput every 10 seconds
///
/// Runs until the channel closes or `shutdown` flips to `true`.
pub async fn start_ingestion(
    mut rx: mpsc::Receiver<RawFragment>,
    engine: Arc<HypeEngine>,
    mut shutdown: watch::Receiver<bool>,
) {
    log::info!("🚀 Starting fragment ingestion");
    log::info!("   ├─ Selection policy: {}", engine.selection_policy());
    log::info!("   └─ Waiting for fragments...");

    let mut fragment_count = 0u64;
    let mut mention_count = 0u64;
    let mut rejected_count = 0u64;
    let mut last_log_time = std::time::Instant::now();

    loop {
        tokio::select! {
            maybe_fragment = rx.recv() => {
                let Some(fragment) = maybe_fragment else {
                    log::warn!("⚠️  Fragment channel closed, stopping ingestion");
                    break;
                };

                match engine.process_fragment(&fragment) {
                    Ok(recorded) => mention_count += recorded as u64,
                    Err(e) => {
                        rejected_count += 1;
                        log::debug!("⚠️  Rejected fragment from {}: {}", fragment.source, e);
                    }
                }
                fragment_count += 1;

                // Log throughput every 10 seconds
                if last_log_time.elapsed().as_secs() >= 10 {
                    let per_sec = fragment_count as f64 / last_log_time.elapsed().as_secs_f64();
                    log::info!(
                        "📊 Ingestion rate: {:.1} fragments/sec ({} mentions, {} rejected, channel backlog {})",
                        per_sec,
                        mention_count,
                        rejected_count,
                        rx.len()
                    );
                    last_log_time = std::time::Instant::now();
                    fragment_count = 0;
                    mention_count = 0;
                    rejected_count = 0;
                }
            }

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    log::info!("🛑 Shutdown requested, stopping ingestion");
                    break;
                }
            }
        }
    }

    log::info!("✅ Fragment ingestion stopped");
}
