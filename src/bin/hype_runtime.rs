//! Hype Runtime - tails raw fragments and broadcasts the live heatmap
//!
//! This binary wires the pipeline together:
//! - Loads the lexicon (fatal on any error)
//! - Creates the shared HypeEngine
//! - Spawns the fragment source, ingestion and broadcast tasks
//! - Stops all three on Ctrl-C
//!
//! Usage:
//!   cargo run --release --bin hype_runtime
//!
//! Environment variables: see `HypeConfig::from_env`. `RUST_LOG` defaults
//! to `info`.

use dotenv::dotenv;
use hypeflow::broadcast::{Broadcaster, JsonlSink, LogSink, WebhookSink};
use hypeflow::pipeline::{start_broadcast_loop, start_ingestion, HypeEngine};
use hypeflow::source::{run_fragment_source, FragmentTailReader, StartPosition};
use hypeflow::{HypeConfig, LexiconStore, RawFragment};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    info!("🚀 Hype Runtime");

    let config = HypeConfig::from_env()?;
    info!("   ├─ Half-life: {}s", config.half_life_secs);
    info!("   ├─ Max age: {}m", config.max_age_minutes);
    info!("   ├─ Broadcast interval: {}ms", config.broadcast_interval_ms);
    info!("   ├─ Heatmap size: {}", config.top_n);
    info!("   ├─ Pending batch capacity: {}", config.pending_batch_capacity);
    info!("   ├─ Selection policy: {}", config.selection_policy);
    info!("   └─ Fragment source: {}", config.fragment_source_path);

    let lexicon = match LexiconStore::load_from_dir(&config.lexicon_dir) {
        Ok(lexicon) => Arc::new(lexicon),
        Err(e) => {
            error!("❌ Failed to load lexicon from {}: {}", config.lexicon_dir, e);
            return Err(e.into());
        }
    };

    let engine = Arc::new(HypeEngine::from_config(&config, lexicon)?);
    info!("✅ HypeEngine created");

    let mut broadcaster = Broadcaster::new(Duration::from_millis(config.sink_timeout_ms));
    broadcaster.add_sink(Arc::new(LogSink::default()));
    broadcaster.add_sink(Arc::new(JsonlSink::open(&config.broadcast_output_path).await?));
    for url in &config.webhook_urls {
        broadcaster.add_sink(Arc::new(WebhookSink::new(
            url.clone(),
            Duration::from_millis(config.sink_timeout_ms),
        )?));
    }
    let broadcaster = Arc::new(broadcaster);

    let (tx, rx) = mpsc::channel::<RawFragment>(config.channel_buffer);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    info!("✅ Fragment channel created (buffer: {})", config.channel_buffer);

    let start = if config.replay_fragments {
        StartPosition::Beginning
    } else {
        StartPosition::End
    };
    let reader = FragmentTailReader::new(PathBuf::from(&config.fragment_source_path), start);
    let source_shutdown = shutdown_rx.clone();
    let source_handle = tokio::spawn(async move {
        if let Err(e) = run_fragment_source(reader, tx, source_shutdown).await {
            error!("❌ Fragment source failed: {}", e);
        }
    });

    let ingestion_handle = tokio::spawn(start_ingestion(
        rx,
        Arc::clone(&engine),
        shutdown_rx.clone(),
    ));

    let broadcast_handle = tokio::spawn(start_broadcast_loop(
        Arc::clone(&engine),
        Arc::clone(&broadcaster),
        config.broadcast_interval_ms,
        shutdown_rx,
    ));

    info!("✅ All tasks running (Ctrl-C to stop)");
    tokio::signal::ctrl_c().await?;

    info!("🛑 Shutting down...");
    shutdown_tx.send(true)?;

    for (name, handle) in [
        ("fragment source", source_handle),
        ("ingestion", ingestion_handle),
        ("broadcast", broadcast_handle),
    ] {
        if let Err(e) = handle.await {
            error!("❌ {} task panicked: {}", name, e);
        }
    }

    let stats = engine.global_stats();
    info!(
        "✅ Hype Runtime stopped ({} live mentions across {} tickers)",
        stats.total_mentions, stats.unique_tickers
    );
    Ok(())
}
