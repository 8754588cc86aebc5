//! Resolve tickers in text read from stdin
//!
//! Prints one JSON array of matches per input line, for checking lexicon
//! changes by hand.
//!
//! Usage:
//!   echo 'Elon says $TSLA' | cargo run --bin resolve_tickers -- [lexicon_dir]

use hypeflow::{LexiconStore, TickerResolver};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let lexicon_dir = std::env::args().nth(1).unwrap_or_else(|| "data".to_string());
    let lexicon = LexiconStore::load_from_dir(&lexicon_dir)?;
    let resolver = TickerResolver::new(Arc::new(lexicon))?;

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let matches = resolver.resolve_with_context(&line);
        writeln!(stdout, "{}", serde_json::to_string(&matches)?)?;
    }
    Ok(())
}
