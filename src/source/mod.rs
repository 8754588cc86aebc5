//! Upstream boundary: raw fragments arriving as JSON lines
//!
//! The social-media client is an external process that appends one
//! `RawFragment` per line to a JSONL file. This module tails that file and
//! feeds the ingestion channel.

pub mod tail;

pub use tail::{run_fragment_source, FragmentTailReader, StartPosition};
