//! # Hype pipeline
//!
//! Two independent tasks share one `HypeEngine`:
//!
//! - `ingestion` pulls raw fragments from a channel and records mentions
//! - `scheduler` runs the broadcast tick on a fixed interval
//!
//! ## Module Organization
//!
//! - `batch` - Bounded pending batch of featured candidates
//! - `engine` - Shared aggregator + batch behind one lock
//! - `ingestion` - Channel consumer loop
//! - `scheduler` - Broadcast tick loop

pub mod batch;
pub mod engine;
pub mod ingestion;
pub mod scheduler;

pub use batch::PendingBatch;
pub use engine::{HypeEngine, TickReport};
pub use ingestion::start_ingestion;
pub use scheduler::start_broadcast_loop;
