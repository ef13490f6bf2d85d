//! SignalOne creative testing log
//!
//! Pairs ad creatives into A/B comparisons, judges each pair on ROAS and keeps
//! an append-only, rebuildable ledger of the verdicts behind a pluggable store.

pub mod config;
pub mod error;
pub mod metrics;
pub mod pairing;
pub mod source;
pub mod storage;
pub mod testing_log;
pub mod types;

pub use error::LedgerError;
pub use storage::{JsonFileLedgerStore, LedgerStore, MemoryLedgerStore, SqliteLedgerStore};
pub use testing_log::{CycleOutcome, PersistStatus, TestingLogService};
pub use types::{ComparisonEntry, CreativeRecord, Ledger, MetricSnapshot, Winner};
