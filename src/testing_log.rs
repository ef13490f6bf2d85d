//! Testing-log comparison cycle.
//!
//! One cycle: load the stored ledger, enrich and pair the incoming creatives,
//! append the comparisons the ledger has not seen yet, save, and hand back the
//! merged ledger. Persistence is best effort: a failed save is reported on the
//! outcome, never as an error.

use serde_json::Value;
use tracing::{info, warn};

use crate::error::LedgerError;
use crate::metrics::enrich;
use crate::pairing::build_comparisons_at;
use crate::source::parse_creatives;
use crate::storage::LedgerStore;
use crate::types::{CreativeRecord, Ledger};

/// Whether the merged ledger reached storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    Saved,
    /// Ledger computed but not persisted
    Failed(String),
}

impl PersistStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistStatus::Saved)
    }
}

/// Result of one comparison cycle
#[derive(Debug, Clone, PartialEq)]
pub struct CycleOutcome {
    /// Stored ledger plus the newly appended entries
    pub ledger: Ledger,
    /// Entries appended this cycle
    pub added: usize,
    /// Candidates skipped because their id was already in the ledger
    pub skipped: usize,
    pub persisted: PersistStatus,
}

/// Orchestrates comparison cycles against an injected store.
///
/// Not re-entrant per store: callers running cycles concurrently against the
/// same ledger must serialize them, otherwise the last save wins.
pub struct TestingLogService<S: LedgerStore> {
    store: S,
    enrich_metrics: bool,
}

impl<S: LedgerStore> TestingLogService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            enrich_metrics: true,
        }
    }

    /// Toggle filling missing metrics from raw counters (on by default)
    pub fn with_enrichment(mut self, enabled: bool) -> Self {
        self.enrich_metrics = enabled;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Current stored ledger (empty if unreadable)
    pub fn ledger(&self) -> Ledger {
        self.store.load()
    }

    /// Run a cycle, stamping new entries with the current time.
    pub fn run_comparison_cycle(
        &self,
        new_records: &[CreativeRecord],
    ) -> Result<CycleOutcome, LedgerError> {
        self.run_comparison_cycle_at(new_records, chrono::Utc::now().timestamp_millis())
    }

    /// Run a cycle with an explicit creation time (Unix millis) for new entries.
    pub fn run_comparison_cycle_at(
        &self,
        new_records: &[CreativeRecord],
        created_at: i64,
    ) -> Result<CycleOutcome, LedgerError> {
        // Pairing runs first so malformed input fails before touching storage
        let records = self.prepare(new_records);
        let candidates = build_comparisons_at(&records, created_at)?;

        let mut ledger = self.store.load();
        let existing = ledger.len();
        let stats = ledger.append_new(candidates);

        let persisted = match self.store.save(&ledger) {
            Ok(()) => PersistStatus::Saved,
            Err(e) => {
                warn!(
                    "[LEDGER] Ledger computed but not persisted ({}): {}",
                    self.store.backend_name(),
                    e
                );
                PersistStatus::Failed(e.to_string())
            }
        };

        info!(
            "[LEDGER] Cycle over {} creatives: {} existing, {} added, {} skipped, {} total{}",
            new_records.len(),
            existing,
            stats.added,
            stats.skipped,
            ledger.len(),
            if persisted.is_saved() { "" } else { " (unsaved)" }
        );

        Ok(CycleOutcome {
            ledger,
            added: stats.added,
            skipped: stats.skipped,
            persisted,
        })
    }

    /// Run a cycle over untyped JSON as handed over by the data source.
    ///
    /// Anything that is not a creative array (or an insights payload wrapping
    /// one) is `InvalidInput`.
    pub fn run_comparison_cycle_json(&self, payload: &Value) -> Result<CycleOutcome, LedgerError> {
        let records = parse_creatives(payload)?;
        self.run_comparison_cycle(&records)
    }

    fn prepare(&self, new_records: &[CreativeRecord]) -> Vec<CreativeRecord> {
        let mut records = new_records.to_vec();
        if self.enrich_metrics {
            for record in &mut records {
                enrich(record);
            }
        }
        records
    }
}
