//! Consecutive pairing of creatives into A/B comparison entries.
//!
//! Records are paired (0,1), (2,3), (4,5), ... in input order. A trailing odd
//! record is dropped without error, and fewer than two records yield nothing.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::config::debug_pairing_enabled;
use crate::error::LedgerError;
use crate::types::{is_pairable_id, ComparisonEntry, CreativeRecord, COMPARISON_ID_SEPARATOR};

/// Check the batch invariants: every id is non-empty, unique, and pairable
/// (see [`is_pairable_id`]) so each entry id names exactly one pair.
pub fn validate_batch(records: &[CreativeRecord]) -> Result<(), LedgerError> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();

    for (idx, record) in records.iter().enumerate() {
        if record.id.trim().is_empty() {
            return Err(LedgerError::invalid_input(format!(
                "creative at position {} has an empty id",
                idx
            )));
        }
        if !is_pairable_id(&record.id) {
            return Err(LedgerError::invalid_input(format!(
                "creative id '{}' at position {} clashes with the entry id separator '{}'",
                record.id, idx, COMPARISON_ID_SEPARATOR
            )));
        }
        if !seen.insert(record.id.as_str()) {
            return Err(LedgerError::invalid_input(format!(
                "duplicate creative id '{}' at position {}",
                record.id, idx
            )));
        }
    }

    Ok(())
}

/// Build comparison entries stamped with the current time.
pub fn build_comparisons(records: &[CreativeRecord]) -> Result<Vec<ComparisonEntry>, LedgerError> {
    build_comparisons_at(records, chrono::Utc::now().timestamp_millis())
}

/// Build comparison entries with an explicit creation time (Unix millis).
///
/// Output length is always `records.len() / 2`.
pub fn build_comparisons_at(
    records: &[CreativeRecord],
    created_at: i64,
) -> Result<Vec<ComparisonEntry>, LedgerError> {
    validate_batch(records)?;

    let entries: Vec<ComparisonEntry> = records
        .chunks_exact(2)
        .map(|pair| ComparisonEntry::new(pair[0].clone(), pair[1].clone(), created_at))
        .collect();

    if debug_pairing_enabled() {
        for e in &entries {
            debug!(
                "[PAIRING] {} -> winner {} (roas {:?} vs {:?})",
                e.id(),
                e.winner(),
                e.metrics_a().roas,
                e.metrics_b().roas
            );
        }
        if let Some(dropped) = records.chunks_exact(2).remainder().first() {
            debug!("[PAIRING] Unpaired trailing creative {} dropped", dropped.id);
        }
    }

    Ok(entries)
}
