//! In-memory ledger slot.
//!
//! Holds the ledger as a serialized JSON string, the same shape a browser
//! key-value slot would hold, so load/save go through real serialization.
//! Writes can be forced to fail for exercising degraded persistence.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::LedgerError;
use crate::storage::LedgerStore;
use crate::types::Ledger;

#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    slot: Mutex<Option<String>>,
    fail_writes: AtomicBool,
    saves: AtomicU64,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with arbitrary raw slot contents (possibly malformed)
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
            ..Self::default()
        }
    }

    /// Make every subsequent `save` fail without touching the slot
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current raw slot contents
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|s| s.clone())
    }

    /// Number of successful saves
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn try_load(&self) -> Result<Ledger, LedgerError> {
        let slot = self.slot.lock().map_err(|_| LedgerError::read("slot lock poisoned"))?;
        match slot.as_deref() {
            None => Ok(Ledger::new()),
            Some(raw) => serde_json::from_str(raw).map_err(LedgerError::read),
        }
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LedgerError::write("memory slot rejected write (quota exceeded)"));
        }

        // Serialize before taking the slot so a failure leaves it untouched
        let raw = serde_json::to_string(ledger).map_err(LedgerError::write)?;
        let mut slot = self.slot.lock().map_err(|_| LedgerError::write("slot lock poisoned"))?;
        *slot = Some(raw);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
