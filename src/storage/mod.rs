//! Ledger persistence.
//!
//! [`LedgerStore`] is the port the testing-log service talks to. Reads fail
//! soft (an unreadable ledger becomes an empty one), writes are all-or-nothing
//! and report failure to the caller.

pub mod json_file;
pub mod memory;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

use tracing::warn;

use crate::config::{LedgerBackend, LedgerConfig};
use crate::error::LedgerError;
use crate::types::Ledger;

pub use json_file::JsonFileLedgerStore;
pub use memory::MemoryLedgerStore;
pub use sqlite::SqliteLedgerStore;

/// Durable home of a single ledger.
pub trait LedgerStore {
    /// Short backend label for log lines
    fn backend_name(&self) -> &'static str;

    /// Read the stored ledger. Missing data is an empty ledger, not an error.
    fn try_load(&self) -> Result<Ledger, LedgerError>;

    /// Persist `ledger`, replacing what was stored. On error the previously
    /// stored ledger must be left exactly as it was.
    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError>;

    /// Soft-failing read: any read failure is logged and yields an empty ledger.
    fn load(&self) -> Ledger {
        match self.try_load() {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!(
                    "[STORAGE] {} ledger unreadable, starting empty: {}",
                    self.backend_name(),
                    e
                );
                Ledger::new()
            }
        }
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for Box<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn try_load(&self) -> Result<Ledger, LedgerError> {
        (**self).try_load()
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        (**self).save(ledger)
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }

    fn try_load(&self) -> Result<Ledger, LedgerError> {
        (**self).try_load()
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        (**self).save(ledger)
    }
}

/// Open the store selected by `config`.
pub fn open_store(config: &LedgerConfig) -> Result<Box<dyn LedgerStore + Send>, LedgerError> {
    let store: Box<dyn LedgerStore + Send> = match config.backend {
        LedgerBackend::Json => Box::new(JsonFileLedgerStore::new(&config.path)),
        LedgerBackend::Sqlite => Box::new(SqliteLedgerStore::open(&config.path, &config.key)?),
        LedgerBackend::Memory => Box::new(MemoryLedgerStore::new()),
    };
    Ok(store)
}
