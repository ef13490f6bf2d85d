//! SQLite ledger store.
//!
//! Several ledgers can share one database; rows are namespaced by ledger key.
//! A save replaces the key's rows inside a single transaction, so a failed
//! save rolls back and the previous ledger stays readable.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, info};

use super::schema::create_tables;
use crate::error::LedgerError;
use crate::storage::LedgerStore;
use crate::types::{ComparisonEntry, Ledger};

pub struct SqliteLedgerStore {
    conn: Mutex<Connection>,
    key: String,
}

impl SqliteLedgerStore {
    /// Open (or create) the database at `path` for the ledger named `key`.
    pub fn open(path: impl AsRef<Path>, key: &str) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .map_err(|e| LedgerError::read(format!("open {}: {}", path.display(), e)))?;
        let store = Self::with_connection(conn, key)?;
        info!("[STORAGE] Ledger database initialized at {} (key {})", path.display(), key);
        Ok(store)
    }

    /// Private in-memory database, gone when the store is dropped.
    pub fn open_in_memory(key: &str) -> Result<Self, LedgerError> {
        let conn = Connection::open_in_memory().map_err(LedgerError::read)?;
        Self::with_connection(conn, key)
    }

    fn with_connection(conn: Connection, key: &str) -> Result<Self, LedgerError> {
        create_tables(&conn)
            .map_err(|e| LedgerError::read(format!("create tables: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
            key: key.to_string(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn insert_entry(
        conn: &Connection,
        key: &str,
        position: usize,
        entry: &ComparisonEntry,
    ) -> Result<(), LedgerError> {
        let payload = serde_json::to_string(entry).map_err(LedgerError::write)?;
        conn.execute(
            "INSERT INTO ledger_entries (ledger_key, position, entry_id, created_at, creative_a_id, creative_b_id, winner, payload)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                key,
                position as i64,
                entry.id(),
                entry.created_at(),
                entry.creative_a().id,
                entry.creative_b().id,
                entry.winner().to_string(),
                payload,
            ],
        )
        .map_err(|e| LedgerError::write(format!("insert {}: {}", entry.id(), e)))?;
        Ok(())
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn try_load(&self) -> Result<Ledger, LedgerError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| LedgerError::read("connection lock poisoned"))?;

        let mut stmt = conn
            .prepare("SELECT payload FROM ledger_entries WHERE ledger_key = ?1 ORDER BY position")
            .map_err(LedgerError::read)?;
        let payloads = stmt
            .query_map([&self.key], |row| row.get::<_, String>(0))
            .map_err(LedgerError::read)?
            .collect::<Result<Vec<String>, _>>()
            .map_err(LedgerError::read)?;

        let entries = payloads
            .iter()
            .map(|p| serde_json::from_str::<ComparisonEntry>(p))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LedgerError::read(format!("malformed entry payload: {}", e)))?;

        Ok(Ledger::from_entries(entries))
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| LedgerError::write("connection lock poisoned"))?;

        // Dropping the transaction on any early return rolls it back
        let tx = conn.unchecked_transaction().map_err(LedgerError::write)?;

        tx.execute("DELETE FROM ledger_entries WHERE ledger_key = ?1", [&self.key])
            .map_err(LedgerError::write)?;

        for (position, entry) in ledger.iter().enumerate() {
            Self::insert_entry(&tx, &self.key, position, entry)?;
        }

        tx.commit()
            .map_err(|e| LedgerError::write(format!("commit: {}", e)))?;

        debug!("[STORAGE] Saved {} entries under key {}", ledger.len(), self.key);
        Ok(())
    }
}
