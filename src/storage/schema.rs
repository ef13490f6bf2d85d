//! Database schema creation and migrations.

use rusqlite::{Connection, Result};

/// Create the ledger tables and indexes.
pub fn create_tables(conn: &Connection) -> Result<()> {
    // One row per comparison entry; position keeps creation order per ledger
    conn.execute(
        "CREATE TABLE IF NOT EXISTS ledger_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ledger_key TEXT NOT NULL,
            position INTEGER NOT NULL,
            entry_id TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            creative_a_id TEXT NOT NULL,
            creative_b_id TEXT NOT NULL,
            winner TEXT NOT NULL,
            payload TEXT NOT NULL,
            UNIQUE (ledger_key, entry_id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_position ON ledger_entries(ledger_key, position)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_creative_a ON ledger_entries(creative_a_id)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_creative_b ON ledger_entries(creative_b_id)",
        [],
    )?;

    Ok(())
}
