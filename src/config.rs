//! Ledger configuration and environment variable parsing.
//!
//! This module holds the default storage locations and reads the
//! `LEDGER_*` environment variables that choose where the testing log lives.

use std::path::PathBuf;

/// Default JSON ledger file
pub const DEFAULT_JSON_PATH: &str = ".testing_log.json";

/// Default SQLite database file
pub const DEFAULT_SQLITE_PATH: &str = "testing_log.db";

/// Default ledger key (namespace inside a shared database)
pub const DEFAULT_LEDGER_KEY: &str = "signalone_testing_log";

/// Log file written by the binaries
pub const LOG_FILE_NAME: &str = "signalone.log";

/// Pairing debug output (set DEBUG_PAIRING=1 to enable)
/// When enabled, logs every pair's verdict and any dropped trailing creative.
/// Default: false
pub fn debug_pairing_enabled() -> bool {
    static CACHED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| env_flag("DEBUG_PAIRING").unwrap_or(false))
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.to_lowercase() == "true")
}

/// Storage medium backing the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
    /// Pretty-printed JSON file, replaced atomically on save
    Json,
    /// SQLite database, one ledger per key
    Sqlite,
    /// Process memory only (nothing survives exit)
    Memory,
}

impl LedgerBackend {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" | "file" => Some(LedgerBackend::Json),
            "sqlite" | "db" => Some(LedgerBackend::Sqlite),
            "memory" | "mem" => Some(LedgerBackend::Memory),
            _ => None,
        }
    }
}

impl std::fmt::Display for LedgerBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerBackend::Json => write!(f, "json"),
            LedgerBackend::Sqlite => write!(f, "sqlite"),
            LedgerBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Ledger configuration from environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Storage medium (LEDGER_BACKEND)
    pub backend: LedgerBackend,

    /// File path for json/sqlite backends (LEDGER_PATH)
    pub path: PathBuf,

    /// Ledger namespace (LEDGER_KEY)
    pub key: String,

    /// Fill missing metrics from raw counters before pairing (LEDGER_ENRICH)
    pub enrich: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            backend: LedgerBackend::Json,
            path: PathBuf::from(DEFAULT_JSON_PATH),
            key: DEFAULT_LEDGER_KEY.to_string(),
            enrich: true,
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup; unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("LEDGER_BACKEND")
            .and_then(|v| LedgerBackend::parse(&v))
            .unwrap_or(LedgerBackend::Json);

        let path = lookup("LEDGER_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| match backend {
                LedgerBackend::Sqlite => PathBuf::from(DEFAULT_SQLITE_PATH),
                _ => PathBuf::from(DEFAULT_JSON_PATH),
            });

        let key = lookup("LEDGER_KEY")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LEDGER_KEY.to_string());

        let enrich = lookup("LEDGER_ENRICH")
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(true); // on by default

        Self {
            backend,
            path,
            key,
            enrich,
        }
    }
}
