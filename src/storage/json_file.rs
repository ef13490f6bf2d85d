//! JSON file ledger store.
//!
//! Saves write the whole ledger to a sibling temp file, sync it, then rename it
//! over the target, so readers only ever see the old or the new ledger.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::storage::LedgerStore;
use crate::types::Ledger;

#[derive(Debug, Clone)]
pub struct JsonFileLedgerStore {
    path: PathBuf,
}

impl JsonFileLedgerStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_temp(&self, tmp: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = File::create(tmp)?;
        file.write_all(data)?;
        file.sync_all()
    }
}

impl LedgerStore for JsonFileLedgerStore {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    fn try_load(&self) -> Result<Ledger, LedgerError> {
        let data = match fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("[STORAGE] No ledger at {}, starting empty", self.path.display());
                return Ok(Ledger::new());
            }
            Err(e) => {
                return Err(LedgerError::read(format!("{}: {}", self.path.display(), e)));
            }
        };

        serde_json::from_str(&data)
            .map_err(|e| LedgerError::read(format!("{}: {}", self.path.display(), e)))
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerError> {
        let data = serde_json::to_string_pretty(ledger).map_err(LedgerError::write)?;
        let tmp = self.temp_path();

        if let Err(e) = self.write_temp(&tmp, data.as_bytes()) {
            let _ = fs::remove_file(&tmp);
            return Err(LedgerError::write(format!("{}: {}", tmp.display(), e)));
        }

        if let Err(e) = fs::rename(&tmp, &self.path) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                warn!("[STORAGE] Could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(LedgerError::write(format!("{}: {}", self.path.display(), e)));
        }

        debug!(
            "[STORAGE] Wrote {} entries to {}",
            ledger.len(),
            self.path.display()
        );
        Ok(())
    }
}
