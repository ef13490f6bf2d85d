//! Error taxonomy for the testing-log ledger.

use thiserror::Error;

/// Errors raised by the pairing engine, the ledger stores and the cycle service.
///
/// Only `InvalidInput` is fatal to a comparison cycle. Read failures are
/// absorbed by [`crate::storage::LedgerStore::load`] and write failures are
/// reported on [`crate::testing_log::CycleOutcome`] instead of being returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Malformed creative batch or payload
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Stored ledger could not be read or parsed
    #[error("storage read failure: {0}")]
    StorageRead(String),

    /// Ledger could not be persisted; prior state is untouched
    #[error("storage write failure: {0}")]
    StorageWrite(String),
}

impl LedgerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        LedgerError::InvalidInput(msg.into())
    }

    pub fn read(err: impl std::fmt::Display) -> Self {
        LedgerError::StorageRead(err.to_string())
    }

    pub fn write(err: impl std::fmt::Display) -> Self {
        LedgerError::StorageWrite(err.to_string())
    }

    /// True for the storage variants, which never stop a cycle
    pub fn is_storage(&self) -> bool {
        matches!(self, LedgerError::StorageRead(_) | LedgerError::StorageWrite(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_failure_kind() {
        assert_eq!(
            LedgerError::invalid_input("empty id").to_string(),
            "invalid input: empty id"
        );
        assert_eq!(
            LedgerError::write("disk full").to_string(),
            "storage write failure: disk full"
        );
    }

    #[test]
    fn test_storage_classification() {
        assert!(LedgerError::read("x").is_storage());
        assert!(LedgerError::write("x").is_storage());
        assert!(!LedgerError::invalid_input("x").is_storage());
    }
}
