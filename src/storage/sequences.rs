use redb::{ReadableTable, WriteTransaction};

use super::db::{Database, DatabaseError};
use super::tables::SEQUENCES;

pub const USERS_SEQUENCE: &str = "users";
pub const ITEMS_SEQUENCE: &str = "items";

impl Database {
    /// Atomically advance the named counter and return the new value.
    ///
    /// Counters start at 0, so the first value handed out is 1. redb admits a
    /// single write transaction at a time, which makes the increment atomic
    /// across concurrent callers.
    pub fn next_sequence(&self, name: &str) -> Result<u64, DatabaseError> {
        let write_txn = self.begin_write()?;
        let next = bump_sequence(&write_txn, name)?;
        write_txn.commit()?;
        Ok(next)
    }

    /// Last value handed out for the counter (0 if it was never used)
    pub fn current_sequence(&self, name: &str) -> Result<u64, DatabaseError> {
        let read_txn = self.begin_read()?;
        let table = read_txn.open_table(SEQUENCES)?;
        let current = table.get(name)?.map(|v| v.value()).unwrap_or(0);
        Ok(current)
    }
}

/// Increment a counter inside an existing write transaction.
///
/// Entity inserts use this so the id is only consumed if the insert commits.
pub(super) fn bump_sequence(txn: &WriteTransaction, name: &str) -> Result<u64, DatabaseError> {
    let mut table = txn.open_table(SEQUENCES)?;
    let current = table.get(name)?.map(|v| v.value()).unwrap_or(0);
    let next = current + 1;
    table.insert(name, next)?;
    Ok(next)
}
