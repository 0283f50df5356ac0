//! SQLite implementation of the store traits.
//!
//! This is the persistent backend for account data. It uses rusqlite with
//! bundled SQLite; every batch is written inside one transaction.

use std::path::Path;
use std::sync::Mutex;

use bytes::Bytes;
use rusqlite::{params, Connection, OptionalExtension};

use profile_guard_core::{DataKey, WriteBatch};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{DataRead, DataStore};

/// SQLite-based store implementation.
///
/// Thread-safe via an internal Mutex around the single connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of stored (non-empty) entries.
    pub fn len(&self) -> Result<usize> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row("SELECT COUNT(*) FROM account_data", [], |row| row.get(0))?;
            Ok(n as usize)
        })
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }

    fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut conn)
    }
}

fn read_value(conn: &Connection, key: &DataKey) -> Result<Bytes> {
    let value: Option<Vec<u8>> = conn
        .query_row(
            "SELECT value FROM account_data WHERE data_key = ?1",
            params![key.as_bytes().as_slice()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value.map(Bytes::from).unwrap_or_default())
}

impl DataRead for SqliteStore {
    fn get(&self, key: &DataKey) -> Result<Bytes> {
        self.with_conn(|conn| read_value(conn, key))
    }

    fn get_many(&self, keys: &[DataKey]) -> Result<Vec<Bytes>> {
        self.with_conn(|conn| keys.iter().map(|key| read_value(conn, key)).collect())
    }
}

impl DataStore for SqliteStore {
    fn apply(&self, batch: &WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let now = migration::now_millis();
            {
                let mut upsert = tx.prepare_cached(
                    "INSERT INTO account_data (data_key, value, updated_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(data_key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                )?;
                let mut delete = tx.prepare_cached("DELETE FROM account_data WHERE data_key = ?1")?;

                for (key, value) in batch.iter() {
                    let key = key.as_bytes().as_slice();
                    if value.is_empty() {
                        delete.execute(params![key])?;
                    } else {
                        upsert.execute(params![key, value.as_ref(), now])?;
                    }
                }
            }
            tx.commit()?;
            tracing::trace!(writes = batch.len(), "committed batch");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn key(n: u8) -> DataKey {
        DataKey::from_bytes([n; 32])
    }

    #[test]
    fn test_set_get_delete() {
        let store = SqliteStore::open_memory().unwrap();
        store.set(key(1), Bytes::from_static(b"hello")).unwrap();
        assert_eq!(store.get(&key(1)).unwrap().as_ref(), b"hello");

        store.set(key(1), Bytes::new()).unwrap();
        assert!(store.get(&key(1)).unwrap().is_empty());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_batch_last_write_wins() {
        let store = SqliteStore::open_memory().unwrap();
        let mut batch = WriteBatch::new();
        batch
            .put(key(1), Bytes::from_static(b"a"))
            .put(key(2), Bytes::from_static(b"b"))
            .put(key(1), Bytes::from_static(b"c"));
        store.apply(&batch).unwrap();

        assert_eq!(store.get(&key(1)).unwrap().as_ref(), b"c");
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("profile.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store
                .set_many(
                    &[key(1), key(2)],
                    &[Bytes::from_static(b"one"), Bytes::from_static(b"two")],
                )
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let values = store.get_many(&[key(1), key(2)]).unwrap();
        assert_eq!(values[0].as_ref(), b"one");
        assert_eq!(values[1].as_ref(), b"two");
    }

    #[test]
    fn test_length_mismatch_writes_nothing() {
        let store = SqliteStore::open_memory().unwrap();
        assert!(store.set_many(&[key(1)], &[]).is_err());
        assert!(store.is_empty().unwrap());
    }
}
