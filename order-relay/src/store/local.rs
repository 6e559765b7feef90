//! redb-backed local order storage
//!
//! One table, one fixed key, holding the JSON-serialized order array.
//! The stored format is exactly the wire `Order` shape — no envelope
//! or version tag — so the local set and the remote set stay
//! byte-compatible.
//!
//! # Durability
//!
//! redb commits are persistent as soon as `commit()` returns
//! (copy-on-write with atomic pointer swap), which is what makes the
//! write-through guarantee meaningful on devices that lose power or
//! get killed mid-session.
//!
//! # Concurrency
//!
//! This store has a single logical owner (`OrderStore`) and is not
//! meant to be driven from multiple call sites; multi-process use
//! would need explicit coordination on top.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use shared::Order;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table holding the serialized order list: key = slot name, value = JSON bytes
const RECORDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// The single slot the order array lives under
const ORDERS_KEY: &str = "orders";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable local order list backed by redb
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Database>,
}

impl LocalStore {
    /// Open or create the database at the given path
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(db)
    }

    fn init_tables(db: Database) -> StorageResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RECORDS_TABLE)?;
        }
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Load the full order list.
    ///
    /// An absent slot or a corrupt payload yields the empty list; only
    /// the storage medium itself can produce an error.
    pub fn load(&self) -> StorageResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(RECORDS_TABLE)?;

        match table.get(ORDERS_KEY)? {
            Some(value) => Ok(serde_json::from_slice(value.value()).unwrap_or_else(|e| {
                tracing::warn!("Corrupt order list in local storage, starting empty: {e}");
                Vec::new()
            })),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the stored list wholesale
    pub fn save_all(&self, orders: &[Order]) -> StorageResult<()> {
        let value = serde_json::to_vec(orders)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(RECORDS_TABLE)?;
            table.insert(ORDERS_KEY, value.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Insert an order, replacing any existing order with the same id
    pub fn upsert(&self, order: &Order) -> StorageResult<()> {
        let mut orders = self.load()?;
        match orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order.clone(),
            None => orders.push(order.clone()),
        }
        self.save_all(&orders)
    }

    /// Set the status of the order with the given id.
    ///
    /// Returns `false` when no such order exists.
    pub fn update_status(&self, id: i64, status: &str) -> StorageResult<bool> {
        let mut orders = self.load()?;
        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            return Ok(false);
        };
        order.status = status.to_string();
        self.save_all(&orders)?;
        Ok(true)
    }

    /// Remove the order with the given id.
    ///
    /// Returns `true` iff the set shrank.
    pub fn delete(&self, id: i64) -> StorageResult<bool> {
        let mut orders = self.load()?;
        let before = orders.len();
        orders.retain(|o| o.id != id);
        if orders.len() == before {
            return Ok(false);
        }
        self.save_all(&orders)?;
        Ok(true)
    }

    /// Drop every stored order
    pub fn clear(&self) -> StorageResult<()> {
        self.save_all(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: i64, status: &str) -> Order {
        Order::new(id).with_status(status)
    }

    #[test]
    fn test_load_empty_store() {
        let store = LocalStore::open_in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let store = LocalStore::open_in_memory().unwrap();
        let orders = vec![order(1, "New"), order(2, "Shipped")];
        store.save_all(&orders).unwrap();
        assert_eq!(store.load().unwrap(), orders);
    }

    #[test]
    fn test_upsert_appends_then_replaces() {
        let store = LocalStore::open_in_memory().unwrap();

        store.upsert(&order(1, "New")).unwrap();
        store.upsert(&order(2, "New")).unwrap();
        assert_eq!(store.load().unwrap().len(), 2);

        store.upsert(&order(1, "Shipped")).unwrap();
        let orders = store.load().unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].status, "Shipped");
    }

    #[test]
    fn test_update_status_hit_and_miss() {
        let store = LocalStore::open_in_memory().unwrap();
        store.upsert(&order(5, "New")).unwrap();

        assert!(store.update_status(5, "Done").unwrap());
        assert_eq!(store.load().unwrap()[0].status, "Done");

        assert!(!store.update_status(99, "Done").unwrap());
    }

    #[test]
    fn test_delete_reports_shrinkage() {
        let store = LocalStore::open_in_memory().unwrap();
        store.upsert(&order(1, "New")).unwrap();

        assert!(store.delete(1).unwrap());
        assert!(!store.delete(1).unwrap());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_clear() {
        let store = LocalStore::open_in_memory().unwrap();
        store.upsert(&order(1, "New")).unwrap();
        store.upsert(&order(2, "New")).unwrap();

        store.clear().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_payload_loads_as_empty() {
        let store = LocalStore::open_in_memory().unwrap();

        let write_txn = store.db.begin_write().unwrap();
        {
            let mut table = write_txn.open_table(RECORDS_TABLE).unwrap();
            table.insert(ORDERS_KEY, b"definitely not json".as_slice()).unwrap();
        }
        write_txn.commit().unwrap();

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.redb");

        {
            let store = LocalStore::open(&path).unwrap();
            store.upsert(&order(7, "New")).unwrap();
        }

        let store = LocalStore::open(&path).unwrap();
        let orders = store.load().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id, 7);
    }
}
