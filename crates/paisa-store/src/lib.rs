//! Paisa Storage Layer
//!
//! Implements the `TransactionStore` trait using SQLite.
//!
//! # Architecture
//!
//! - SQLite for structured transaction data
//! - Per-user isolation via the `user_id` column; an upload only touches
//!   its own user's rows
//! - Indexed by (user, date descending) for retrieval ordering and by
//!   category for aggregate queries
//!
//! # Examples
//!
//! ```no_run
//! use paisa_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for transaction operations
//! ```

#![warn(missing_docs)]

use chrono::{DateTime, TimeZone, Utc};
use paisa_domain::traits::TransactionStore;
use paisa_domain::{Category, Transaction, TransactionId, TxnType};
use rusqlite::{params, Connection};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of TransactionStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// SqliteStore instance (the extraction pipeline wraps one in a mutex).
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use paisa_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("paisa.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Convert TransactionId to bytes for storage
    fn id_to_bytes(id: TransactionId) -> Vec<u8> {
        id.value().to_be_bytes().to_vec()
    }

    /// Convert bytes to TransactionId
    fn bytes_to_id(bytes: &[u8]) -> Result<TransactionId, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for TransactionId, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(TransactionId::from_value(u128::from_be_bytes(arr)))
    }

    fn txn_type_to_str(t: TxnType) -> &'static str {
        match t {
            TxnType::Income => "income",
            TxnType::Expense => "expense",
        }
    }

    fn str_to_txn_type(s: &str) -> Result<TxnType, StoreError> {
        match s {
            "income" => Ok(TxnType::Income),
            "expense" => Ok(TxnType::Expense),
            _ => Err(StoreError::InvalidData(format!(
                "Unknown transaction type: {}",
                s
            ))),
        }
    }

    fn category_to_str(c: Category) -> &'static str {
        match c {
            Category::Salary => "salary",
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Utilities => "utilities",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Healthcare => "healthcare",
            Category::Other => "other",
        }
    }

    fn str_to_category(s: &str) -> Result<Category, StoreError> {
        match s {
            "salary" => Ok(Category::Salary),
            "food" => Ok(Category::Food),
            "transport" => Ok(Category::Transport),
            "utilities" => Ok(Category::Utilities),
            "entertainment" => Ok(Category::Entertainment),
            "shopping" => Ok(Category::Shopping),
            "healthcare" => Ok(Category::Healthcare),
            "other" => Ok(Category::Other),
            _ => Err(StoreError::InvalidData(format!("Unknown category: {}", s))),
        }
    }

    fn timestamp_to_datetime(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
    }

    fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let id = Self::bytes_to_id(&id_bytes).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Blob, Box::new(e))
        })?;

        let txn_type_str: String = row.get(5)?;
        let txn_type = Self::str_to_txn_type(&txn_type_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let category_str: String = row.get(6)?;
        let category = Self::str_to_category(&category_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Transaction {
            id,
            user_id: row.get(1)?,
            description: row.get(2)?,
            amount: row.get(3)?,
            currency: row.get(4)?,
            txn_type,
            category,
            date: Self::timestamp_to_datetime(row.get(7)?),
            merchant: row.get(8)?,
            created_at: Self::timestamp_to_datetime(row.get(9)?),
        })
    }
}

impl TransactionStore for SqliteStore {
    type Error = StoreError;

    fn insert(&mut self, transaction: Transaction) -> Result<TransactionId, Self::Error> {
        let id_bytes = Self::id_to_bytes(transaction.id);

        self.conn.execute(
            "INSERT INTO transactions (id, user_id, description, amount, currency, txn_type, category, date, merchant, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &id_bytes,
                &transaction.user_id,
                &transaction.description,
                transaction.amount,
                &transaction.currency,
                Self::txn_type_to_str(transaction.txn_type),
                Self::category_to_str(transaction.category),
                transaction.date.timestamp(),
                &transaction.merchant,
                transaction.created_at.timestamp(),
            ],
        )?;

        Ok(transaction.id)
    }

    fn delete_for_user(&mut self, user_id: &str) -> Result<usize, Self::Error> {
        let deleted = self
            .conn
            .execute("DELETE FROM transactions WHERE user_id = ?1", params![user_id])?;
        Ok(deleted)
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, description, amount, currency, txn_type, category, date, merchant, created_at
             FROM transactions WHERE user_id = ?1 ORDER BY date DESC",
        )?;

        let transactions = stmt
            .query_map(params![user_id], Self::row_to_transaction)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    fn count_for_user(&self, user_id: &str) -> Result<usize, Self::Error> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(user: &str, day: u32, amount: f64) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            user_id: user.to_string(),
            description: format!("UPI/MERCHANT {}", day),
            amount,
            currency: "INR".to_string(),
            txn_type: TxnType::Expense,
            category: Category::Food,
            date: Utc.with_ymd_and_hms(2023, 9, day, 0, 0, 0).unwrap(),
            merchant: Some(format!("MERCHANT {}", day)),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_list() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let txn = sample("user-1", 6, 300.0);
        let id = store.insert(txn.clone()).unwrap();
        assert_eq!(id, txn.id);

        let listed = store.list_for_user("user-1").unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].description, txn.description);
        assert_eq!(listed[0].amount, 300.0);
        assert_eq!(listed[0].txn_type, TxnType::Expense);
        assert_eq!(listed[0].category, Category::Food);
        assert_eq!(listed[0].merchant, txn.merchant);
    }

    #[test]
    fn test_list_orders_newest_first() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.insert(sample("user-1", 3, 10.0)).unwrap();
        store.insert(sample("user-1", 9, 20.0)).unwrap();
        store.insert(sample("user-1", 6, 30.0)).unwrap();

        let listed = store.list_for_user("user-1").unwrap();
        let days: Vec<u32> = listed
            .iter()
            .map(|t| t.date.format("%d").to_string().parse().unwrap())
            .collect();
        assert_eq!(days, vec![9, 6, 3]);
    }

    #[test]
    fn test_delete_for_user_is_isolated() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.insert(sample("user-1", 1, 10.0)).unwrap();
        store.insert(sample("user-1", 2, 20.0)).unwrap();
        store.insert(sample("user-2", 3, 30.0)).unwrap();

        let deleted = store.delete_for_user("user-1").unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(store.count_for_user("user-1").unwrap(), 0);
        assert_eq!(store.count_for_user("user-2").unwrap(), 1);
    }

    #[test]
    fn test_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paisa.db");

        {
            let mut store = SqliteStore::new(&path).unwrap();
            store.insert(sample("user-1", 6, 300.0)).unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        assert_eq!(store.count_for_user("user-1").unwrap(), 1);
    }
}
