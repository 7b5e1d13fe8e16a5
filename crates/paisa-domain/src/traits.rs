//! Trait definitions for external interactions
//!
//! These traits define the boundary between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::{Transaction, TransactionId};

/// Trait for storing and retrieving transactions
///
/// Implemented by the infrastructure layer (paisa-store). Per-user isolation
/// is enforced by the `user_id` field on every record; an upload touches
/// only its own user's rows.
pub trait TransactionStore {
    /// Error type for store operations
    type Error;

    /// Insert a transaction, returning its id
    fn insert(&mut self, transaction: Transaction) -> Result<TransactionId, Self::Error>;

    /// Delete every transaction belonging to a user, returning the count removed
    fn delete_for_user(&mut self, user_id: &str) -> Result<usize, Self::Error>;

    /// List a user's transactions, newest statement date first
    fn list_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, Self::Error>;

    /// Count a user's transactions
    fn count_for_user(&self, user_id: &str) -> Result<usize, Self::Error>;
}
