//! Paisa Domain Layer
//!
//! This crate contains the core domain model for Paisa: the transaction
//! entity produced by statement extraction, its value objects, and the
//! trait interface to the persistence layer. It carries no infrastructure
//! concerns; store and provider implementations live in other crates.
//!
//! ## Key Concepts
//!
//! - **Transaction**: a single validated bank-statement row, owned by a user
//! - **TxnType**: income (credit) or expense (debit)
//! - **Category**: advisory spending category assigned during extraction
//! - **TransactionStore**: the persistence boundary trait

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod transaction;
pub mod traits;

// Re-exports for convenience
pub use transaction::{Category, Transaction, TransactionId, TxnType, DEFAULT_CURRENCY};
pub use traits::TransactionStore;
