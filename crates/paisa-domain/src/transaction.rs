//! Transaction module - the persisted unit of extracted statement data

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default currency applied when the statement does not state one
pub const DEFAULT_CURRENCY: &str = "INR";

/// Unique identifier for a transaction based on UUIDv7
///
/// UUIDv7 provides:
/// - Chronological sortability for temporal queries
/// - 128-bit uniqueness
/// - No coordination required for generation during an upload batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(u128);

impl TransactionId {
    /// Generate a new UUIDv7-based TransactionId
    ///
    /// # Examples
    ///
    /// ```
    /// use paisa_domain::TransactionId;
    ///
    /// let id = TransactionId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a TransactionId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a TransactionId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUIDv7 string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl Serialize for TransactionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TransactionId::from_string(&s).map_err(serde::de::Error::custom)
    }
}

/// Direction of money movement
///
/// Credits on the statement become `Income`, debits become `Expense`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    /// Credit entry (Cr column)
    Income,
    /// Debit entry (Dr column)
    Expense,
}

impl fmt::Display for TxnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxnType::Income => write!(f, "income"),
            TxnType::Expense => write!(f, "expense"),
        }
    }
}

/// Spending category assigned during extraction
///
/// The model picks a value from a fixed keyword mapping; the value is
/// advisory and only checked for enum membership downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Salary and other recurring credits
    Salary,
    /// Restaurants and food delivery
    Food,
    /// Cabs, fuel, metro
    Transport,
    /// Bills and recurring services
    Utilities,
    /// Gaming, streaming, outings
    Entertainment,
    /// Retail purchases
    Shopping,
    /// Medical and pharmacy
    Healthcare,
    /// Everything else, including bare transfers
    Other,
}

impl Default for Category {
    fn default() -> Self {
        Category::Other
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Salary => "salary",
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Utilities => "utilities",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Healthcare => "healthcare",
            Category::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// A persisted transaction extracted from a bank statement
///
/// Owned exclusively by its user. Created only by the materializer during a
/// statement upload; mutated or deleted afterwards by direct user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// Owning user (opaque identifier from the auth layer)
    pub user_id: String,

    /// Short narration, e.g. "UPI/LILA PITTURA DECO"
    pub description: String,

    /// Transaction amount, always positive; direction lives in `txn_type`
    pub amount: f64,

    /// ISO currency code, defaults to INR
    pub currency: String,

    /// Income or expense
    #[serde(rename = "type")]
    pub txn_type: TxnType,

    /// Advisory spending category
    pub category: Category,

    /// Transaction date; defaults to upload time when unparsable
    pub date: DateTime<Utc>,

    /// Counterparty name derived from the narration, when available
    pub merchant: Option<String>,

    /// When this record was created
    pub created_at: DateTime<Utc>,
}
