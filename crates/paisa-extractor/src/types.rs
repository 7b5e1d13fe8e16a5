//! Request and candidate types for extraction

use paisa_domain::{Category, TxnType};
use paisa_llm::ProviderChoice;
use serde::{Deserialize, Serialize};

/// Request to extract transactions from decoded statement text
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    /// Decoded statement content; consumed once
    pub content: String,

    /// The authenticated user the transactions will belong to
    pub user_id: String,

    /// Provider preference for this request
    pub provider: ProviderChoice,
}

impl ExtractionRequest {
    /// Build a request with auto provider selection
    pub fn new(content: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            user_id: user_id.into(),
            provider: ProviderChoice::Auto,
        }
    }

    /// Override the provider preference
    pub fn with_provider(mut self, provider: ProviderChoice) -> Self {
        self.provider = provider;
        self
    }
}

/// A transaction as emitted by the model, untrusted until materialized
///
/// Every field is optional at this stage. `description`, `amount`, and
/// `type` are mandatory for persistence; a record missing any of them is
/// dropped by the materializer, not treated as a fatal error. A field that
/// is present but has the wrong shape (say, an unknown category name) fails
/// this record's deserialization and drops it at the parser instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    /// Short narration from the statement row
    #[serde(default)]
    pub description: Option<String>,

    /// Transaction amount
    #[serde(default)]
    pub amount: Option<f64>,

    /// income or expense
    #[serde(rename = "type", default)]
    pub txn_type: Option<TxnType>,

    /// Advisory category from the prompt's keyword mapping
    #[serde(default)]
    pub category: Option<Category>,

    /// Statement date, expected YYYY-MM-DD
    #[serde(default)]
    pub date: Option<String>,

    /// Merchant derived from the narration
    #[serde(default)]
    pub merchant: Option<String>,

    /// Currency code; absent means the INR default applies
    #[serde(default)]
    pub currency: Option<String>,
}

impl RawTransaction {
    /// Whether the mandatory persistence fields are all present
    pub fn has_required_fields(&self) -> bool {
        self.description.is_some() && self.amount.is_some() && self.txn_type.is_some()
    }

    /// The cross-chunk deduplication key: (date, description, amount)
    pub fn dedup_key(&self) -> (String, String, u64) {
        (
            self.date.clone().unwrap_or_default(),
            self.description.clone().unwrap_or_default(),
            self.amount.unwrap_or_default().to_bits(),
        )
    }
}
