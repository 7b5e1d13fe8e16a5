//! Turn model candidates into persisted transactions
//!
//! The materializer is the trust boundary between model output and the
//! store. Records missing any of the mandatory fields (description, amount,
//! type) are skipped with a warning; optional fields get defaults. A batch
//! where nothing survives is an error, not a silent success.

use crate::config::UploadPolicy;
use crate::error::ExtractError;
use crate::types::RawTransaction;
use chrono::{DateTime, NaiveDate, Utc};
use paisa_domain::{Transaction, TransactionId, TransactionStore, TxnType, DEFAULT_CURRENCY};
use std::fmt::Display;
use tracing::{info, warn};

/// Summary of one materialized upload batch
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializeOutcome {
    /// Records written to the store, in extraction order
    pub transactions: Vec<Transaction>,
    /// Candidates dropped for missing mandatory fields
    pub skipped: usize,
    /// Prior transactions removed under the replace policy
    pub replaced: usize,
}

impl MaterializeOutcome {
    /// Number of records written to the store
    pub fn inserted(&self) -> usize {
        self.transactions.len()
    }
}

/// Writes extracted candidates to a transaction store
pub struct Materializer {
    policy: UploadPolicy,
}

impl Materializer {
    /// Create a materializer with the given upload policy
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    /// Persist a batch of candidates for one user
    ///
    /// Under `UploadPolicy::Replace` the user's existing transactions are
    /// deleted first, so a failed extraction never reaches this point with
    /// the history already gone.
    pub fn materialize<S>(
        &self,
        store: &mut S,
        user_id: &str,
        candidates: Vec<RawTransaction>,
    ) -> Result<MaterializeOutcome, ExtractError>
    where
        S: TransactionStore,
        S::Error: Display,
    {
        let replaced = match self.policy {
            UploadPolicy::Replace => store
                .delete_for_user(user_id)
                .map_err(|e| ExtractError::Store(e.to_string()))?,
            UploadPolicy::Append => 0,
        };

        let mut transactions = Vec::with_capacity(candidates.len());
        let mut skipped = 0;

        for candidate in candidates {
            if !candidate.has_required_fields() {
                warn!(
                    description = candidate.description.as_deref().unwrap_or("<none>"),
                    "Skipping transaction with missing required fields"
                );
                skipped += 1;
                continue;
            }

            let txn = materialize_one(user_id, candidate);
            store
                .insert(txn.clone())
                .map_err(|e| ExtractError::Store(e.to_string()))?;
            transactions.push(txn);
        }

        if transactions.is_empty() {
            return Err(ExtractError::NoValidTransactions);
        }

        info!(
            user_id,
            inserted = transactions.len(),
            skipped,
            replaced,
            "Materialized statement upload"
        );
        Ok(MaterializeOutcome {
            transactions,
            skipped,
            replaced,
        })
    }
}

/// Build one transaction from a candidate known to carry the mandatory
/// fields; defaults fill the rest
fn materialize_one(user_id: &str, candidate: RawTransaction) -> Transaction {
    let date = candidate
        .date
        .as_deref()
        .and_then(parse_statement_date)
        .unwrap_or_else(Utc::now);

    Transaction {
        id: TransactionId::new(),
        user_id: user_id.to_string(),
        description: candidate.description.unwrap_or_default(),
        amount: candidate.amount.unwrap_or_default(),
        currency: candidate
            .currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        txn_type: candidate.txn_type.unwrap_or(TxnType::Expense),
        category: candidate.category.unwrap_or_default(),
        date,
        merchant: candidate.merchant.filter(|m| !m.is_empty()),
        created_at: Utc::now(),
    }
}

/// Parse the prompt's YYYY-MM-DD date format into UTC midnight
fn parse_statement_date(s: &str) -> Option<DateTime<Utc>> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone};
    use paisa_domain::{Category, TxnType};
    use std::collections::HashMap;

    /// Minimal in-memory store for materializer tests
    #[derive(Default)]
    struct MemStore {
        rows: HashMap<String, Vec<Transaction>>,
    }

    impl TransactionStore for MemStore {
        type Error = std::convert::Infallible;

        fn insert(&mut self, txn: Transaction) -> Result<TransactionId, Self::Error> {
            let id = txn.id;
            self.rows.entry(txn.user_id.clone()).or_default().push(txn);
            Ok(id)
        }

        fn delete_for_user(&mut self, user_id: &str) -> Result<usize, Self::Error> {
            Ok(self.rows.remove(user_id).map(|v| v.len()).unwrap_or(0))
        }

        fn list_for_user(&self, user_id: &str) -> Result<Vec<Transaction>, Self::Error> {
            Ok(self.rows.get(user_id).cloned().unwrap_or_default())
        }

        fn count_for_user(&self, user_id: &str) -> Result<usize, Self::Error> {
            Ok(self.rows.get(user_id).map(|v| v.len()).unwrap_or(0))
        }
    }

    fn candidate(json: &str) -> RawTransaction {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_complete_candidate_is_persisted() {
        let mut store = MemStore::default();
        let outcome = Materializer::new(UploadPolicy::Append)
            .materialize(
                &mut store,
                "user-1",
                vec![candidate(
                    r#"{"description":"UPI/LILA PITTURA DECO","amount":300,"type":"income",
                        "category":"other","date":"2023-09-06","merchant":"LILA PITTURA DECO",
                        "currency":"INR"}"#,
                )],
            )
            .unwrap();

        assert_eq!(outcome.inserted(), 1);
        assert_eq!(outcome.skipped, 0);

        let rows = store.list_for_user("user-1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 300.0);
        assert_eq!(rows[0].txn_type, TxnType::Income);
        assert_eq!(rows[0].merchant.as_deref(), Some("LILA PITTURA DECO"));
        assert_eq!(
            rows[0].date,
            Utc.with_ymd_and_hms(2023, 9, 6, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_required_field_is_skipped() {
        let mut store = MemStore::default();
        let outcome = Materializer::new(UploadPolicy::Append)
            .materialize(
                &mut store,
                "user-1",
                vec![
                    candidate(r#"{"description":"good","amount":10,"type":"expense"}"#),
                    candidate(r#"{"description":"no amount","type":"expense"}"#),
                ],
            )
            .unwrap();

        assert_eq!(outcome.inserted(), 1);
        assert_eq!(outcome.skipped, 1);
        assert_eq!(store.count_for_user("user-1").unwrap(), 1);
    }

    #[test]
    fn test_all_skipped_is_an_error() {
        let mut store = MemStore::default();
        let result = Materializer::new(UploadPolicy::Append).materialize(
            &mut store,
            "user-1",
            vec![candidate(r#"{"description":"no amount or type"}"#)],
        );

        assert!(matches!(result, Err(ExtractError::NoValidTransactions)));
        assert_eq!(store.count_for_user("user-1").unwrap(), 0);
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let mut store = MemStore::default();
        Materializer::new(UploadPolicy::Append)
            .materialize(
                &mut store,
                "user-1",
                vec![candidate(r#"{"description":"bare","amount":5,"type":"expense"}"#)],
            )
            .unwrap();

        let rows = store.list_for_user("user-1").unwrap();
        assert_eq!(rows[0].currency, DEFAULT_CURRENCY);
        assert_eq!(rows[0].category, Category::Other);
        assert!(rows[0].merchant.is_none());
        // Unparsable/absent date falls back to now
        assert_eq!(rows[0].date.year(), Utc::now().year());
    }

    #[test]
    fn test_unparsable_date_falls_back_to_now() {
        let mut store = MemStore::default();
        Materializer::new(UploadPolicy::Append)
            .materialize(
                &mut store,
                "user-1",
                vec![candidate(
                    r#"{"description":"d","amount":5,"type":"expense","date":"06-09-2023"}"#,
                )],
            )
            .unwrap();

        let rows = store.list_for_user("user-1").unwrap();
        assert!(rows[0].date >= Utc::now() - chrono::Duration::minutes(1));
    }

    #[test]
    fn test_replace_policy_clears_prior_history() {
        let mut store = MemStore::default();
        let materializer = Materializer::new(UploadPolicy::Replace);

        materializer
            .materialize(
                &mut store,
                "user-1",
                vec![candidate(r#"{"description":"first","amount":1,"type":"expense"}"#)],
            )
            .unwrap();
        let outcome = materializer
            .materialize(
                &mut store,
                "user-1",
                vec![candidate(r#"{"description":"second","amount":2,"type":"expense"}"#)],
            )
            .unwrap();

        assert_eq!(outcome.replaced, 1);
        let rows = store.list_for_user("user-1").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "second");
    }

    #[test]
    fn test_append_policy_keeps_prior_history() {
        let mut store = MemStore::default();
        let materializer = Materializer::new(UploadPolicy::Append);

        for _ in 0..2 {
            materializer
                .materialize(
                    &mut store,
                    "user-1",
                    vec![candidate(r#"{"description":"d","amount":1,"type":"expense"}"#)],
                )
                .unwrap();
        }

        assert_eq!(store.count_for_user("user-1").unwrap(), 2);
    }

    #[test]
    fn test_users_are_isolated_under_replace() {
        let mut store = MemStore::default();
        let materializer = Materializer::new(UploadPolicy::Replace);

        materializer
            .materialize(
                &mut store,
                "user-a",
                vec![candidate(r#"{"description":"a","amount":1,"type":"expense"}"#)],
            )
            .unwrap();
        materializer
            .materialize(
                &mut store,
                "user-b",
                vec![candidate(r#"{"description":"b","amount":2,"type":"expense"}"#)],
            )
            .unwrap();

        assert_eq!(store.count_for_user("user-a").unwrap(), 1);
        assert_eq!(store.count_for_user("user-b").unwrap(), 1);
    }
}
