use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::model::Transaction;

/// Debit totals grouped by how many installments remain, plus everything
/// that was paid in one go.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallmentSummary {
    pub buckets: BTreeMap<i64, f64>,
    pub expenses: f64,
}

impl InstallmentSummary {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        let mut summary = Self::default();
        for tx in transactions.iter().filter(|tx| tx.is_debit()) {
            match tx.months_left() {
                Some(months) => *summary.buckets.entry(months).or_insert(0.0) += tx.amount,
                None => summary.expenses += tx.amount,
            }
        }
        summary
    }

    /// `(months, sum)` rows in ascending months order.
    pub fn rows(&self) -> Vec<(i64, f64)> {
        self.buckets.iter().map(|(m, s)| (*m, *s)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.expenses == 0.0
    }
}
