use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::rules::RuleSet;
use crate::domain::summary::InstallmentSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
}

/// One statement line item.
///
/// Amounts are signed: debits are negative, credits positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub header_date: Option<NaiveDate>,
    pub details: String,
    pub installment: Option<u32>,
    pub installment_count: Option<u32>,
    pub store: String,
    pub category: Option<String>,
    pub transaction_nr: String,
    pub reference: Option<String>,
    pub total_transaction: f64,
    pub amount: f64,
    pub direction: Direction,
}

impl Transaction {
    /// `"Rata {i} din {n}"` when both installment fields are known.
    pub fn rata(&self) -> String {
        match (self.installment, self.installment_count) {
            (Some(current), Some(count)) => format!("Rata {} din {}", current, count),
            _ => String::new(),
        }
    }

    /// Installments still due after this one.
    pub fn months_left(&self) -> Option<i64> {
        match (self.installment, self.installment_count) {
            (Some(current), Some(count)) => Some(i64::from(count) - i64::from(current)),
            _ => None,
        }
    }

    pub fn is_debit(&self) -> bool {
        self.direction == Direction::Debit
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKey {
    Date,
    Details,
    Installment,
    InstallmentCount,
    Store,
    Category,
    TransactionNr,
    TotalTransaction,
    Amount,
}

impl ColumnKey {
    /// Translation key for the column header.
    pub fn label_key(self) -> &'static str {
        match self {
            ColumnKey::Date => "data",
            ColumnKey::Details => "details",
            ColumnKey::Installment => "rate_nr",
            ColumnKey::InstallmentCount => "num_rates",
            ColumnKey::Store => "store",
            ColumnKey::Category => "category",
            ColumnKey::TransactionNr => "transaction_nr",
            ColumnKey::TotalTransaction => "total_transaction",
            ColumnKey::Amount => "amount_to_return",
        }
    }

    pub fn value(self, tx: &Transaction) -> CellValue {
        match self {
            ColumnKey::Date => CellValue::Date(tx.date),
            ColumnKey::Details => CellValue::Text(tx.details.clone()),
            ColumnKey::Installment => tx
                .installment
                .map(|v| CellValue::Number(f64::from(v)))
                .unwrap_or(CellValue::Empty),
            ColumnKey::InstallmentCount => tx
                .installment_count
                .map(|v| CellValue::Number(f64::from(v)))
                .unwrap_or(CellValue::Empty),
            ColumnKey::Store => CellValue::Text(tx.store.clone()),
            ColumnKey::Category => tx
                .category
                .clone()
                .map(CellValue::Text)
                .unwrap_or(CellValue::Empty),
            ColumnKey::TransactionNr => CellValue::Text(tx.transaction_nr.clone()),
            ColumnKey::TotalTransaction => CellValue::Number(tx.total_transaction),
            ColumnKey::Amount => CellValue::Number(tx.amount),
        }
    }
}

/// A single rendered cell, shared by every output format.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Empty,
}

impl CellValue {
    pub fn to_plain_string(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Empty => String::new(),
        }
    }
}

/// An output column: what to render and the header to show for it.
pub type Column = (ColumnKey, String);

/// Raw text pulled out of a statement document.
#[derive(Debug, Clone)]
pub struct StatementText {
    pub source: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub parser_name: String,
    pub columns: Vec<Column>,
    pub transactions: Vec<Transaction>,
    pub summary: InstallmentSummary,
    /// Rules the transactions were categorized with.
    pub rules: RuleSet,
}

/// Where statement text comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ExtractorKind {
    /// Plain text for `.txt` inputs, otherwise the default document backend.
    #[default]
    Auto,
    Pdfium,
    Tika,
    Text,
}

impl ExtractorKind {
    pub fn resolve(self, input: &std::path::Path) -> ExtractorKind {
        match self {
            ExtractorKind::Auto => {
                let is_text = input
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case("txt"))
                    .unwrap_or(false);
                if is_text {
                    ExtractorKind::Text
                } else if cfg!(feature = "pdf") {
                    ExtractorKind::Pdfium
                } else {
                    ExtractorKind::Tika
                }
            }
            kind => kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Xlsx,
    Json,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            date: NaiveDate::from_ymd_opt(2024, 3, 12).unwrap(),
            header_date: None,
            details: "Cumparare POS".to_string(),
            installment: Some(2),
            installment_count: Some(6),
            store: "ALTEX".to_string(),
            category: None,
            transaction_nr: "FT123".to_string(),
            reference: None,
            total_transaction: -600.0,
            amount: -100.0,
            direction: Direction::Debit,
        }
    }

    #[test]
    fn test_rata_and_months_left() {
        let tx = sample();
        assert_eq!(tx.rata(), "Rata 2 din 6");
        assert_eq!(tx.months_left(), Some(4));

        let mut plain = sample();
        plain.installment = None;
        assert_eq!(plain.rata(), "");
        assert_eq!(plain.months_left(), None);
    }

    #[test]
    fn test_column_values() {
        let tx = sample();
        assert_eq!(ColumnKey::Category.value(&tx), CellValue::Empty);
        assert_eq!(ColumnKey::Installment.value(&tx), CellValue::Number(2.0));
        assert_eq!(
            ColumnKey::Date.value(&tx).to_plain_string(),
            "2024-03-12".to_string()
        );
        assert_eq!(ColumnKey::Amount.value(&tx).to_plain_string(), "-100");
    }

    #[test]
    fn test_extractor_kind_resolve() {
        use std::path::Path;
        assert_eq!(
            ExtractorKind::Auto.resolve(Path::new("statement.TXT")),
            ExtractorKind::Text
        );
        assert_eq!(
            ExtractorKind::Tika.resolve(Path::new("statement.txt")),
            ExtractorKind::Tika
        );
        assert_ne!(
            ExtractorKind::Auto.resolve(Path::new("statement.pdf")),
            ExtractorKind::Text
        );
    }
}
