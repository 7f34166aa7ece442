//! Statement parsers and the registry that selects between them.
//!
//! Every parser is compiled in and registered in [`ParserRegistry::new`].

pub mod cec;
pub mod cec_legacy;

use chrono::NaiveDate;

use crate::domain::model::{Column, ColumnKey, Transaction};
use crate::i18n::{translate, Language};
use crate::utils::error::{EtlError, Result};

pub use cec::CecParser;
pub use cec_legacy::CecLegacyParser;

/// Columns emitted when a parser has no layout of its own.
pub const DEFAULT_COLUMNS: [ColumnKey; 9] = [
    ColumnKey::Date,
    ColumnKey::Details,
    ColumnKey::Installment,
    ColumnKey::InstallmentCount,
    ColumnKey::Store,
    ColumnKey::Category,
    ColumnKey::TransactionNr,
    ColumnKey::TotalTransaction,
    ColumnKey::Amount,
];

pub trait StatementParser: Send + Sync {
    /// Display name, also used to select the parser on the command line.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Whether `text` looks like a statement this parser understands.
    fn validate(&self, text: &str) -> bool;

    fn parse(&self, text: &str) -> Result<Vec<Transaction>>;

    fn column_keys(&self) -> &'static [ColumnKey] {
        &DEFAULT_COLUMNS
    }

    fn columns(&self, language: Language) -> Vec<Column> {
        self.column_keys()
            .iter()
            .map(|key| (*key, translate(key.label_key(), language).to_string()))
            .collect()
    }
}

pub struct ParserRegistry {
    parsers: Vec<Box<dyn StatementParser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        Self {
            parsers: vec![Box::new(CecParser), Box::new(CecLegacyParser)],
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    pub fn parsers(&self) -> impl Iterator<Item = &dyn StatementParser> {
        self.parsers.iter().map(|p| p.as_ref())
    }

    pub fn get(&self, name: &str) -> Result<&dyn StatementParser> {
        self.parsers()
            .find(|p| p.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| EtlError::UnknownParser {
                name: name.to_string(),
            })
    }

    /// First registered parser that accepts `text`.
    pub fn auto_detect(&self, text: &str) -> Option<&dyn StatementParser> {
        let found = self.parsers().find(|p| p.validate(text));
        match found {
            Some(parser) => tracing::debug!("Auto-detected parser: {}", parser.name()),
            None => tracing::debug!("No parser accepted the statement text"),
        }
        found
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses `dd-mm-yyyy`, also accepting `.` or `/` as separators.
pub(crate) fn parse_statement_date(raw: &str) -> Option<NaiveDate> {
    let normalized: String = raw
        .trim()
        .chars()
        .map(|c| if c == '.' || c == '/' { '-' } else { c })
        .collect();
    NaiveDate::parse_from_str(&normalized, "%d-%m-%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_order_and_lookup() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.names(), vec!["CEC Parser", "CEC Legacy Parser"]);
        assert_eq!(registry.get("cec parser").unwrap().name(), "CEC Parser");
        assert!(matches!(
            registry.get("BT Parser"),
            Err(EtlError::UnknownParser { .. })
        ));
    }

    #[test]
    fn test_auto_detect_none() {
        let registry = ParserRegistry::new();
        assert!(registry.auto_detect("hello world").is_none());
    }

    #[test]
    fn test_parse_statement_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 2);
        assert_eq!(parse_statement_date("02.03.2024"), expected);
        assert_eq!(parse_statement_date("02-03-2024"), expected);
        assert_eq!(parse_statement_date("02/03/2024"), expected);
        assert_eq!(parse_statement_date("32.03.2024"), None);
    }

    #[test]
    fn test_default_columns_translated() {
        let columns = CecParser.columns(Language::Ro);
        assert_eq!(columns.len(), 9);
        assert_eq!(columns[0], (ColumnKey::Date, "Data".to_string()));
        assert_eq!(columns[4], (ColumnKey::Store, "Magazin".to_string()));
    }
}
