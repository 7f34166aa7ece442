use serde::Serialize;
use std::path::Path;

use crate::domain::model::Transaction;
use crate::utils::error::{EtlError, Result};

/// Rules shipped inside the binary.
const EMBEDDED_RULES: &str = include_str!("../../rules.csv");

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    pub pattern: String,
    pub category: String,
}

/// Ordered `pattern -> category` rules. The first match wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parses `pattern,category` lines. There is no header row; extra
    /// fields after the category are ignored.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut rules = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(index + 1);

            if record.iter().all(|field| field.is_empty()) {
                continue;
            }
            if record.len() < 2 {
                return Err(EtlError::RulesError {
                    line,
                    message: "Bad rules file".to_string(),
                });
            }

            rules.push(Rule {
                pattern: record[0].to_string(),
                category: record[1].to_string(),
            });
        }

        tracing::debug!("Loaded {} categorization rules", rules.len());
        Ok(Self { rules })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_csv_str(&content)
    }

    pub fn embedded() -> Result<Self> {
        Self::from_csv_str(EMBEDDED_RULES)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Case-insensitive substring match, like a spreadsheet `SEARCH`.
    pub fn categorize(&self, store: &str) -> Option<&str> {
        let haystack = store.to_lowercase();
        self.rules
            .iter()
            .find(|rule| !rule.pattern.is_empty() && haystack.contains(&rule.pattern.to_lowercase()))
            .map(|rule| rule.category.as_str())
    }

    pub fn apply(&self, transactions: &mut [Transaction]) {
        let mut matched = 0usize;
        for tx in transactions.iter_mut() {
            tx.category = self.categorize(&tx.store).map(str::to_string);
            if tx.category.is_some() {
                matched += 1;
            }
        }
        tracing::debug!(
            "Categorized {}/{} transactions",
            matched,
            transactions.len()
        );
    }
}
