use regex::Regex;
use std::sync::LazyLock;

use crate::domain::model::{ColumnKey, Direction, Transaction};
use crate::parsers::{parse_statement_date, StatementParser};
use crate::utils::error::{EtlError, Result};

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{2}-\d{2}-\d{4}").expect("valid date regex"));

static LINE_START_DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-\d{2}-\d{4}").expect("valid date regex"));

static RATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Rata (\d+) din (\d+)").expect("valid installment regex"));

const COLUMNS: [ColumnKey; 8] = [
    ColumnKey::Date,
    ColumnKey::Details,
    ColumnKey::Installment,
    ColumnKey::InstallmentCount,
    ColumnKey::Store,
    ColumnKey::Category,
    ColumnKey::TransactionNr,
    ColumnKey::Amount,
];

/// Parser for the older line-oriented CEC export, where each transaction is
/// a date line followed by three paragraphs: details, number, amount.
/// Only debits are kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct CecLegacyParser;

impl CecLegacyParser {
    /// Collects the next `count` paragraphs starting at `*pos`. A paragraph is
    /// a run of non-empty lines joined with spaces. `None` when the text ends
    /// first.
    fn take_paragraphs(lines: &[&str], pos: &mut usize, count: usize) -> Option<Vec<String>> {
        let mut paragraphs = Vec::with_capacity(count);
        while paragraphs.len() < count {
            while *pos < lines.len() && lines[*pos].is_empty() {
                *pos += 1;
            }
            if *pos >= lines.len() {
                return None;
            }
            let start = *pos;
            while *pos < lines.len() && !lines[*pos].is_empty() {
                *pos += 1;
            }
            paragraphs.push(lines[start..*pos].join(" "));
        }
        Some(paragraphs)
    }

    /// `"-1.234,56"` becomes `-1234.56`.
    fn parse_amount(raw: &str) -> Result<f64> {
        let normalized = raw.trim().replace('.', "").replace(',', ".");
        normalized
            .parse::<f64>()
            .map_err(|_| EtlError::ParseError {
                message: format!("invalid amount '{}'", raw.trim()),
            })
    }

    /// Text after the second date in the details, without digits.
    fn store_from_details(details: &str) -> String {
        match DATE_RE.split(details).nth(2) {
            Some(segment) => segment
                .chars()
                .filter(|c| !c.is_ascii_digit())
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
            None => String::new(),
        }
    }
}

impl StatementParser for CecLegacyParser {
    fn name(&self) -> &'static str {
        "CEC Legacy Parser"
    }

    fn description(&self) -> &'static str {
        "Line-based parser for older CEC Bank statement exports (debits only)."
    }

    fn validate(&self, text: &str) -> bool {
        text.to_uppercase().contains("CEC")
            && text.lines().any(|line| {
                let line = line.trim();
                line.len() == 10 && LINE_START_DATE_RE.is_match(line)
            })
    }

    fn column_keys(&self) -> &'static [ColumnKey] {
        &COLUMNS
    }

    fn parse(&self, text: &str) -> Result<Vec<Transaction>> {
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        let mut results = Vec::new();
        let mut pos = 0;

        while pos < lines.len() {
            let line = lines[pos];
            pos += 1;

            let Some(date_match) = LINE_START_DATE_RE.find(line) else {
                continue;
            };

            let Some(paragraphs) = Self::take_paragraphs(&lines, &mut pos, 3) else {
                tracing::debug!("Dropping incomplete block at end of statement");
                break;
            };
            let [details, number, amount]: [String; 3] = match paragraphs.try_into() {
                Ok(fields) => fields,
                Err(_) => break,
            };

            let Some(date) = parse_statement_date(date_match.as_str()) else {
                tracing::warn!("Skipping block with invalid date '{}'", date_match.as_str());
                continue;
            };

            let amount = Self::parse_amount(&amount)?;
            if amount > 0.0 {
                continue;
            }

            let details = details.replace(';', " ").trim().to_string();
            let (installment, installment_count) = match RATA_RE.captures(&details) {
                Some(rata) => (rata[1].parse().ok(), rata[2].parse().ok()),
                None => (None, None),
            };

            results.push(Transaction {
                date,
                header_date: None,
                store: Self::store_from_details(&details),
                details,
                installment,
                installment_count,
                category: None,
                transaction_nr: number.trim().to_string(),
                reference: None,
                total_transaction: 0.0,
                amount,
                direction: Direction::Debit,
            });
        }

        tracing::debug!("CEC legacy parser found {} transactions", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const STATEMENT: &str = "CEC BANK
Extras de cont

05-01-2024

Plata la POS 04-01-2024 05-01-2024 KAUFLAND 123;BUCURESTI
Rata 1 din 3

TRX001

-1.234,56

07-01-2024

Incasare 06-01-2024 07-01-2024 SALARIU

TRX002

2.000,00

09-01-2024

Plata 08-01-2024 09-01-2024 OMV 77

TRX003

-150,00

10-01-2024

Trunchiat
";

    #[test]
    fn test_validate() {
        assert!(CecLegacyParser.validate(STATEMENT));
        assert!(!CecLegacyParser.validate("CEC 05.01.2024"));
        assert!(!CecLegacyParser.validate("05-01-2024\nno bank name"));
    }

    #[test]
    fn test_parse_skips_credits_and_truncated_blocks() {
        let txs = CecLegacyParser.parse(STATEMENT).unwrap();
        assert_eq!(txs.len(), 2);

        let first = &txs[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(
            first.details,
            "Plata la POS 04-01-2024 05-01-2024 KAUFLAND 123 BUCURESTI Rata 1 din 3"
        );
        assert_eq!(first.rata(), "Rata 1 din 3");
        assert_eq!(first.store, "KAUFLAND BUCURESTI Rata din");
        assert_eq!(first.transaction_nr, "TRX001");
        assert_eq!(first.amount, -1234.56);

        let second = &txs[1];
        assert_eq!(second.store, "OMV");
        assert_eq!(second.amount, -150.0);
        assert_eq!(second.installment, None);
    }

    #[test]
    fn test_invalid_amount_is_an_error() {
        let text = "01-02-2024\n\nPlata\n\nTRX1\n\nabc\n";
        assert!(matches!(
            CecLegacyParser.parse(text),
            Err(EtlError::ParseError { .. })
        ));
    }

    #[test]
    fn test_block_with_impossible_date_is_skipped() {
        // The skipped block's details start with a date; they must not be
        // picked up as the start of another block.
        let text = "CEC BANK

05-01-2024

Plata 04-01-2024 05-01-2024 KAUFLAND

TRX001

-10,00

31-02-2024

15-02-2024 Plata eronata 16-02-2024 OMV

TRX002

-20,00

09-01-2024

Plata 08-01-2024 09-01-2024 LIDL

TRX003

-30,00
";
        let txs = CecLegacyParser.parse(text).unwrap();
        let numbers: Vec<&str> = txs.iter().map(|t| t.transaction_nr.as_str()).collect();
        assert_eq!(numbers, vec!["TRX001", "TRX003"]);
        assert_eq!(txs[1].store, "LIDL");
        assert_eq!(txs[1].amount, -30.0);
    }

    #[test]
    fn test_store_without_second_date() {
        assert_eq!(CecLegacyParser::store_from_details("Comision 01-01-2024"), "");
    }
}
