use regex::Regex;
use std::sync::LazyLock;

use crate::domain::model::{Direction, Transaction};
use crate::parsers::{parse_statement_date, StatementParser};
use crate::utils::error::Result;

const DATE_PATTERN: &str = r"\d{2}[./-]\d{2}[./-]\d{4}";

static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DATE_PATTERN).expect("valid date regex"));

static RATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Rata (\d*) din (\d*)").expect("valid installment regex"));

static TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s+comerciant\s+([\d.,]+)\s+RON").expect("valid merchant total regex")
});

// header date, blank line(s), transaction date, free-form details,
// reference digits, document number, then an optionally signed amount.
static BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        concat!(
            r"(?s)(?P<header_date>{date})\s*\n\s*\n?",
            r"(?P<date>{date})\s*\n",
            r"(?P<info>.*?)\n",
            r"(?P<ref>\d+?)\s*\n",
            r"(?P<number>[A-Z]{{2,}}\d+)\s*(?P<sign>[-+])?\s*",
            r"(?P<amount>[\d.,]+)",
        ),
        date = DATE_PATTERN
    );
    Regex::new(&pattern).expect("valid statement block regex")
});

const CEC_INDICATORS: [&str; 4] = ["CEC", "CASA DE ECONOMII", "EXTRAS DE CONT", "RON"];

/// Parser for the current CEC Bank statement layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct CecParser;

impl CecParser {
    /// `"1.234,56"` and `"1,234.56"` both become `1234.56`.
    fn normalize_amount(raw: &str) -> Option<f64> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        digits.parse::<f64>().ok().map(|cents| cents / 100.0)
    }

    fn store_from_info(info: &str) -> String {
        match DATE_RE.split(info).nth(1) {
            Some(after_date) => after_date
                .split_whitespace()
                .filter(|token| !token.starts_with(|c: char| c.is_ascii_digit()))
                .collect::<Vec<_>>()
                .join(" "),
            None => String::new(),
        }
    }
}

impl StatementParser for CecParser {
    fn name(&self) -> &'static str {
        "CEC Parser"
    }

    fn description(&self) -> &'static str {
        "Heuristic parser for CEC Bank statements."
    }

    fn validate(&self, text: &str) -> bool {
        let upper = text.to_uppercase();
        let matches = CEC_INDICATORS
            .iter()
            .filter(|indicator| upper.contains(*indicator))
            .count();
        matches >= 2 && DATE_RE.is_match(text) && BLOCK_RE.is_match(text)
    }

    fn parse(&self, text: &str) -> Result<Vec<Transaction>> {
        let mut results = Vec::new();

        for caps in BLOCK_RE.captures_iter(text) {
            let raw_date = &caps["date"];
            let Some(date) = parse_statement_date(raw_date) else {
                tracing::warn!("Skipping block with invalid date '{}'", raw_date);
                continue;
            };
            let header_date = parse_statement_date(&caps["header_date"]);
            let info = caps["info"].trim().to_string();
            let reference = caps["ref"].trim().to_string();
            let number = caps["number"].to_string();
            let direction = match caps.name("sign").map(|m| m.as_str()) {
                Some("+") => Direction::Credit,
                _ => Direction::Debit,
            };

            let Some(amount) = Self::normalize_amount(&caps["amount"]) else {
                tracing::warn!("Skipping block {} with unreadable amount", number);
                continue;
            };

            let (installment, installment_count) = match RATA_RE.captures(&info) {
                Some(rata) => (rata[1].parse().ok(), rata[2].parse().ok()),
                None => (None, None),
            };

            let transaction_total = TOTAL_RE
                .captures(&info)
                .and_then(|m| Self::normalize_amount(&m[1]))
                .unwrap_or(0.0);

            let signed = |value: f64| match direction {
                Direction::Credit => value,
                Direction::Debit => -value,
            };

            results.push(Transaction {
                date,
                header_date,
                store: Self::store_from_info(&info),
                details: info,
                installment,
                installment_count,
                category: None,
                transaction_nr: number,
                reference: Some(reference),
                total_transaction: signed(transaction_total),
                amount: signed(amount),
                direction,
            });
        }

        tracing::debug!("CEC parser found {} transactions", results.len());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const STATEMENT: &str = "EXTRAS DE CONT
CEC BANK S.A.
Moneda: RON

01.03.2024

02.03.2024
Cumparare POS 01.03.2024 KAUFLAND 1234 BUCURESTI
Rata 2 din 6 comerciant 600,00 RON
123456
FT24062
-100,00

04.03.2024

05.03.2024
Incasare transfer 04.03.2024 SALARIU MARTIE
789
OP0001
+2.500,00
";

    #[test]
    fn test_validate() {
        assert!(CecParser.validate(STATEMENT));
        assert!(!CecParser.validate("EXTRAS DE CONT RON but no dates"));
        assert!(!CecParser.validate("only CEC 01.01.2024"));
        // Right bank, but no transaction block in this layout.
        assert!(!CecParser.validate("CEC BANK\nEXTRAS DE CONT\n05-01-2024\n"));
    }

    #[test]
    fn test_parse_blocks() {
        let txs = CecParser.parse(STATEMENT).unwrap();
        assert_eq!(txs.len(), 2);

        let debit = &txs[0];
        assert_eq!(debit.date, NaiveDate::from_ymd_opt(2024, 3, 2).unwrap());
        assert_eq!(debit.header_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(debit.direction, Direction::Debit);
        assert_eq!(debit.amount, -100.0);
        assert_eq!(debit.total_transaction, -600.0);
        assert_eq!(debit.installment, Some(2));
        assert_eq!(debit.installment_count, Some(6));
        assert_eq!(debit.transaction_nr, "FT24062");
        assert_eq!(debit.reference.as_deref(), Some("123456"));
        assert!(debit.store.starts_with("KAUFLAND BUCURESTI"));

        let credit = &txs[1];
        assert_eq!(credit.direction, Direction::Credit);
        assert_eq!(credit.amount, 2500.0);
        assert_eq!(credit.total_transaction, 0.0);
        assert_eq!(credit.installment, None);
        assert_eq!(credit.store, "SALARIU MARTIE");
        assert_eq!(credit.transaction_nr, "OP0001");
    }

    #[test]
    fn test_store_without_date_is_empty() {
        assert_eq!(CecParser::store_from_info("Comision administrare"), "");
    }

    #[test]
    fn test_normalize_amount() {
        assert_eq!(CecParser::normalize_amount("1.234,56"), Some(1234.56));
        assert_eq!(CecParser::normalize_amount("1,234.56"), Some(1234.56));
        assert_eq!(CecParser::normalize_amount(".,"), None);
    }

    #[test]
    fn test_block_with_impossible_date_is_skipped() {
        let text = "EXTRAS DE CONT CEC RON

01.03.2024

02.03.2024
Cumparare POS 01.03.2024 KAUFLAND 1234 BUCURESTI
111
FT1
-10,00

30.02.2024

31.02.2024
Cumparare POS 30.02.2024 OMV 5
222
FT2
-20,00

04.03.2024

05.03.2024
Cumparare POS 04.03.2024 LIDL 9
333
FT3
-30,00
";
        let txs = CecParser.parse(text).unwrap();
        let numbers: Vec<&str> = txs.iter().map(|t| t.transaction_nr.as_str()).collect();
        assert_eq!(numbers, vec!["FT1", "FT3"]);
        assert_eq!(txs[0].amount, -10.0);
        assert_eq!(txs[1].amount, -30.0);
        assert_eq!(txs[1].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_parse_empty_text() {
        assert!(CecParser.parse("").unwrap().is_empty());
    }
}
