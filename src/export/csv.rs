use crate::domain::model::{Column, Transaction};
use crate::utils::error::{EtlError, Result};

/// One header row of column labels, then one row per transaction.
pub fn write_transactions_csv(columns: &[Column], transactions: &[Transaction]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(columns.iter().map(|(_, label)| label.as_str()))?;
    for tx in transactions {
        writer.write_record(
            columns
                .iter()
                .map(|(key, _)| key.value(tx).to_plain_string()),
        )?;
    }

    writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("failed to flush CSV output: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ColumnKey, Direction};
    use chrono::NaiveDate;

    #[test]
    fn test_csv_rows() {
        let columns = vec![
            (ColumnKey::Date, "Date".to_string()),
            (ColumnKey::Store, "Store".to_string()),
            (ColumnKey::Installment, "Installment".to_string()),
            (ColumnKey::Category, "Category".to_string()),
            (ColumnKey::Amount, "Amount".to_string()),
        ];
        let transactions = vec![Transaction {
            date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
            header_date: None,
            details: String::new(),
            installment: None,
            installment_count: None,
            store: "KAUFLAND, BUCURESTI".to_string(),
            category: Some("Groceries".to_string()),
            transaction_nr: "FT1".to_string(),
            reference: None,
            total_transaction: 0.0,
            amount: -12.5,
            direction: Direction::Debit,
        }];

        let bytes = write_transactions_csv(&columns, &transactions).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        assert_eq!(
            text,
            "Date,Store,Installment,Category,Amount\n2024-03-02,\"KAUFLAND, BUCURESTI\",,Groceries,-12.5\n"
        );
    }

    #[test]
    fn test_csv_header_only() {
        let columns = vec![(ColumnKey::Date, "Data".to_string())];
        let bytes = write_transactions_csv(&columns, &[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "Data\n");
    }
}
