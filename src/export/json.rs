use serde::Serialize;

use crate::domain::model::{Transaction, TransformResult};
use crate::domain::summary::InstallmentSummary;
use crate::utils::error::Result;

#[derive(Serialize)]
struct JsonReport<'a> {
    parser: &'a str,
    transactions: &'a [Transaction],
    summary: &'a InstallmentSummary,
}

pub fn write_report_json(result: &TransformResult) -> Result<Vec<u8>> {
    let report = JsonReport {
        parser: &result.parser_name,
        transactions: &result.transactions,
        summary: &result.summary,
    };
    Ok(serde_json::to_vec_pretty(&report)?)
}
