pub mod csv;
pub mod json;
pub mod xlsx;

pub use self::csv::write_transactions_csv;
pub use self::json::write_report_json;
pub use self::xlsx::Workbook;
