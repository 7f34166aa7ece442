use cec_parser::domain::model::{ExtractorKind, OutputFormat};
use cec_parser::i18n::Language;
use cec_parser::utils::validation::Validate;
use cec_parser::{EtlEngine, EtlError, LocalStorage, RunConfig, StatementPipeline};
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

const CEC_STATEMENT: &str = "EXTRAS DE CONT
CEC BANK S.A.
Moneda: RON

01.03.2024

02.03.2024
Cumparare POS 01.03.2024 KAUFLAND 1234 BUCURESTI
Rata 2 din 6 comerciant 600,00 RON
123456
FT24062
-100,00

03.03.2024

04.03.2024
Cumparare POS 03.03.2024 OMV PETROM 55 CLUJ
654321
FT24063
-250,50

04.03.2024

05.03.2024
Incasare transfer 04.03.2024 SALARIU MARTIE
789
OP0001
+2.500,00
";

const LEGACY_STATEMENT: &str = "CEC BANK
Extras de cont

05-01-2024

Plata la POS 04-01-2024 05-01-2024 KAUFLAND 123;BUCURESTI
Rata 1 din 3

TRX001

-1.234,56

09-01-2024

Plata 08-01-2024 09-01-2024 OMV 77

TRX003

-150,00
";

fn write_statement(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn run_config(input: String, output: &Path) -> RunConfig {
    let mut config = RunConfig::new(input);
    config.output_path = output.to_str().unwrap().to_string();
    config
}

async fn run(config: RunConfig) -> cec_parser::Result<cec_parser::EtlOutcome> {
    config.validate()?;
    let storage = LocalStorage::new(config.output_path.clone());
    let engine = EtlEngine::new_with_monitoring(StatementPipeline::new(storage, config), false);
    engine.run().await
}

#[tokio::test]
async fn test_end_to_end_text_statement_to_all_formats() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_statement(&temp_dir, "martie.txt", CEC_STATEMENT);
    let output_dir = temp_dir.path().join("reports");

    let mut config = run_config(input, &output_dir);
    config.output_formats = vec![OutputFormat::Csv, OutputFormat::Xlsx, OutputFormat::Json];

    let outcome = run(config).await.unwrap();

    assert_eq!(outcome.result.parser_name, "CEC Parser");
    assert_eq!(outcome.result.transactions.len(), 3);
    assert_eq!(outcome.outputs.len(), 3);
    for name in ["martie.csv", "martie.xlsx", "martie.json"] {
        assert!(output_dir.join(name).exists(), "{} was not written", name);
    }

    // Categories come from the bundled rules.
    let categories: Vec<Option<&str>> = outcome
        .result
        .transactions
        .iter()
        .map(|t| t.category.as_deref())
        .collect();
    assert_eq!(categories, vec![Some("Groceries"), Some("Fuel"), None]);

    // Credits stay out of the summary.
    assert_eq!(outcome.result.summary.rows(), vec![(4, -100.0)]);
    assert!((outcome.result.summary.expenses - -250.5).abs() < 1e-9);

    let mut reader = csv::Reader::from_path(output_dir.join("martie.csv")).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "Date");
    assert_eq!(headers.len(), 9);
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "2024-03-02");
    assert_eq!(&rows[0][5], "Groceries");

    let data = std::fs::read(output_dir.join("martie.xlsx")).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data)).unwrap();
    let mut workbook = String::new();
    archive
        .by_name("xl/workbook.xml")
        .unwrap()
        .read_to_string(&mut workbook)
        .unwrap();
    assert!(workbook.contains("name=\"Rules\""));
    assert!(workbook.contains("name=\"martie\""));

    let json: serde_json::Value =
        serde_json::from_slice(&std::fs::read(output_dir.join("martie.json")).unwrap()).unwrap();
    assert_eq!(json["transactions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_legacy_statement_is_auto_detected() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_statement(&temp_dir, "ianuarie.txt", LEGACY_STATEMENT);

    let mut config = run_config(input, temp_dir.path());
    config.output_formats = vec![OutputFormat::Csv];
    config.language = Language::Ro;

    let outcome = run(config).await.unwrap();

    assert_eq!(outcome.result.parser_name, "CEC Legacy Parser");
    assert_eq!(outcome.result.transactions.len(), 2);
    assert_eq!(outcome.result.columns.len(), 8);

    let csv = std::fs::read_to_string(temp_dir.path().join("ianuarie.csv")).unwrap();
    assert!(csv.starts_with("Data,Detalii"));
    assert!(csv.contains("Fuel"));
}

#[tokio::test]
async fn test_custom_rules_file() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_statement(&temp_dir, "martie.txt", CEC_STATEMENT);
    let rules = write_statement(&temp_dir, "rules.csv", "petrom,Car\nsalariu,Income\n");

    let mut config = run_config(input, &temp_dir.path().join("out"));
    config.rules_path = Some(rules);
    config.output_formats = vec![OutputFormat::Json];

    let outcome = run(config).await.unwrap();
    let categories: Vec<Option<&str>> = outcome
        .result
        .transactions
        .iter()
        .map(|t| t.category.as_deref())
        .collect();
    assert_eq!(categories, vec![None, Some("Car"), Some("Income")]);
}

#[tokio::test]
async fn test_forced_parser_that_does_not_exist() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_statement(&temp_dir, "martie.txt", CEC_STATEMENT);

    let mut config = run_config(input, temp_dir.path());
    config.parser_name = Some("BCR Parser".to_string());

    let err = run(config).await.unwrap_err();
    assert!(matches!(err, EtlError::UnknownParser { ref name } if name == "BCR Parser"));
    assert!(!temp_dir.path().join("martie.xlsx").exists());
}

#[tokio::test]
async fn test_unrecognised_statement() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_statement(&temp_dir, "other.txt", "Banca Transilvania\nSold final 12,00\n");

    let err = run(run_config(input, temp_dir.path())).await.unwrap_err();
    assert!(matches!(err, EtlError::NoMatchingParser { .. }));
}

#[tokio::test]
async fn test_statement_without_transactions_still_writes_headers() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_statement(&temp_dir, "gol.txt", "CEC BANK\nExtras de cont\n\n05-01-2024\n");

    let mut config = run_config(input, temp_dir.path());
    config.parser_name = Some("CEC Legacy Parser".to_string());
    config.output_formats = vec![OutputFormat::Csv];

    let outcome = run(config).await.unwrap();
    assert!(outcome.result.transactions.is_empty());

    let csv = std::fs::read_to_string(temp_dir.path().join("gol.csv")).unwrap();
    assert_eq!(csv.lines().count(), 1);
}

#[tokio::test]
async fn test_missing_input_fails_validation() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = run_config("/no/such/extras.pdf".to_string(), temp_dir.path());
    config.backend = ExtractorKind::Text;

    assert!(run(config).await.is_err());
}
