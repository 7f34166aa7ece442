use cec_parser::adapters::build_extractor;
use cec_parser::domain::model::{ExtractorKind, OutputFormat};
use cec_parser::utils::error::ErrorSeverity;
use cec_parser::utils::validation::Validate;
use cec_parser::{EtlEngine, EtlError, LocalStorage, RunConfig, StatementPipeline};
use httpmock::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const EXTRACTED_TEXT: &str = "EXTRAS DE CONT
CEC BANK S.A.
Moneda: RON

10.04.2024

11.04.2024
Cumparare POS 10.04.2024 EMAG MARKETPLACE 9 BUCURESTI
Rata 1 din 12 comerciant 1.200,00 RON
111222
FT24101
-100,00
";

fn pdf_input(dir: &TempDir) -> String {
    let path = dir.path().join("aprilie.pdf");
    std::fs::write(&path, b"%PDF-1.7 fake document").unwrap();
    path.to_str().unwrap().to_string()
}

fn tika_config(input: String, endpoint: String, output: &Path) -> RunConfig {
    let mut config = RunConfig::new(input);
    config.backend = ExtractorKind::Tika;
    config.tika_endpoint = endpoint;
    config.timeout_seconds = 5;
    config.output_path = output.to_str().unwrap().to_string();
    config
}

#[tokio::test]
async fn test_end_to_end_with_tika_backend() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let tika_mock = server.mock(|when, then| {
        when.method(PUT)
            .path("/tika")
            .header("accept", "text/plain")
            .body("%PDF-1.7 fake document");
        then.status(200)
            .header("Content-Type", "text/plain")
            .body(EXTRACTED_TEXT);
    });

    let mut config = tika_config(pdf_input(&temp_dir), server.base_url(), temp_dir.path());
    config.output_formats = vec![OutputFormat::Xlsx, OutputFormat::Csv];
    config.validate().unwrap();

    let storage = LocalStorage::new(config.output_path.clone());
    let engine = EtlEngine::new_with_monitoring(StatementPipeline::new(storage, config), false);
    let outcome = engine.run().await.unwrap();

    tika_mock.assert();
    assert_eq!(outcome.result.transactions.len(), 1);

    let tx = &outcome.result.transactions[0];
    assert!(tx.store.starts_with("EMAG MARKETPLACE BUCURESTI"));
    assert_eq!(tx.category.as_deref(), Some("Shopping"));
    assert_eq!(tx.total_transaction, -1200.0);
    assert_eq!(outcome.result.summary.rows(), vec![(11, -100.0)]);

    assert!(temp_dir.path().join("aprilie.xlsx").exists());
    assert!(temp_dir.path().join("aprilie.csv").exists());
}

#[tokio::test]
async fn test_tika_server_error_is_an_extraction_error() {
    let temp_dir = TempDir::new().unwrap();
    let server = MockServer::start();

    let tika_mock = server.mock(|when, then| {
        when.method(PUT).path("/tika");
        then.status(422).body("Unprocessable document");
    });

    let config = tika_config(pdf_input(&temp_dir), server.base_url(), temp_dir.path());
    let storage = LocalStorage::new(config.output_path.clone());
    let engine = EtlEngine::new(StatementPipeline::new(storage, config));

    let err = engine.run().await.unwrap_err();

    tika_mock.assert();
    assert!(matches!(err, EtlError::ExtractionError { .. }));
    assert_eq!(err.severity(), ErrorSeverity::Medium);
    assert!(!temp_dir.path().join("aprilie.xlsx").exists());
}

#[test]
fn test_backend_resolution_by_extension() {
    let temp_dir = TempDir::new().unwrap();
    let text_input = temp_dir.path().join("extras.txt");
    std::fs::write(&text_input, "CEC").unwrap();

    let config = RunConfig::new(text_input.to_str().unwrap());
    let extractor = build_extractor(&config, &text_input).unwrap();
    let text = tokio_test::block_on(extractor.extract(&text_input)).unwrap();
    assert_eq!(text.content, "CEC");

    let mut config = RunConfig::new("extras.pdf");
    config.backend = ExtractorKind::Tika;
    config.tika_endpoint = "ftp://tika".to_string();
    assert!(build_extractor(&config, Path::new("extras.pdf")).is_err());
}
