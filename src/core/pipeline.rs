use crate::adapters::build_extractor;
use crate::domain::model::{OutputFormat, StatementText, TransformResult};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage, TextExtractor};
use crate::domain::rules::RuleSet;
use crate::domain::summary::InstallmentSummary;
use crate::export::{write_report_json, write_transactions_csv, Workbook};
use crate::parsers::{ParserRegistry, StatementParser};
use crate::utils::error::{EtlError, Result};
use std::path::Path;

/// Reads one statement, parses it and writes every configured report.
pub struct StatementPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    registry: ParserRegistry,
    extractor: Option<Box<dyn TextExtractor>>,
}

impl<S: Storage, C: ConfigProvider> StatementPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            registry: ParserRegistry::new(),
            extractor: None,
        }
    }

    /// Uses `extractor` instead of the one the configured backend selects.
    pub fn with_extractor(storage: S, config: C, extractor: Box<dyn TextExtractor>) -> Self {
        Self {
            extractor: Some(extractor),
            ..Self::new(storage, config)
        }
    }

    /// Report files are named after the input, without its extension.
    fn output_stem(&self) -> String {
        Path::new(self.config.input_path())
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("statement")
            .to_string()
    }

    fn select_parser(&self, text: &StatementText) -> Result<&dyn StatementParser> {
        match self.config.parser_name() {
            Some(name) => self.registry.get(name),
            None => self
                .registry
                .auto_detect(&text.content)
                .ok_or_else(|| EtlError::NoMatchingParser {
                    source_name: text.source.clone(),
                }),
        }
    }

    fn load_rules(&self) -> Result<RuleSet> {
        match self.config.rules_path() {
            Some(path) => {
                tracing::debug!("Loading rules from {}", path);
                RuleSet::from_file(path)
            }
            None => RuleSet::embedded(),
        }
    }

    fn render(&self, format: OutputFormat, stem: &str, result: &TransformResult) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Csv => write_transactions_csv(&result.columns, &result.transactions),
            OutputFormat::Json => write_report_json(result),
            OutputFormat::Xlsx => {
                let language = self.config.language();
                let mut workbook = Workbook::new();
                workbook.add_rules_sheet(&result.rules, language);
                let sheet_name = workbook.unique_sheet_name(stem);
                let sheet = workbook.add_transactions_sheet(
                    &sheet_name,
                    &result.columns,
                    &result.transactions,
                    &result.rules,
                    language,
                )?;
                // One empty column between the transactions and the summary.
                let summary_col = result.columns.len() as u32 + 2;
                workbook.add_summary_section(sheet, &result.summary, summary_col, language)?;
                workbook.to_bytes()
            }
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for StatementPipeline<S, C> {
    async fn extract(&self) -> Result<StatementText> {
        let input = Path::new(self.config.input_path());
        tracing::debug!("Reading statement: {}", input.display());

        match &self.extractor {
            Some(extractor) => extractor.extract(input).await,
            None => build_extractor(&self.config, input)?.extract(input).await,
        }
    }

    async fn transform(&self, text: StatementText) -> Result<TransformResult> {
        let parser = self.select_parser(&text)?;
        tracing::info!("Using parser: {}", parser.name());

        let mut transactions = parser.parse(&text.content)?;
        if transactions.is_empty() {
            tracing::warn!("{} found no transactions in {}", parser.name(), text.source);
        }

        let rules = self.load_rules()?;
        rules.apply(&mut transactions);
        let categorized = transactions.iter().filter(|t| t.category.is_some()).count();
        tracing::debug!(
            "Categorized {}/{} transactions with {} rules",
            categorized,
            transactions.len(),
            rules.len()
        );

        let summary = InstallmentSummary::from_transactions(&transactions);

        Ok(TransformResult {
            parser_name: parser.name().to_string(),
            columns: parser.columns(self.config.language()),
            transactions,
            summary,
            rules,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<Vec<String>> {
        let stem = self.output_stem();
        let mut outputs = Vec::new();
        tracing::debug!("Writing reports to {}", self.config.output_path());

        // Render everything first so a failing format leaves no files behind.
        let mut rendered = Vec::new();
        for format in self.config.output_formats() {
            let file_name = format!("{}.{}", stem, format.extension());
            rendered.push((file_name, self.render(*format, &stem, &result)?));
        }

        for (file_name, data) in rendered {
            tracing::debug!("Writing {} bytes to {}", data.len(), file_name);
            self.storage.write_file(&file_name, &data).await?;
            outputs.push(self.storage.location(&file_name));
        }

        Ok(outputs)
    }
}
