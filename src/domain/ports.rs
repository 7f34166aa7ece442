use crate::domain::model::{ExtractorKind, OutputFormat, StatementText, TransformResult};
use crate::i18n::Language;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Human-readable location of `path` inside this storage.
    fn location(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn backend(&self) -> ExtractorKind;
    fn tika_endpoint(&self) -> &str;
    fn timeout_seconds(&self) -> u64;
    fn pdfium_library_dir(&self) -> Option<&str>;
    fn password(&self) -> Option<&str>;
    /// `None` means auto-detect.
    fn parser_name(&self) -> Option<&str>;
    /// `None` means the rules bundled in the binary.
    fn rules_path(&self) -> Option<&str>;
    fn output_formats(&self) -> &[OutputFormat];
    fn language(&self) -> Language;
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<StatementText>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<StatementText>;
    async fn transform(&self, text: StatementText) -> Result<TransformResult>;
    /// Returns the locations of every file written.
    async fn load(&self, result: TransformResult) -> Result<Vec<String>>;
}
