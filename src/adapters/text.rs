use async_trait::async_trait;
use std::path::Path;

use crate::domain::model::StatementText;
use crate::domain::ports::TextExtractor;
use crate::utils::error::Result;

/// Reads statements that were already converted to UTF-8 text.
#[derive(Debug, Default, Clone)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<StatementText> {
        tracing::debug!("Reading statement text from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        Ok(StatementText {
            source: path.display().to_string(),
            content,
        })
    }
}
