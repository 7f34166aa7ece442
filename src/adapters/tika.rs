use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

use crate::domain::model::StatementText;
use crate::domain::ports::TextExtractor;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::validate_url;

pub const DEFAULT_TIKA_ENDPOINT: &str = "http://localhost:9998";

/// Client for an Apache Tika server's plain-text endpoint.
pub struct TikaExtractor {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl TikaExtractor {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        validate_url("tika_endpoint", endpoint)?;
        Ok(Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn tika_url(&self) -> String {
        format!("{}/tika", self.endpoint)
    }
}

#[async_trait]
impl TextExtractor for TikaExtractor {
    async fn extract(&self, path: &Path) -> Result<StatementText> {
        let document = tokio::fs::read(path).await?;
        let url = self.tika_url();

        tracing::debug!(
            "Sending {} ({} bytes) to {}",
            path.display(),
            document.len(),
            url
        );

        let response = self
            .client
            .put(&url)
            .header(ACCEPT, "text/plain")
            .timeout(self.timeout)
            .body(document)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Tika response status: {}", status);
        if !status.is_success() {
            return Err(EtlError::ExtractionError {
                message: format!("Tika returned {} for {}", status, path.display()),
            });
        }

        let content = response.text().await?;
        if content.trim().is_empty() {
            tracing::warn!("Tika returned no text for {}", path.display());
        }

        Ok(StatementText {
            source: path.display().to_string(),
            content,
        })
    }
}
