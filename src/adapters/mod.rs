// Adapters layer: concrete implementations of the domain ports for local
// files, the Tika HTTP service and pdfium.

#[cfg(feature = "pdf")]
pub mod pdf;
pub mod storage;
pub mod text;
pub mod tika;

use std::path::Path;
use std::time::Duration;

use crate::domain::model::ExtractorKind;
use crate::domain::ports::{ConfigProvider, TextExtractor};
use crate::utils::error::{EtlError, Result};

/// Builds the extractor for `input` according to the configured backend.
pub fn build_extractor<C: ConfigProvider>(config: &C, input: &Path) -> Result<Box<dyn TextExtractor>> {
    let kind = config.backend().resolve(input);
    tracing::debug!("Using {:?} text extraction for {}", kind, input.display());

    match kind {
        ExtractorKind::Text => Ok(Box::new(text::PlainTextExtractor)),
        ExtractorKind::Tika => Ok(Box::new(tika::TikaExtractor::new(
            config.tika_endpoint(),
            Duration::from_secs(config.timeout_seconds()),
        )?)),
        ExtractorKind::Pdfium => pdfium_extractor(config),
        ExtractorKind::Auto => Err(EtlError::ProcessingError {
            message: "extraction backend was not resolved".to_string(),
        }),
    }
}

#[cfg(feature = "pdf")]
fn pdfium_extractor<C: ConfigProvider>(config: &C) -> Result<Box<dyn TextExtractor>> {
    Ok(Box::new(pdf::PdfiumExtractor::new(
        config.pdfium_library_dir().map(std::path::PathBuf::from),
        config.password().map(str::to_string),
    )))
}

#[cfg(not(feature = "pdf"))]
fn pdfium_extractor<C: ConfigProvider>(_config: &C) -> Result<Box<dyn TextExtractor>> {
    Err(EtlError::InvalidConfigValueError {
        field: "backend".to_string(),
        value: "pdfium".to_string(),
        reason: "this build has no PDF support; use --backend tika".to_string(),
    })
}
