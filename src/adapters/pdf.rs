use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

use crate::domain::model::StatementText;
use crate::domain::ports::TextExtractor;
use crate::utils::error::{EtlError, Result};

/// Local PDF text extraction through the pdfium library.
///
/// pdfium is loaded from `library_dir` when given, otherwise from the system
/// library path. All pdfium calls run on tokio's blocking pool.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    library_dir: Option<PathBuf>,
    password: Option<String>,
}

impl PdfiumExtractor {
    pub fn new(library_dir: Option<PathBuf>, password: Option<String>) -> Self {
        Self {
            library_dir,
            password,
        }
    }
}

fn bind_pdfium(library_dir: Option<&Path>) -> Result<Pdfium> {
    let bindings = match library_dir {
        Some(dir) => {
            let library = Pdfium::pdfium_platform_library_name_at_path(dir);
            Pdfium::bind_to_library(&library).or_else(|e| {
                tracing::debug!(
                    "pdfium not found at {} ({}), trying system library",
                    library.display(),
                    e
                );
                Pdfium::bind_to_system_library()
            })
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| EtlError::ExtractionError {
        message: format!("could not load the pdfium library: {}", e),
    })?;

    Ok(Pdfium::new(bindings))
}

fn map_pdfium_error(path: &Path, error: PdfiumError) -> EtlError {
    match error {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            EtlError::EncryptedPdf {
                path: path.display().to_string(),
            }
        }
        other => EtlError::ExtractionError {
            message: format!("{}: {}", path.display(), other),
        },
    }
}

fn read_pdf_text(library_dir: Option<&Path>, path: &Path, password: Option<&str>) -> Result<String> {
    let pdfium = bind_pdfium(library_dir)?;
    let document = pdfium
        .load_pdf_from_file(path, password)
        .map_err(|e| map_pdfium_error(path, e))?;

    let mut pages = Vec::new();
    for page in document.pages().iter() {
        let text = page.text().map_err(|e| map_pdfium_error(path, e))?;
        pages.push(text.all());
    }

    tracing::debug!("Extracted {} pages from {}", pages.len(), path.display());
    Ok(pages.join("\n"))
}

async fn run_blocking<T, F>(task: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| EtlError::ProcessingError {
            message: format!("pdfium worker failed: {}", e),
        })?
}

#[async_trait]
impl TextExtractor for PdfiumExtractor {
    async fn extract(&self, path: &Path) -> Result<StatementText> {
        let library_dir = self.library_dir.clone();
        let password = self.password.clone();
        let pdf_path = path.to_path_buf();

        let content = run_blocking(move || {
            read_pdf_text(library_dir.as_deref(), &pdf_path, password.as_deref())
        })
        .await?;

        Ok(StatementText {
            source: path.display().to_string(),
            content,
        })
    }
}

/// Writes an unencrypted copy of a password-protected PDF.
pub async fn decrypt_pdf(
    input: &Path,
    output: &Path,
    password: &str,
    library_dir: Option<&Path>,
) -> Result<()> {
    let input = input.to_path_buf();
    let output = output.to_path_buf();
    let password = password.to_string();
    let library_dir = library_dir.map(Path::to_path_buf);

    run_blocking(move || {
        let pdfium = bind_pdfium(library_dir.as_deref())?;
        let source = pdfium
            .load_pdf_from_file(&input, Some(&password))
            .map_err(|e| map_pdfium_error(&input, e))?;

        let mut copy = pdfium
            .create_new_pdf()
            .map_err(|e| map_pdfium_error(&output, e))?;
        copy.pages_mut()
            .append(&source)
            .map_err(|e| map_pdfium_error(&output, e))?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        copy.save_to_file(&output)
            .map_err(|e| map_pdfium_error(&output, e))?;

        tracing::info!("🔓 Wrote decrypted copy to {}", output.display());
        Ok(())
    })
    .await
}
