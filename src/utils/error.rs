use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Rules file error on line {line}: {message}")]
    RulesError { line: usize, message: String },

    #[error("Unknown parser '{name}'")]
    UnknownParser { name: String },

    #[error("No parser recognises '{source_name}'")]
    NoMatchingParser { source_name: String },

    #[error("Statement parsing error: {message}")]
    ParseError { message: String },

    #[error("Encrypted PDF '{path}': a password is required")]
    EncryptedPdf { path: String },

    #[error("Text extraction failed: {message}")]
    ExtractionError { message: String },

    #[error("Sheet '{name}' already exists")]
    DuplicateSheet { name: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Extraction,
    Processing,
    Output,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::RulesError { .. }
            | EtlError::UnknownParser { .. } => ErrorCategory::Configuration,
            EtlError::NoMatchingParser { .. }
            | EtlError::ParseError { .. }
            | EtlError::EncryptedPdf { .. } => ErrorCategory::Input,
            EtlError::ApiError(_) | EtlError::ExtractionError { .. } => ErrorCategory::Extraction,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => ErrorCategory::Processing,
            EtlError::ZipError(_) | EtlError::DuplicateSheet { .. } => ErrorCategory::Output,
            EtlError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // A busy or unreachable extraction service is worth retrying.
            EtlError::ApiError(_) | EtlError::ExtractionError { .. } => ErrorSeverity::Medium,
            EtlError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ConfigValidationError { field, .. }
            | EtlError::InvalidConfigValueError { field, .. } => {
                format!("Check the value of '{}' in the config file or command line", field)
            }
            EtlError::MissingConfigError { field } => {
                format!("Provide '{}' on the command line or in the config file", field)
            }
            EtlError::RulesError { .. } => {
                "Every rules line must look like 'pattern,category'".to_string()
            }
            EtlError::UnknownParser { .. } => {
                "Run 'cec_parser parsers' to list the available parsers".to_string()
            }
            EtlError::NoMatchingParser { .. } => {
                "Pick a parser explicitly with --parser".to_string()
            }
            EtlError::EncryptedPdf { .. } => "Pass the PDF password with --password".to_string(),
            EtlError::ApiError(_) | EtlError::ExtractionError { .. } => {
                "Make sure the extraction backend is running, or try --backend pdfium".to_string()
            }
            EtlError::ParseError { .. } => {
                "The statement layout may have changed; try the other parser".to_string()
            }
            EtlError::DuplicateSheet { .. } => {
                "Use a different input file name or output directory".to_string()
            }
            EtlError::IoError(_) => "Check file paths and permissions".to_string(),
            EtlError::ZipError(_)
            | EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. } => {
                "Re-run with -v and report the log output".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Input => format!("Could not read the statement: {}", self),
            ErrorCategory::Extraction => format!("Could not extract text: {}", self),
            ErrorCategory::Processing => format!("Processing failed: {}", self),
            ErrorCategory::Output => format!("Could not write output: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_errors_are_retryable() {
        let err = EtlError::ExtractionError {
            message: "status 503".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Extraction);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_rules_error_message() {
        let err = EtlError::RulesError {
            line: 3,
            message: "Bad rules file".to_string(),
        };
        assert_eq!(err.to_string(), "Rules file error on line 3: Bad rules file");
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().starts_with("Configuration problem"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: EtlError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
