#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::adapters::tika::DEFAULT_TIKA_ENDPOINT;
use crate::domain::model::{ExtractorKind, OutputFormat};
use crate::domain::ports::ConfigProvider;
use crate::i18n::Language;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_existing_file, validate_non_empty_list, validate_path, validate_range, validate_url,
    Validate,
};
use std::path::Path;
use toml_config::TomlConfig;

pub const DEFAULT_OUTPUT_PATH: &str = "./output";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Effective settings for one statement run: command line over settings
/// file over defaults.
#[derive(Clone)]
pub struct RunConfig {
    pub input_path: String,
    pub output_path: String,
    pub backend: ExtractorKind,
    pub tika_endpoint: String,
    pub timeout_seconds: u64,
    pub pdfium_library_dir: Option<String>,
    pub password: Option<String>,
    pub parser_name: Option<String>,
    pub rules_path: Option<String>,
    pub output_formats: Vec<OutputFormat>,
    pub language: Language,
    pub summary: bool,
    pub monitor: bool,
}

impl std::fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunConfig")
            .field("input_path", &self.input_path)
            .field("output_path", &self.output_path)
            .field("backend", &self.backend)
            .field("tika_endpoint", &self.tika_endpoint)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("pdfium_library_dir", &self.pdfium_library_dir)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("parser_name", &self.parser_name)
            .field("rules_path", &self.rules_path)
            .field("output_formats", &self.output_formats)
            .field("language", &self.language)
            .field("summary", &self.summary)
            .field("monitor", &self.monitor)
            .finish()
    }
}

impl RunConfig {
    pub fn new(input_path: impl Into<String>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            backend: ExtractorKind::Auto,
            tika_endpoint: DEFAULT_TIKA_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            pdfium_library_dir: None,
            password: None,
            parser_name: None,
            rules_path: None,
            output_formats: vec![OutputFormat::Xlsx],
            language: Language::En,
            summary: false,
            monitor: false,
        }
    }

    /// Defaults overlaid with whatever the settings file sets.
    pub fn with_file(input_path: impl Into<String>, file: &TomlConfig) -> Self {
        let mut config = Self::new(input_path);
        let extraction = &file.extraction;
        if let Some(backend) = extraction.backend {
            config.backend = backend;
        }
        if let Some(endpoint) = &extraction.tika_endpoint {
            config.tika_endpoint = endpoint.clone();
        }
        if let Some(timeout) = extraction.timeout_seconds {
            config.timeout_seconds = timeout;
        }
        config.pdfium_library_dir = extraction.pdfium_library_dir.clone();
        config.parser_name = extraction.parser.clone();
        config.rules_path = file.rules.path.clone();
        if let Some(path) = &file.output.path {
            config.output_path = path.clone();
        }
        if let Some(formats) = &file.output.formats {
            config.output_formats = formats.clone();
        }
        if let Some(language) = file.output.language {
            config.language = language;
        }
        config.summary = file.output.summary.unwrap_or(false);
        config.monitor = file.monitoring.enabled;
        config
    }

    #[cfg(feature = "cli")]
    pub fn from_source_args(args: &cli::SourceArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };

        let mut config = Self::with_file(args.input.clone(), &file);
        if let Some(backend) = args.backend {
            config.backend = backend;
        }
        if let Some(endpoint) = &args.tika_endpoint {
            config.tika_endpoint = endpoint.clone();
        }
        if let Some(timeout) = args.timeout {
            config.timeout_seconds = timeout;
        }
        if args.pdfium_dir.is_some() {
            config.pdfium_library_dir = args.pdfium_dir.clone();
        }
        config.password = args.password.clone();
        Ok(config)
    }

    #[cfg(feature = "cli")]
    pub fn from_parse_args(args: &cli::ParseArgs) -> Result<Self> {
        let mut config = Self::from_source_args(&args.source)?;
        if args.parser.is_some() {
            config.parser_name = args.parser.clone();
        }
        if args.rules.is_some() {
            config.rules_path = args.rules.clone();
        }
        if let Some(path) = &args.output_dir {
            config.output_path = path.clone();
        }
        if !args.format.is_empty() {
            config.output_formats = args.format.clone();
        }
        if let Some(language) = args.language {
            config.language = language;
        }
        config.summary |= args.summary;
        config.monitor |= args.monitor;
        Ok(config)
    }
}

impl ConfigProvider for RunConfig {
    fn input_path(&self) -> &str {
        &self.input_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn backend(&self) -> ExtractorKind {
        self.backend
    }

    fn tika_endpoint(&self) -> &str {
        &self.tika_endpoint
    }

    fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    fn pdfium_library_dir(&self) -> Option<&str> {
        self.pdfium_library_dir.as_deref()
    }

    fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    fn parser_name(&self) -> Option<&str> {
        self.parser_name.as_deref()
    }

    fn rules_path(&self) -> Option<&str> {
        self.rules_path.as_deref()
    }

    fn output_formats(&self) -> &[OutputFormat] {
        &self.output_formats
    }

    fn language(&self) -> Language {
        self.language
    }
}

impl Validate for RunConfig {
    fn validate(&self) -> Result<()> {
        validate_existing_file("input", &self.input_path)?;
        validate_path("output_path", &self.output_path)?;
        validate_non_empty_list("output.formats", &self.output_formats)?;
        validate_range("timeout_seconds", self.timeout_seconds, 1, 600)?;

        if self.backend.resolve(Path::new(&self.input_path)) == ExtractorKind::Tika {
            validate_url("tika_endpoint", &self.tika_endpoint)?;
        }
        if let Some(rules) = &self.rules_path {
            validate_existing_file("rules", rules)?;
        }
        Ok(())
    }
}
