use clap::{Args, Parser, Subcommand};

use crate::domain::model::{ExtractorKind, OutputFormat};
use crate::i18n::Language;

#[derive(Debug, Parser)]
#[command(name = "cec_parser")]
#[command(about = "Turns CEC Bank statements into categorized CSV and Excel reports")]
#[command(version)]
pub struct CliConfig {
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a statement and write the reports
    Parse(ParseArgs),
    /// Print which parser recognises a statement
    Detect(SourceArgs),
    /// List the available parsers
    Parsers,
    /// Print the categorization rules in effect
    Rules(RulesArgs),
    /// Write an unencrypted copy of a password-protected PDF
    #[cfg(feature = "pdf")]
    Decrypt(DecryptArgs),
}

/// Where to read a statement from and how to get its text.
#[derive(Debug, Clone, Default, Args)]
pub struct SourceArgs {
    /// Statement file (.pdf, or .txt with already extracted text)
    pub input: String,

    /// Path to a TOML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, value_enum)]
    pub backend: Option<ExtractorKind>,

    /// Password for encrypted PDFs
    #[arg(long)]
    pub password: Option<String>,

    #[arg(long)]
    pub tika_endpoint: Option<String>,

    /// Tika request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Directory containing the pdfium shared library
    #[arg(long)]
    pub pdfium_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ParseArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Parser name; auto-detected when omitted
    #[arg(short, long)]
    pub parser: Option<String>,

    /// Rules CSV (pattern,category); defaults to the bundled rules
    #[arg(long)]
    pub rules: Option<String>,

    #[arg(short, long)]
    pub output_dir: Option<String>,

    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub format: Vec<OutputFormat>,

    #[arg(long, value_enum)]
    pub language: Option<Language>,

    /// Print the installment summary
    #[arg(long)]
    pub summary: bool,

    /// Log CPU and memory usage per phase
    #[arg(long)]
    pub monitor: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct RulesArgs {
    #[arg(long)]
    pub rules: Option<String>,

    #[arg(short, long)]
    pub config: Option<String>,
}

#[cfg(feature = "pdf")]
#[derive(Debug, Clone, Args)]
pub struct DecryptArgs {
    pub input: String,

    pub output: String,

    #[arg(long)]
    pub password: String,

    #[arg(long)]
    pub pdfium_dir: Option<String>,
}
