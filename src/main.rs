#![cfg_attr(all(windows, feature = "windowed"), windows_subsystem = "windows")]

use anyhow::Context;
use cec_parser::adapters::build_extractor;
use cec_parser::config::cli::{Command, ParseArgs, RulesArgs, SourceArgs};
use cec_parser::config::toml_config::TomlConfig;
use cec_parser::i18n::translate;
use cec_parser::utils::error::ErrorSeverity;
use cec_parser::utils::{logger, validation::Validate};
use cec_parser::{
    CliConfig, EtlEngine, EtlError, LocalStorage, ParserRegistry, RuleSet, RunConfig,
    StatementPipeline,
};
use clap::Parser;
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    match cli.command {
        Command::Parse(args) => {
            if let Err(e) = parse(&args).await {
                exit_with(&e);
            }
        }
        Command::Detect(args) => {
            if let Err(e) = detect(&args).await {
                exit_with(&e);
            }
        }
        Command::Parsers => {
            for parser in ParserRegistry::new().parsers() {
                println!("{:<20} {}", parser.name(), parser.description());
            }
        }
        Command::Rules(args) => print_rules(&args)?,
        #[cfg(feature = "pdf")]
        Command::Decrypt(args) => {
            cec_parser::adapters::pdf::decrypt_pdf(
                Path::new(&args.input),
                Path::new(&args.output),
                &args.password,
                args.pdfium_dir.as_deref().map(Path::new),
            )
            .await
            .with_context(|| format!("could not decrypt {}", args.input))?;
            println!("✅ Decrypted copy written to {}", args.output);
        }
    }

    Ok(())
}

async fn parse(args: &ParseArgs) -> Result<(), EtlError> {
    let config = RunConfig::from_parse_args(args)?;
    tracing::debug!("Run config: {:?}", config);
    config.validate()?;

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let language = config.language;
    let print_summary = config.summary;
    let monitor = config.monitor;
    let storage = LocalStorage::new(config.output_path.clone());
    let engine = EtlEngine::new_with_monitoring(StatementPipeline::new(storage, config), monitor);

    let outcome = engine.run().await?;
    println!(
        "✅ {} transactions parsed with {}",
        outcome.result.transactions.len(),
        outcome.result.parser_name
    );
    for output in &outcome.outputs {
        println!("📁 {}", output);
    }

    if print_summary {
        let summary = &outcome.result.summary;
        println!();
        println!(
            "{:<24} {:>12}",
            translate("over_x_months", language),
            translate("sum", language)
        );
        for (months, sum) in summary.rows() {
            println!("{:<24} {:>12.2}", months, sum);
        }
        println!("{:<24} {:>12.2}", translate("expenses", language), summary.expenses);
    }
    Ok(())
}

async fn detect(args: &SourceArgs) -> Result<(), EtlError> {
    let config = RunConfig::from_source_args(args)?;
    config.validate()?;

    let input = Path::new(&config.input_path);
    let text = build_extractor(&config, input)?.extract(input).await?;
    let registry = ParserRegistry::new();
    let parser = registry
        .auto_detect(&text.content)
        .ok_or(EtlError::NoMatchingParser {
            source_name: text.source,
        })?;

    println!("{}", parser.name());
    Ok(())
}

fn print_rules(args: &RulesArgs) -> anyhow::Result<()> {
    let file_rules = match &args.config {
        Some(path) => TomlConfig::from_file(path)?.rules.path,
        None => None,
    };

    let rules = match args.rules.as_ref().or(file_rules.as_ref()) {
        Some(path) => {
            RuleSet::from_file(path).with_context(|| format!("could not load rules from {}", path))?
        }
        None => RuleSet::embedded()?,
    };

    for rule in rules.rules() {
        println!("{},{}", rule.pattern, rule.category);
    }
    Ok(())
}

fn exit_with(e: &EtlError) -> ! {
    tracing::error!(
        "❌ Processing failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(exit_code(e.severity()));
}

/// Always non-zero: this is only reached on a failed run.
fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
