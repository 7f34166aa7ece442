pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod export;
pub mod i18n;
pub mod parsers;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;
pub use config::RunConfig;

pub use adapters::storage::LocalStorage;
pub use core::{EtlEngine, EtlOutcome, StatementPipeline};
pub use domain::rules::RuleSet;
pub use parsers::{ParserRegistry, StatementParser};
pub use utils::error::{EtlError, Result};
