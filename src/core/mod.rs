pub mod etl;
pub mod pipeline;

pub use crate::domain::model::{StatementText, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, TextExtractor};
pub use crate::utils::error::Result;
pub use etl::{EtlEngine, EtlOutcome};
pub use pipeline::StatementPipeline;
