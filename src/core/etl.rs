use crate::domain::model::TransformResult;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct EtlOutcome {
    pub outputs: Vec<String>,
    pub result: TransformResult,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<EtlOutcome> {
        tracing::info!("Starting statement processing...");
        self.monitor.log_stats("Start");

        tracing::info!("Extracting text...");
        let text = self.pipeline.extract().await?;
        tracing::info!("Extracted {} characters from {}", text.content.len(), text.source);
        self.monitor.log_stats("Extract");

        tracing::info!("Parsing transactions...");
        let result = self.pipeline.transform(text).await?;
        tracing::info!(
            "Parsed {} transactions with {}",
            result.transactions.len(),
            result.parser_name
        );
        self.monitor.log_stats("Transform");

        tracing::info!("Writing reports...");
        let outputs = self.pipeline.load(result.clone()).await?;
        for output in &outputs {
            tracing::info!("Output saved to: {}", output);
        }
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(EtlOutcome { outputs, result })
    }
}
