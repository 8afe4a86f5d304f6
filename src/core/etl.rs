use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

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

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting report run...");

        // Extract
        tracing::info!("Extracting series...");
        let series = self.pipeline.extract().await?;
        tracing::info!("Extracted {} series", series.len());
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("Correlating series...");
        let result = self.pipeline.transform(series).await?;
        tracing::info!(
            "Merged {} years into {} comparison(s)",
            result.merged.years.len(),
            result.reports.len()
        );
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("Writing report bundle...");
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
