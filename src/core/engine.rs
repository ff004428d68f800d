use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct DashboardEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> DashboardEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Building dashboard");
        if self.monitor.is_enabled() {
            tracing::debug!("🔍 Phase stats will be logged");
        }
        self.monitor.log_stats("Start");

        let raw = self.pipeline.extract().await?;
        tracing::info!(
            "Extracted {} climate rows, {} study rows",
            raw.climate.points.len(),
            raw.study.records.len()
        );
        self.monitor.log_stats("Extract");

        let report = self.pipeline.transform(raw).await?;
        tracing::info!(
            "Filtered to {} climate rows, {} study rows",
            report.climate.rows.len(),
            report.study.rows.len()
        );
        self.monitor.log_stats("Transform");

        let output_path = self.pipeline.load(report).await?;
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
