use crate::core::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<String> {
        let started = Instant::now();
        tracing::info!("Starting lab report analysis...");

        // Extract
        let documents = self.pipeline.extract().await?;
        tracing::info!("📄 Read {} report(s)", documents.len());

        // Transform
        let transformed_result = self.pipeline.transform(documents).await?;
        tracing::info!("🧪 Analysed {} report(s)", transformed_result.reports.len());

        // Load
        let output_path = self.pipeline.load(transformed_result).await?;
        tracing::info!("📁 Output saved to: {} ({:?})", output_path, started.elapsed());

        Ok(output_path)
    }
}
