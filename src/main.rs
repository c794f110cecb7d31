use clap::Parser;
use lab_report_etl::core::narrative::HttpNarrativeService;
use lab_report_etl::utils::error::ErrorSeverity;
use lab_report_etl::utils::{logger, validation::Validate};
use lab_report_etl::{CliConfig, EtlEngine, LocalStorage, ReportPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting lab-report-etl CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let narrative = match &config.narrative_endpoint {
        Some(endpoint) => {
            tracing::info!("📝 Narrative service enabled: {}", endpoint);
            Some(HttpNarrativeService::new(
                endpoint.clone(),
                config.narrative_timeout_seconds,
            )?)
        }
        None => None,
    };

    // 建立存儲與管道
    let source = LocalStorage::new(config.input_dir.clone());
    let sink = LocalStorage::new(config.output_path.clone());
    let mut pipeline = ReportPipeline::new(source, sink, config)?;
    if let Some(service) = narrative {
        pipeline = pipeline.with_narrative_service(Box::new(service));
    }

    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Analysis completed successfully!");
            println!("✅ Analysis completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Analysis failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            // 依錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
