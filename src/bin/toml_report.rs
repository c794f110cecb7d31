use clap::Parser;
use lab_report_etl::config::toml_config::TomlConfig;
use lab_report_etl::core::narrative::HttpNarrativeService;
use lab_report_etl::core::ConfigProvider;
use lab_report_etl::utils::error::ErrorSeverity;
use lab_report_etl::utils::{logger, validation::Validate};
use lab_report_etl::{EtlEngine, LocalStorage, ReportPipeline};

#[derive(Parser)]
#[command(name = "toml-report")]
#[command(about = "Lab report analysis driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "lab-report.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if config.json_logs() {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting TOML-based lab report analysis");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!("✅ Configuration loaded and validated successfully");
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let narrative = match &config.narrative {
        Some(narrative) => Some(HttpNarrativeService::new(
            narrative.endpoint.clone(),
            config.narrative_timeout_seconds(),
        )?),
        None => None,
    };

    let source = LocalStorage::new(config.input_path().to_string());
    let sink = LocalStorage::new(config.output_path().to_string());
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

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!(
        "  Report: {} v{}",
        config.report.name,
        config.report.version.as_deref().unwrap_or("-")
    );
    println!("  Input: {} ({} files)", config.input_path(), config.input_files().len());
    println!("  Output: {}/{}", config.output_path(), config.archive_name());
    println!("  Formats: {}", config.output_formats().join(", "));
    println!(
        "  Skip Policy: {:?}, lookahead {} chars",
        config.skip_policy(),
        config.lookahead_chars()
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📄 Reports:");
    for file in config.input_files() {
        println!("  {}/{}", config.input_path(), file);
    }

    // 參考目錄分析
    let (catalog, aliases) = config.reference_data()?;
    println!();
    println!("📚 Reference Catalog:");
    println!("  Items: {}", catalog.len());
    println!("  Aliases: {}", aliases.len());
    for target in aliases.unresolved_targets(&catalog) {
        println!("  ⚠️ Aliases for '{}' will be ignored (not a catalog item)", target);
    }

    println!();
    println!("🩸 Dialysis Adequacy:");
    match config.adequacy_params() {
        Some(params) => println!(
            "  Duration {} h, UF {} L, post weight {} kg",
            params.duration_hours, params.uf_volume_liters, params.post_weight_kg
        ),
        None => println!("  Not configured - URR and KT/V columns are omitted"),
    }

    if let Some(narrative) = &config.narrative {
        println!();
        println!("📝 Narrative endpoint: {}", narrative.endpoint);
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
