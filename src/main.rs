use clap::Parser;
use cost_etl::utils::{logger, validation::Validate};
use cost_etl::{EstimateConfig, EstimateEngine, EstimatePipeline, HttpCatalogSource, LocalStorage};

#[derive(Parser)]
#[command(name = "cost-etl")]
#[command(about = "Estimates monthly cloud costs for a server inventory")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "estimate-config.toml")]
    config: String,

    /// Override the inventory CSV path from config
    #[arg(long)]
    inventory: Option<String>,

    /// Override the output directory from config
    #[arg(long)]
    output_path: Option<String>,

    /// Override the catalog region from config
    #[arg(long)]
    region: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be queried without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting cost-etl");

    // 載入 TOML 配置，找不到檔案時使用內建預設值
    let mut config = if std::path::Path::new(&args.config).exists() {
        tracing::info!("📁 Loading configuration from: {}", args.config);
        match EstimateConfig::from_file(&args.config) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(1);
            }
        }
    } else {
        tracing::info!(
            "📁 No config file at '{}', using built-in defaults",
            args.config
        );
        EstimateConfig::default()
    };

    // 應用命令列覆蓋設定
    if let Some(inventory) = args.inventory.clone() {
        config.inventory.path = inventory;
        tracing::info!("🔧 Inventory path overridden to: {}", config.inventory.path);
    }
    if let Some(output_path) = args.output_path.clone() {
        config.output.path = output_path;
        tracing::info!("🔧 Output path overridden to: {}", config.output.path);
    }
    if let Some(region) = args.region.clone() {
        config.pricing.region = region;
        tracing::info!("🔧 Catalog region overridden to: {}", config.pricing.region);
    }

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
        tracing::info!("🔍 DRY RUN MODE - No catalog queries will be issued");
        perform_dry_run(&config);
        return Ok(());
    }

    // 決定監控設定
    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 建立目錄來源、存儲與估價管道
    let mut source = HttpCatalogSource::new(&config.pricing.endpoint);
    if let Some(headers) = config.pricing.headers.clone() {
        source = source.with_headers(headers);
    }
    if let Some(timeout) = config.pricing.timeout_seconds {
        source = source.with_timeout_seconds(timeout);
    }
    let storage = LocalStorage::new(".".to_string());
    let pipeline = EstimatePipeline::new(storage, source, config);

    // 建立引擎並運行
    let engine = EstimateEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Cost estimation completed successfully!");
            tracing::info!("📁 Report saved to: {}", output_path);
            println!("✅ Cost estimation completed successfully!");
            println!("📁 Report saved to: {}", output_path);
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Cost estimation failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                cost_etl::utils::error::ErrorSeverity::Low => 0,
                cost_etl::utils::error::ErrorSeverity::Medium => 2,
                cost_etl::utils::error::ErrorSeverity::High => 1,
                cost_etl::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &EstimateConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Endpoint: {}", config.pricing.endpoint);
    println!("  Region: {}", config.pricing.region);
    println!(
        "  Services: {} + {} ({})",
        config.services.compute_label,
        config.services.database_label,
        config.services.database_engines.join(", ")
    );
    println!(
        "  Generation markers: {}",
        if config.matching.generation_markers.is_empty() {
            "none (all families)".to_string()
        } else {
            config.matching.generation_markers.join(", ")
        }
    );
    println!("  Inventory: {}", config.inventory.path);
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output.formats.join(", "));

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &EstimateConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Catalog queries that would be issued:");
    println!(
        "  {} listing for location '{}'",
        config.services.compute_code, config.pricing.region
    );
    for engine in &config.services.database_engines {
        println!(
            "  {} listing for location '{}', engine '{}'",
            config.services.database_code, config.pricing.region, engine
        );
    }
    println!("  Plus one exact price query per matching attempt");

    println!();
    println!("⚙️ Costing:");
    println!("  Hours per month: {}", config.costing.hours_per_month);
    println!(
        "  Storage rate: {} USD per GB-month",
        config.costing.storage_rate_per_gb_month
    );

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    println!("  Formats: {}", config.output.formats.join(", "));

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}
