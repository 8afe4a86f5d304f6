use anyhow::Context;
use clap::Parser;
use spurious_ireland::core::ConfigProvider;
use spurious_ireland::domain::model::SeriesSpec;
use spurious_ireland::utils::error::ErrorSeverity;
use spurious_ireland::utils::{logger, validation::Validate};
use spurious_ireland::{EtlEngine, LocalStorage, SpuriousPipeline, TomlConfig};

#[derive(Parser)]
#[command(name = "toml-report")]
#[command(about = "Build the spurious correlation report from a TOML configuration")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "spurious-config.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Force bundled sample data
    #[arg(long)]
    offline: bool,

    /// Dry run - show what would be fetched without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    tracing::info!("🚀 Starting TOML-based report tool");
    tracing::info!("📁 Loading configuration from: {}", args.config);

    let mut config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("failed to load config file '{}'", args.config))?;

    // 應用命令列覆蓋設定
    if args.offline {
        config.source.offline = true;
        tracing::info!("🔧 Offline mode forced from the command line");
    }

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
        perform_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(config.output_path());
    let pipeline = SpuriousPipeline::new(storage, config).context("failed to build HTTP client")?;
    let engine = EtlEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Report completed successfully!");
            println!("✅ Report completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Report failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

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
    println!("  Report: {}", config.report.name);
    if !config.report.description.is_empty() {
        println!("  Description: {}", config.report.description);
    }
    println!("  Source: {}", config.api_base());
    println!("  Output: {}", config.output_path());
    println!("  Offline: {}", config.offline());

    match config.year_range() {
        Some(_) => println!(
            "  Years: {} to {}",
            config.report.from_year.map(|y| y.to_string()).unwrap_or_else(|| "first".to_string()),
            config.report.to_year.map(|y| y.to_string()).unwrap_or_else(|| "last".to_string()),
        ),
        None => println!("  Years: all"),
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Series:");
    for spec in config.series() {
        println!("  {} <- {}", spec.name, source_line(spec, config.offline()));
    }

    println!();
    println!("📈 Comparisons:");
    let selected = config.selected_comparisons();
    for comparison in config.comparisons() {
        if selected.is_empty() || selected.contains(&comparison.key) {
            println!("  {}: {} vs {}", comparison.key, comparison.left, comparison.right);
        }
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");
}

/// 描述執行時此序列實際會從哪裡取得資料
fn source_line(spec: &SeriesSpec, offline: bool) -> String {
    let live = spec.cso.as_ref().filter(|_| !offline);
    match (live, &spec.sample) {
        (Some(cso), Some(_)) => format!(
            "table {} ({:?} over '{}'), sample fallback",
            cso.table, cso.aggregate, cso.year_dimension
        ),
        (Some(cso), None) => format!(
            "table {} ({:?} over '{}')",
            cso.table, cso.aggregate, cso.year_dimension
        ),
        (None, Some(_)) => "bundled sample".to_string(),
        // 離線且沒有樣本：執行時會被標記為不可用
        (None, None) => "unavailable".to_string(),
    }
}
