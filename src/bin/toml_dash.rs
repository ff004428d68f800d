use clap::Parser;
use climate_dash::core::{ConfigProvider, Pipeline};
use climate_dash::server::{self, AppState};
use climate_dash::utils::error::ErrorSeverity;
use climate_dash::utils::{logger, validation::Validate};
use climate_dash::{DashboardEngine, DashboardPipeline, LocalStorage, TomlConfig};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "toml-dash")]
#[command(about = "Climate dashboard driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dashboard.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override server setting from config
    #[arg(long)]
    serve: Option<bool>,

    /// Show what would be built without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 設定檔決定日誌格式，所以先載入
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    logger::init_with_level(args.verbose, config.json_logs(), config.log_level());
    tracing::info!("🚀 Starting TOML-based dashboard '{}'", config.name());
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - nothing will be fetched or written");
        perform_dry_run(&config);
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    let serve = args.serve.unwrap_or_else(|| config.serve());
    let bind = config.bind().to_string();
    let font_path = config.font_path().to_string();

    let storage = LocalStorage::new(config.output_path().to_string());
    let pipeline = DashboardPipeline::new(storage, config)?;

    let result = if serve {
        match pipeline.extract().await {
            Ok(raw) => server::serve(Arc::new(AppState::new(raw, font_path)), &bind).await,
            Err(e) => Err(e),
        }
    } else {
        let engine = DashboardEngine::new_with_monitoring(pipeline, monitor_enabled);
        engine.run().await.map(|output_path| {
            tracing::info!("✅ Dashboard written to: {}", output_path);
            println!("✅ Dashboard written to: {}", output_path);
        })
    };

    if let Err(e) = result {
        tracing::error!(
            "❌ Dashboard failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

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

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Dashboard: {}", config.name());
    println!("  NOAA source: {}", config.noaa_endpoint());
    println!(
        "  Study data: {}",
        config.study_file().unwrap_or("synthetic (seed 42)")
    );
    println!("  Output: {}", config.output_path());
    if config.serve() {
        println!("  Server: http://{}", config.bind());
    }
    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }
    println!();
}

fn perform_dry_run(config: &TomlConfig) {
    let options = config.options();
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📡 Data Sources:");
    println!("  NOAA endpoint: {}", config.noaa_endpoint());
    println!("  Timeout: {}s", config.request_timeout_secs());
    match config.seed() {
        Some(seed) => println!("  Fallback series seed: {}", seed),
        None => println!("  Fallback series seed: random"),
    }

    println!();
    println!("⚙️ Dashboard Options:");
    match options.climate_range {
        Some(r) => println!("  NOAA range: {} .. {}", r.start, r.end),
        None => println!("  NOAA range: full series"),
    }
    match options.study_range {
        Some(r) => println!("  Study range: {} .. {}", r.start, r.end),
        None => println!("  Study range: full dataset"),
    }
    if options.smoothing_window > 0 {
        println!("  ✅ Score smoothing: {}-year rolling mean", options.smoothing_window);
    }
    if options.standardize {
        println!("  ✅ Score standardization (Z-score)");
    }

    println!();
    println!("💾 Output:");
    println!("  Path: {}", config.output_path());
    println!("  Font: {}", config.font_path());
    if config.bundle() {
        println!("  Bundle: dashboard_bundle.zip");
    }

    println!();
    println!("✅ Dry run analysis complete.");
}
