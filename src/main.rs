use clap::Parser;
use climate_dash::core::{ConfigProvider, Pipeline};
use climate_dash::server::{self, AppState};
use climate_dash::utils::error::{DashError, ErrorSeverity};
use climate_dash::utils::{logger, validation::Validate};
use climate_dash::{CliConfig, DashboardEngine, DashboardPipeline, LocalStorage};
use std::sync::Arc;

fn exit_code(e: &DashError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn report_failure(e: &DashError) {
    tracing::error!(
        "❌ Dashboard failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    logger::init(config.verbose, config.log_json);
    tracing::info!("Starting climate-dash");
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let serve = config.serve;
    let bind = config.bind.clone();
    let font_path = config.font_path().to_string();
    let monitor = config.monitor;

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = match DashboardPipeline::new(storage, config) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            report_failure(&e);
            std::process::exit(exit_code(&e).max(1));
        }
    };

    let result = if serve {
        match pipeline.extract().await {
            Ok(raw) => server::serve(Arc::new(AppState::new(raw, font_path)), &bind).await,
            Err(e) => Err(e),
        }
    } else {
        let engine = DashboardEngine::new_with_monitoring(pipeline, monitor);
        engine.run().await.map(|output_path| {
            tracing::info!("✅ Dashboard written to: {}", output_path);
            println!("✅ Dashboard written to: {}", output_path);
        })
    };

    if let Err(e) = result {
        report_failure(&e);
        let code = exit_code(&e);
        if code > 0 {
            std::process::exit(code);
        }
    }

    Ok(())
}
