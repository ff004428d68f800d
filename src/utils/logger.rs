use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Directives used when `RUST_LOG` is unset. `--verbose` beats a configured level.
fn default_directives(verbose: bool, level: Option<&str>) -> String {
    let level = if verbose { "debug" } else { level.unwrap_or("info") };
    if verbose {
        format!("climate_dash={level},tower_http={level},info")
    } else {
        format!("climate_dash={level},tower_http={level}")
    }
}

fn default_filter(verbose: bool, level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose, level)))
}

pub fn init_cli_logger(verbose: bool, level: Option<&str>) {
    tracing_subscriber::registry()
        .with(default_filter(verbose, level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON lines, for running the server behind a log collector.
pub fn init_json_logger(verbose: bool, level: Option<&str>) {
    tracing_subscriber::registry()
        .with(default_filter(verbose, level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}

pub fn init(verbose: bool, json: bool) {
    init_with_level(verbose, json, None);
}

/// `level` comes from `[monitoring] log_level` in the TOML config.
pub fn init_with_level(verbose: bool, json: bool, level: Option<&str>) {
    if json {
        init_json_logger(verbose, level);
    } else {
        init_cli_logger(verbose, level);
    }
}
