use crate::config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with console output and optional rolling file output
pub fn init(config: &LoggingConfig) {
    // Default to info level for all modules; can be overridden via RUST_LOG env var
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer());

    if config.enabled {
        use std::fs;
        use tracing_appender::rolling;

        if let Err(e) = fs::create_dir_all(&config.directory) {
            eprintln!("Failed to create log directory {}: {}", config.directory, e);
        }

        let file_appender = match config.rotation.as_str() {
            "hourly" => rolling::hourly(&config.directory, &config.file_prefix),
            "never" => rolling::never(&config.directory, &config.file_prefix),
            _ => rolling::daily(&config.directory, &config.file_prefix), // default to daily
        };

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        subscriber
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false), // no ANSI colors in file output
            )
            .init();

        // The non-blocking writer stops flushing once its guard drops; the
        // server logs until process exit, so leak it.
        std::mem::forget(guard);
    } else {
        subscriber.init();
    }
}
