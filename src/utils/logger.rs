use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Maps a `LOGLEVEL` value to a tracing level, case-insensitively; anything unknown is INFO
pub fn parse_level(value: &str) -> Level {
    match value.to_uppercase().as_str() {
        "DEBUG" => Level::DEBUG,
        "ERROR" => Level::ERROR,
        "WARN" => Level::WARN,
        "TRACE" => Level::TRACE,
        _ => Level::INFO,
    }
}

/// Sets up the process-wide logger
///
/// Environment variables:
/// - LOGLEVEL: Sets the log level (DEBUG, INFO, WARN, ERROR, TRACE), default INFO
/// - RUST_LOG: Additional per-target filter directives
pub fn setup_logger() -> Result<(), Box<dyn std::error::Error>> {
    INIT.call_once(|| {
        let level = parse_level(&env::var("LOGLEVEL").unwrap_or_else(|_| "INFO".to_string()));

        let installed = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
            .try_init();

        if installed.is_ok() {
            tracing::debug!("Log level set to: {}", level);
        }
    });

    Ok(())
}
