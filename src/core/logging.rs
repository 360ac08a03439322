//! Subscriber setup: a daily rolling file in the log directory, plus stdout
//! unless `logging.stdout` is off.

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::{AppPaths, LoggingSettings};
use crate::core::errors::SetupError;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the global subscriber. `RUST_LOG` overrides `settings.level`.
/// A second call is a no-op.
pub fn init(paths: &AppPaths, settings: &LoggingSettings) -> Result<(), SetupError> {
    let env_filter = build_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok(), &settings.level)?;

    let log_dir = &paths.log_dir;
    std::fs::create_dir_all(log_dir).map_err(|err| SetupError::io(log_dir, err))?;
    let file_appender = tracing_appender::rolling::daily(log_dir, &settings.file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);
    let stdout_layer = settings
        .stdout
        .then(|| tracing_subscriber::fmt::layer().with_target(false));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .try_init();
    Ok(())
}

/// Filter from `from_env` when it is set and parses, else from `level`.
/// A malformed `level` is a config error; a malformed env value falls back.
pub fn build_filter(from_env: Option<String>, level: &str) -> Result<EnvFilter, SetupError> {
    if let Some(directives) = from_env.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(&directives) {
            Ok(filter) => return Ok(filter),
            Err(err) => eprintln!("Ignoring {}='{}': {}", EnvFilter::DEFAULT_ENV, directives, err),
        }
    }
    EnvFilter::try_new(level)
        .map_err(|err| SetupError::Config(format!("'logging.level' is not a valid filter: {}", err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn configured_level_applies_without_env() {
        let filter = build_filter(None, "medqa_synth=debug").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn env_overrides_configured_level() {
        let filter = build_filter(Some("warn".to_string()), "debug").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));

        let filter = build_filter(Some("  ".to_string()), "debug").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn bad_env_falls_back_but_bad_level_is_an_error() {
        let filter = build_filter(Some("medqa_synth=loud".to_string()), "info").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));

        assert!(matches!(
            build_filter(None, "medqa_synth=loud"),
            Err(SetupError::Config(_))
        ));
    }
}
