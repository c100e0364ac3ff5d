//! Logging infrastructure
//!
//! - Console logging (human-readable, stderr) in verbose mode
//! - JSON file logging (daily rolling) always

use crate::config::TelemetryConfig;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "llm_backend.log";

/// Keeps the log writer alive; drop it last
pub struct Telemetry {
    log_dir: PathBuf,
    _file_guard: WorkerGuard,
}

impl Telemetry {
    /// Initialize the global subscriber
    ///
    /// `RUST_LOG` takes precedence over the verbosity flag.
    pub fn init(config: &TelemetryConfig) -> anyhow::Result<Self> {
        let log_dir = config.log_dir.clone();
        let verbose = config.verbose;
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            if verbose {
                EnvFilter::new("debug,hyper=info,reqwest=info,h2=info,rustls=info")
            } else {
                EnvFilter::new("info,hyper=warn,reqwest=warn,h2=warn,rustls=warn")
            }
        });

        if verbose {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_writer(std::io::stderr)
                        .compact(),
                )
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init()
                .ok();
        } else {
            // File only, stdout stays clean for command output
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init()
                .ok();
        }

        tracing::info!(
            log_dir = %log_dir.display(),
            verbose,
            "Telemetry initialized"
        );

        Ok(Self {
            log_dir,
            _file_guard: file_guard,
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_log_dir() {
        let temp = TempDir::new().unwrap();
        let config = TelemetryConfig {
            log_dir: temp.path().join("logs"),
            verbose: false,
        };

        let telemetry = Telemetry::init(&config).unwrap();
        assert!(telemetry.log_dir().is_dir());

        // A second init must not fail even though the global subscriber is set
        let again = Telemetry::init(&config).unwrap();
        assert_eq!(again.log_dir(), telemetry.log_dir());
    }
}
