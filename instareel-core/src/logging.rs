//! Tracing subscriber setup and operation logging helpers
//!
//! `RUST_LOG` wins over the configured level when it is set.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// `[logging]` section of the service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base filter, e.g. `info` or `warn`
    pub level: String,
    pub format: LogFormat,
    /// Source file and line on every event
    pub include_location: bool,
    /// Thread ids and names on every event
    pub include_thread: bool,
    /// Append to `log_file_path` instead of writing to stdout
    pub log_to_file: bool,
    pub log_file_path: Option<PathBuf>,
    /// Emit an event when each span closes, with its busy/idle time
    pub enable_performance_monitoring: bool,
    /// Extra `target=level` directives layered on top of `level`
    pub filter_directives: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            include_location: false,
            include_thread: false,
            log_to_file: false,
            log_file_path: None,
            enable_performance_monitoring: false,
            filter_directives: vec![
                "instareel_core=debug".to_string(),
                "instareel_applications=debug".to_string(),
                "instareel_web=debug".to_string(),
                "tower_http=info".to_string(),
            ],
        }
    }
}

impl LoggingConfig {
    /// Same defaults with a different base level
    pub fn with_level(level: &str) -> Self {
        Self {
            level: level.to_string(),
            ..Self::default()
        }
    }

    fn env_filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        let base =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        self.filter_directives.iter().try_fold(base, |filter, directive| {
            Ok(filter.add_directive(directive.parse()?))
        })
    }

    fn writer(&self) -> std::io::Result<BoxMakeWriter> {
        if !self.log_to_file {
            return Ok(BoxMakeWriter::new(std::io::stdout));
        }
        let path = self.log_file_path.as_ref().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "logging.log_to_file is set but logging.log_file_path is missing",
            )
        })?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(BoxMakeWriter::new(std::sync::Mutex::new(file)))
    }
}

/// Install the global subscriber described by `config`.
///
/// Fails when a directive does not parse, the log file cannot be opened, or a global
/// subscriber is already installed.
pub fn init_logging(
    config: &LoggingConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = config.env_filter()?;
    let writer = config.writer()?;

    let layer = fmt::layer()
        .with_writer(writer)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_thread_ids(config.include_thread)
        .with_thread_names(config.include_thread)
        .with_span_events(if config.enable_performance_monitoring {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        });

    let layer = match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()?;
    Ok(())
}

/// Timing of awaited external calls
pub mod performance {
    use std::time::Instant;
    use tracing::{debug_span, Instrument};

    /// Await `future` inside a span named after `operation` and log how long it took
    pub async fn measure_async<F, T>(operation: &'static str, future: F) -> T
    where
        F: std::future::Future<Output = T>,
    {
        let started = Instant::now();
        let result = future
            .instrument(debug_span!("timed", operation))
            .await;

        tracing::debug!(
            target: "performance",
            operation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Timed operation finished"
        );
        result
    }
}

/// `log_operation_start!("login", account_id = id)`
#[macro_export]
macro_rules! log_operation_start {
    ($operation:expr $(, $($field:tt)+)?) => {
        $crate::tracing::info!(operation = $operation, $($($field)+ ,)? "Operation started")
    };
}

#[macro_export]
macro_rules! log_operation_success {
    ($operation:expr $(, $($field:tt)+)?) => {
        $crate::tracing::info!(operation = $operation, $($($field)+ ,)? "Operation succeeded")
    };
}

/// Logs `$error` with its display form under `error`
#[macro_export]
macro_rules! log_operation_error {
    ($operation:expr, $error:expr $(, $($field:tt)+)?) => {
        $crate::tracing::error!(
            operation = $operation,
            error = %$error,
            $($($field)+ ,)?
            "Operation failed"
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_parse() {
        assert!(LoggingConfig::default().env_filter().is_ok());
        assert_eq!(LoggingConfig::with_level("debug").level, "debug");
    }

    #[test]
    fn test_bad_directive_is_rejected() {
        let config = LoggingConfig {
            filter_directives: vec!["instareel_web=loud".to_string()],
            ..LoggingConfig::default()
        };
        assert!(config.env_filter().is_err());
    }

    #[test]
    fn test_file_writer_appends_to_configured_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = LoggingConfig {
            log_to_file: true,
            log_file_path: Some(dir.path().join("instareel.log")),
            ..LoggingConfig::default()
        };
        assert!(config.writer().is_ok());
        assert!(dir.path().join("instareel.log").exists());
    }

    #[test]
    fn test_file_logging_requires_path() {
        let config = LoggingConfig {
            log_to_file: true,
            log_file_path: None,
            ..LoggingConfig::default()
        };
        assert!(init_logging(&config).is_err());
    }

    #[tokio::test]
    async fn test_measure_async_returns_value() {
        let value = performance::measure_async("noop", async { 42 }).await;
        assert_eq!(value, 42);
    }
}
