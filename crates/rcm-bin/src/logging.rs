// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Logging and tracing initialization.
//!
//! Flags on the command line win over the `logging` section of the
//! configuration file; `RUST_LOG` wins over both.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, fmt,
    fmt::writer::{BoxMakeWriter, MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::cli::{Cli, LogFormat};
use crate::error::{BinError, BinResult};

/// Name of the log file created inside the log directory.
pub const LOG_FILE_NAME: &str = "rcm.log";

// =============================================================================
// LogSettings
// =============================================================================

/// Effective logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Filter directive, e.g. `info`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
    /// Directory for the log file.
    pub dir: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            dir: None,
        }
    }
}

impl LogSettings {
    /// Merges command-line flags over the configuration file's section.
    pub fn resolve(cli: &Cli, file: Option<&rcm_config::LoggingConfig>) -> Self {
        let base = file.map(Self::from).unwrap_or_default();
        Self {
            level: cli
                .log_level_override()
                .map(str::to_string)
                .unwrap_or(base.level),
            format: cli.log_format.unwrap_or(base.format),
            dir: cli.log_dir.clone().or(base.dir),
        }
    }
}

impl From<&rcm_config::LoggingConfig> for LogSettings {
    fn from(config: &rcm_config::LoggingConfig) -> Self {
        Self {
            level: config.level.as_str().to_string(),
            format: config.format.into(),
            dir: config.dir.clone(),
        }
    }
}

// =============================================================================
// Logging Initialization
// =============================================================================

/// Initializes the global subscriber.
pub fn init_logging(settings: &LogSettings) -> BinResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| BinError::config(format!("Invalid log level '{}': {}", settings.level, e)))?
        .add_directive(static_directive("hyper=warn"))
        .add_directive(static_directive("tower=warn"))
        .add_directive(static_directive("mongodb=warn"));

    let (writer, ansi) = match settings.dir {
        Some(ref dir) => (
            BoxMakeWriter::new(std::io::stdout.and(Mutex::new(open_log_file(dir)?))),
            false,
        ),
        None => (
            BoxMakeWriter::new(std::io::stdout),
            std::io::IsTerminal::is_terminal(&std::io::stdout()),
        ),
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match settings.format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(writer),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_ansi(ansi)
                    .with_writer(writer),
            )
            .try_init(),
    };

    result.map_err(|e| BinError::logging(format!("Failed to install log subscriber: {}", e)))
}

fn static_directive(directive: &'static str) -> tracing_subscriber::filter::Directive {
    // Literal directives always parse.
    directive.parse().unwrap_or_else(|_| LevelFilter::WARN.into())
}

fn open_log_file(dir: &Path) -> BinResult<std::fs::File> {
    std::fs::create_dir_all(dir).map_err(|e| {
        BinError::logging(format!("Failed to create log directory {}: {}", dir.display(), e))
    })?;
    let path = dir.join(LOG_FILE_NAME);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| BinError::logging(format!("Failed to open log file {}: {}", path.display(), e)))
}

// =============================================================================
// Log Level Parsing
// =============================================================================

/// Parses a log level string into a `Level`.
pub fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("DEBUG"), Level::DEBUG);
        assert_eq!(parse_level("warning"), Level::WARN);
        assert_eq!(parse_level("invalid"), Level::INFO);
    }

    #[test]
    fn test_file_section_used_without_flags() {
        let cli = Cli::parse_from(["rcm"]);
        let file = rcm_config::LoggingConfig {
            level: rcm_config::LogLevel::Debug,
            format: rcm_config::LogFormat::Json,
            dir: Some(PathBuf::from("/var/log/rcm")),
        };

        let settings = LogSettings::resolve(&cli, Some(&file));
        if std::env::var_os("RCM_LOG_LEVEL").is_none() {
            assert_eq!(settings.level, "debug");
        }
        if std::env::var_os("RCM_LOG_FORMAT").is_none() {
            assert_eq!(settings.format, LogFormat::Json);
        }
    }

    #[test]
    fn test_flags_override_file() {
        let cli = Cli::parse_from([
            "rcm",
            "-l",
            "error",
            "--log-format",
            "compact",
            "--log-dir",
            "/tmp/x",
        ]);
        let file = rcm_config::LoggingConfig::default();

        let settings = LogSettings::resolve(&cli, Some(&file));
        assert_eq!(settings.level, "error");
        assert_eq!(settings.format, LogFormat::Compact);
        assert_eq!(settings.dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_open_log_file_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs");
        open_log_file(&nested).unwrap();
        assert!(nested.join(LOG_FILE_NAME).exists());
    }
}
