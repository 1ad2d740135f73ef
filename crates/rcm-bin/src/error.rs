// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Failures of the `rcm` binary and their process exit codes.
//!
//! | Code | Failure |
//! |------|---------|
//! | 1 | configuration missing, unreadable or invalid |
//! | 2 | log subscriber or log directory setup |
//! | 3 | storage backend unreachable |
//! | 4 | bootstrap superadmin could not be created |
//! | 5 | HTTP listener failed to bind or serve |
//! | 6 | password hashing (`hash-password`) |
//! | 7 | terminal input or output |

use rcm_api::ApiError;
use rcm_config::ConfigError;
use thiserror::Error;

/// Result type alias for rcm-bin operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors that end an `rcm` invocation.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration problem detected by the binary itself.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file rejected by the loader.
    #[error("Configuration error in {path}")]
    ConfigFile {
        /// Path that was loaded.
        path: String,
        /// Loader failure.
        #[source]
        source: ConfigError,
    },

    /// Logging could not be installed.
    #[error("Logging setup failed: {0}")]
    Logging(String),

    /// The storage backend could not be reached.
    #[error("Store '{provider}' unavailable: {message}")]
    Store {
        /// Configured provider name.
        provider: &'static str,
        /// Connection failure.
        message: String,
    },

    /// The bootstrap superadmin could not be created.
    #[error("Bootstrap account {email} could not be created")]
    Bootstrap {
        /// Configured bootstrap email.
        email: String,
        /// Service failure.
        #[source]
        source: ApiError,
    },

    /// The HTTP server failed to bind or stopped with an error.
    #[error("HTTP server failed")]
    Serve(#[source] ApiError),

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// Reading stdin or rendering output failed.
    #[error("I/O error: {0}")]
    Io(String),
}

impl BinError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Wraps a loader failure for the given file.
    pub fn config_file(path: impl std::fmt::Display, source: ConfigError) -> Self {
        Self::ConfigFile {
            path: path.to_string(),
            source,
        }
    }

    /// Creates a logging setup error.
    pub fn logging(msg: impl Into<String>) -> Self {
        Self::Logging(msg.into())
    }

    /// Creates a store connection error.
    pub fn store(provider: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Store {
            provider,
            message: err.to_string(),
        }
    }

    /// Creates a password hashing error.
    pub fn hashing(err: impl std::fmt::Display) -> Self {
        Self::Hashing(err.to_string())
    }

    /// Creates an I/O error.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::ConfigFile { .. } => 1,
            Self::Logging(_) => 2,
            Self::Store { .. } => 3,
            Self::Bootstrap { .. } => 4,
            Self::Serve(_) => 5,
            Self::Hashing(_) => 6,
            Self::Io(_) => 7,
        }
    }
}

impl From<ConfigError> for BinError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// Error Reporting
// =============================================================================

/// Reports an error with its cause chain on stderr.
pub fn report_error(error: &BinError) {
    eprintln!("Error: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  Caused by: {}", cause);
        source = cause.source();
    }
}

/// Reports an error and exits with the appropriate code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}

// =============================================================================
// Tests
// =============================================================================
