// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rcm-bin
//!
//! CLI binary for the RCM backend.
//!
//! - CLI argument parsing with clap
//! - Runtime orchestration (stores, bootstrap account, token purge)
//! - Graceful shutdown handling
//! - Logging initialization
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! rcm
//!
//! # Start with a custom config and port
//! rcm -c /etc/rcm/rcm.yaml run --port 8080
//!
//! # Validate configuration
//! rcm validate --show-config
//!
//! # Hash a password for seeding
//! rcm hash-password 'correct horse battery staple'
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::{LogSettings, init_logging};
pub use runtime::{RuntimeBuilder, ServerRuntime};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
