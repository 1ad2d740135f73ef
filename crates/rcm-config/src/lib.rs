// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # rcm-config
//!
//! Configuration management for the RCM backend.
//!
//! ## Features
//!
//! - **Schema Definition**: Typed configuration with per-section validation
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: Override config values via `RCM_*` variables
//! - **Placeholders**: `${VAR}` and `${VAR:default}` inside config files
//!
//! ## Quick Start
//!
//! ```no_run
//! use rcm_config::loader::load_config;
//!
//! let config = load_config("rcm.yaml").unwrap();
//!
//! println!("Listening on {}", config.server.socket_addr());
//! println!("Routes under /{}", config.server.routes_version);
//! ```
//!
//! ## Configuration Schema
//!
//! - `environment` - production, development, staging or test
//! - `server` - bind address, port, route version, CORS, timeouts
//! - `database` - storage provider and MongoDB connection
//! - `jwt` - signing secret and token lifetimes
//! - `security` - bcrypt cost and token purge interval
//! - `logging` - level, format and log directory
//! - `bootstrap` - optional initial superadmin
//!
//! Values in config files can reference environment variables:
//!
//! ```yaml
//! jwt:
//!   secret: "${JWT_SECRET}"
//! database:
//!   host: "${DB_HOST:localhost}"
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader, load_config, load_config_str};
pub use schema::{
    BootstrapConfig, CorsConfig, DatabaseConfig, DatabaseProvider, Environment, JwtAlgorithm,
    JwtConfig, LogFormat, LogLevel, LoggingConfig, RcmConfig, SecretValue, SecurityConfig,
    ServerConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// =============================================================================
// Prelude
// =============================================================================

/// Convenience re-exports for common use cases.
pub mod prelude {
    pub use crate::error::{ConfigError, ConfigResult};
    pub use crate::loader::{ConfigLoader, load_config};
    pub use crate::schema::{DatabaseProvider, Environment, RcmConfig, SecretValue};
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "rcm-config");
    }

    #[test]
    fn test_prelude_imports() {
        use prelude::*;
        let config = RcmConfig::default();
        assert_eq!(config.database.provider, DatabaseProvider::Memory);
    }
}
