// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema definitions for RCM.
//!
//! # Schema Structure
//!
//! ```text
//! RcmConfig
//! ├── environment: Environment
//! ├── server: ServerConfig
//! │   └── cors: CorsConfig
//! ├── database: DatabaseConfig
//! ├── jwt: JwtConfig
//! ├── security: SecurityConfig
//! ├── logging: LoggingConfig
//! └── bootstrap: Option<BootstrapConfig>
//! ```

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default route version prefix.
pub const DEFAULT_ROUTES_VERSION: &str = "v1";

/// Default MongoDB port.
pub const DEFAULT_DB_PORT: u16 = 27017;

/// Default database name.
pub const DEFAULT_DB_NAME: &str = "cybersweep-backend";

/// Default access token lifetime in minutes (7 days).
pub const DEFAULT_ACCESS_EXPIRATION_MINS: u64 = 10_080;

/// Default refresh token lifetime in days.
pub const DEFAULT_REFRESH_EXPIRATION_DAYS: u64 = 30;

/// Default password reset token lifetime in minutes.
pub const DEFAULT_RESET_PASSWORD_EXPIRATION_MINS: u64 = 10;

/// Longest accepted access token lifetime in minutes (one year).
pub const MAX_ACCESS_EXPIRATION_MINS: u64 = 525_600;

/// Longest accepted refresh token lifetime in days (ten years).
pub const MAX_REFRESH_EXPIRATION_DAYS: u64 = 3_650;

/// Longest accepted password reset token lifetime in minutes (one day).
pub const MAX_RESET_PASSWORD_EXPIRATION_MINS: u64 = 1_440;

/// Largest accepted clock skew tolerance in seconds.
pub const MAX_JWT_LEEWAY_SECS: u64 = 300;

/// Default bcrypt work factor.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Bcrypt work factor bounds.
pub const MIN_BCRYPT_COST: u32 = 4;
/// Upper bcrypt work factor bound.
pub const MAX_BCRYPT_COST: u32 = 31;

// =============================================================================
// Top-Level Configuration
// =============================================================================

/// The root configuration structure for RCM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RcmConfig {
    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,

    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Token signing configuration.
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Password and token housekeeping settings.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Initial superadmin account, created on startup when absent.
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
}

impl RcmConfig {
    /// Validates the entire configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.jwt.validate()?;
        self.security.validate()?;
        if let Some(ref bootstrap) = self.bootstrap {
            bootstrap.validate()?;
        }
        Ok(())
    }

    /// Returns non-fatal findings worth surfacing to operators.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if let Some(ref secret) = self.jwt.secret {
            if secret.raw().len() < 32 {
                warnings.push("jwt.secret is shorter than 32 bytes".to_string());
            }
        }
        if self.environment.is_production() {
            if self.database.provider == DatabaseProvider::Memory {
                warnings.push("database.provider 'memory' loses all data on restart".to_string());
            }
            if self.server.cors.allows_any_origin() {
                warnings.push("server.cors.allowed_origins allows any origin".to_string());
            }
        }
        warnings
    }
}

// =============================================================================
// Environment
// =============================================================================

/// Deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production: internal error details are hidden from clients.
    Production,
    /// Local development.
    #[default]
    Development,
    /// Staging.
    Staging,
    /// Automated tests.
    Test,
}

impl Environment {
    /// Returns the environment name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Test => "test",
        }
    }

    /// Parses an environment name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "development" | "dev" => Some(Environment::Development),
            "staging" => Some(Environment::Staging),
            "test" => Some(Environment::Test),
            _ => None,
        }
    }

    /// Returns `true` for production.
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Server Configuration
// =============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// Listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Version segment prefixed to every API route (`/v1/...`).
    #[serde(default = "default_routes_version")]
    pub routes_version: String,

    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_routes_version() -> String {
    DEFAULT_ROUTES_VERSION.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

impl ServerConfig {
    /// Validates the server configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        let version = self.routes_version.trim_matches('/');
        if version.is_empty() || version.contains('/') {
            return Err(ConfigError::validation(
                "server.routes_version",
                "must be a single non-empty path segment",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "server.request_timeout_secs",
                "cannot be zero",
            ));
        }
        if self.max_body_size == 0 {
            return Err(ConfigError::validation(
                "server.max_body_size",
                "cannot be zero",
            ));
        }
        self.cors.validate()?;
        Ok(())
    }

    /// Returns the socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Returns the request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the shutdown timeout as a Duration.
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: DEFAULT_PORT,
            routes_version: default_routes_version(),
            cors: CorsConfig::default(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_size: default_max_body_size(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins (use "*" for all).
    #[serde(default = "default_origins")]
    pub allowed_origins: Vec<String>,

    /// Allow credentials.
    #[serde(default = "default_true")]
    pub allow_credentials: bool,

    /// Max age in seconds.
    #[serde(default = "default_max_age")]
    pub max_age_secs: u64,
}

fn default_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_max_age() -> u64 {
    3600
}

impl CorsConfig {
    /// Returns `true` if any origin is accepted.
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }

    /// Validates the CORS configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.allowed_origins.iter().any(|o| o.trim().is_empty()) {
            return Err(ConfigError::validation(
                "server.cors.allowed_origins",
                "origins cannot be empty strings",
            ));
        }
        Ok(())
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_origins(),
            allow_credentials: true,
            max_age_secs: default_max_age(),
        }
    }
}

// =============================================================================
// Database Configuration
// =============================================================================

/// Storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseProvider {
    /// In-process maps; data is lost on restart.
    #[default]
    Memory,
    /// MongoDB server.
    Mongodb,
}

impl DatabaseProvider {
    /// Returns the provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseProvider::Memory => "memory",
            DatabaseProvider::Mongodb => "mongodb",
        }
    }

    /// Parses a provider name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Some(DatabaseProvider::Memory),
            "mongodb" | "mongo" => Some(DatabaseProvider::Mongodb),
            _ => None,
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Storage backend.
    #[serde(default)]
    pub provider: DatabaseProvider,

    /// Server host.
    #[serde(default = "default_db_host")]
    pub host: String,

    /// Server port.
    #[serde(default = "default_db_port")]
    pub port: u16,

    /// Database name.
    #[serde(default = "default_db_name")]
    pub name: String,

    /// User name.
    #[serde(default)]
    pub username: Option<String>,

    /// Password.
    #[serde(default)]
    pub password: Option<SecretValue>,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    DEFAULT_DB_PORT
}

fn default_db_name() -> String {
    DEFAULT_DB_NAME.to_string()
}

impl DatabaseConfig {
    /// Validates the database configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.provider == DatabaseProvider::Mongodb {
            if self.host.trim().is_empty() {
                return Err(ConfigError::validation("database.host", "cannot be empty"));
            }
            if self.name.trim().is_empty() {
                return Err(ConfigError::validation("database.name", "cannot be empty"));
            }
            if self.password.is_some() && self.username.is_none() {
                return Err(ConfigError::validation(
                    "database.username",
                    "required when a password is set",
                ));
            }
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            provider: DatabaseProvider::default(),
            host: default_db_host(),
            port: DEFAULT_DB_PORT,
            name: default_db_name(),
            username: None,
            password: None,
        }
    }
}

// =============================================================================
// JWT Configuration
// =============================================================================

/// Token signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwtConfig {
    /// HMAC signing secret. Required.
    #[serde(default)]
    pub secret: Option<SecretValue>,

    /// Token issuer; validated when set.
    #[serde(default)]
    pub issuer: Option<String>,

    /// Signing algorithm.
    #[serde(default)]
    pub algorithm: JwtAlgorithm,

    /// Access token lifetime in minutes.
    #[serde(default = "default_access_expiration")]
    pub access_expiration_mins: u64,

    /// Refresh token lifetime in days.
    #[serde(default = "default_refresh_expiration")]
    pub refresh_expiration_days: u64,

    /// Password reset token lifetime in minutes.
    #[serde(default = "default_reset_password_expiration")]
    pub reset_password_expiration_mins: u64,

    /// Clock skew tolerance in seconds.
    #[serde(default)]
    pub leeway_secs: u64,
}

fn default_access_expiration() -> u64 {
    DEFAULT_ACCESS_EXPIRATION_MINS
}

fn default_refresh_expiration() -> u64 {
    DEFAULT_REFRESH_EXPIRATION_DAYS
}

fn default_reset_password_expiration() -> u64 {
    DEFAULT_RESET_PASSWORD_EXPIRATION_MINS
}

impl JwtConfig {
    /// Validates the JWT configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        match self.secret {
            None => return Err(ConfigError::missing_field("jwt.secret")),
            Some(ref secret) if secret.raw().is_empty() => {
                return Err(ConfigError::validation("jwt.secret", "cannot be empty"));
            }
            Some(_) => {}
        }
        for (field, value, max) in [
            (
                "jwt.access_expiration_mins",
                self.access_expiration_mins,
                MAX_ACCESS_EXPIRATION_MINS,
            ),
            (
                "jwt.refresh_expiration_days",
                self.refresh_expiration_days,
                MAX_REFRESH_EXPIRATION_DAYS,
            ),
            (
                "jwt.reset_password_expiration_mins",
                self.reset_password_expiration_mins,
                MAX_RESET_PASSWORD_EXPIRATION_MINS,
            ),
        ] {
            if value == 0 {
                return Err(ConfigError::validation(field, "cannot be zero"));
            }
            if value > max {
                return Err(ConfigError::out_of_range(field, value, 1, max));
            }
        }
        if self.leeway_secs > MAX_JWT_LEEWAY_SECS {
            return Err(ConfigError::out_of_range(
                "jwt.leeway_secs",
                self.leeway_secs,
                0,
                MAX_JWT_LEEWAY_SECS,
            ));
        }
        Ok(())
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: None,
            issuer: None,
            algorithm: JwtAlgorithm::default(),
            access_expiration_mins: DEFAULT_ACCESS_EXPIRATION_MINS,
            refresh_expiration_days: DEFAULT_REFRESH_EXPIRATION_DAYS,
            reset_password_expiration_mins: DEFAULT_RESET_PASSWORD_EXPIRATION_MINS,
            leeway_secs: 0,
        }
    }
}

/// JWT signing algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JwtAlgorithm {
    /// HMAC using SHA-256.
    #[default]
    HS256,
    /// HMAC using SHA-384.
    HS384,
    /// HMAC using SHA-512.
    HS512,
}

// =============================================================================
// Security Configuration
// =============================================================================

/// Password hashing and token housekeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecurityConfig {
    /// Bcrypt work factor.
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Interval between expired-token purges in seconds. Zero disables it.
    #[serde(default = "default_purge_interval")]
    pub token_purge_interval_secs: u64,
}

fn default_bcrypt_cost() -> u32 {
    DEFAULT_BCRYPT_COST
}

fn default_purge_interval() -> u64 {
    3600
}

impl SecurityConfig {
    /// Validates the security configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.bcrypt_cost) {
            return Err(ConfigError::out_of_range(
                "security.bcrypt_cost",
                self.bcrypt_cost,
                MIN_BCRYPT_COST,
                MAX_BCRYPT_COST,
            ));
        }
        Ok(())
    }

    /// Returns the purge interval, or `None` when disabled.
    pub fn token_purge_interval(&self) -> Option<Duration> {
        (self.token_purge_interval_secs > 0)
            .then(|| Duration::from_secs(self.token_purge_interval_secs))
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            token_purge_interval_secs: default_purge_interval(),
        }
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for the log file (stdout only when unset).
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parses a log level string.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Compact single-line text.
    Compact,
    /// JSON for log aggregation.
    Json,
}

// =============================================================================
// Bootstrap Configuration
// =============================================================================

/// Initial superadmin account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Display name.
    #[serde(default = "default_admin_name")]
    pub name: String,

    /// Login email.
    pub email: String,

    /// Initial password.
    pub password: SecretValue,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

impl BootstrapConfig {
    /// Validates the bootstrap account.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.email.contains('@') {
            return Err(ConfigError::validation(
                "bootstrap.email",
                "must be an email address",
            ));
        }
        if self.password.raw().len() < 8 {
            return Err(ConfigError::validation(
                "bootstrap.password",
                "must be at least 8 characters",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Secret Value
// =============================================================================

/// A secret string that never appears in logs or debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Creates a new secret value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the plain value.
    pub fn raw(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue(***)")
    }
}
