// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading and processing for RCM.
//!
//! # Loading Pipeline
//!
//! 1. Read the file and pick the format from its extension
//! 2. Resolve `${VAR}` / `${VAR:default}` placeholders
//! 3. Parse YAML/TOML/JSON into [`RcmConfig`]
//! 4. Apply `RCM_*` environment overrides
//! 5. Resolve relative paths against the config file directory
//! 6. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! RCM_ENV=production
//! RCM_PORT=3000
//! RCM_ROUTES_VERSION=v1
//! RCM_CORS_ORIGINS=https://app.example.com,https://admin.example.com
//! RCM_CORS_CREDENTIALS=true
//! RCM_DB_PROVIDER=mongodb
//! RCM_DB_HOST=localhost
//! RCM_DB_PORT=27017
//! RCM_DB_NAME=cybersweep-backend
//! RCM_DB_USERNAME=rcm
//! RCM_DB_PASSWORD=...
//! RCM_JWT_SECRET=...
//! RCM_JWT_ACCESS_EXP_MINS=10080
//! RCM_JWT_REFRESH_EXP_DAYS=30
//! RCM_JWT_RESET_PW_EXP_MINS=10
//! RCM_BCRYPT_COST=10
//! RCM_LOG_LEVEL=debug
//! RCM_LOG_DIR=/var/log/rcm
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{DatabaseProvider, Environment, LogLevel, RcmConfig, SecretValue};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

// =============================================================================
// EnvSource
// =============================================================================

/// Where environment lookups are answered from.
#[derive(Debug, Clone, Default)]
enum EnvSource {
    /// The process environment.
    #[default]
    Process,
    /// A fixed set of variables.
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        match self {
            EnvSource::Process => env::var(name).ok(),
            EnvSource::Fixed(vars) => vars.get(name).cloned(),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader for RCM.
///
/// # Examples
///
/// ```no_run
/// use rcm_config::loader::ConfigLoader;
///
/// let loader = ConfigLoader::new();
/// let config = loader.load("rcm.yaml").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base directory for resolving relative paths.
    base_path: Option<PathBuf>,

    /// Environment variable prefix.
    env_prefix: String,

    /// Whether to resolve environment variables in values.
    resolve_env_vars: bool,

    /// Whether to resolve relative paths.
    resolve_paths: bool,

    /// Source of environment variables.
    env: EnvSource,
}

impl ConfigLoader {
    /// Creates a new configuration loader with default settings.
    pub fn new() -> Self {
        Self {
            base_path: None,
            env_prefix: "RCM".to_string(),
            resolve_env_vars: true,
            resolve_paths: true,
            env: EnvSource::Process,
        }
    }

    /// Sets the base path for resolving relative paths.
    pub fn with_base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Enables or disables relative path resolution.
    pub fn with_path_resolution(mut self, enabled: bool) -> Self {
        self.resolve_paths = enabled;
        self
    }

    /// Answers environment lookups from `vars` instead of the process
    /// environment.
    pub fn with_env_map<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = EnvSource::Fixed(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Loads configuration from a file.
    ///
    /// The file format is determined by the file extension:
    /// - `.yaml` or `.yml` - YAML format
    /// - `.toml` - TOML format
    /// - `.json` - JSON format
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<RcmConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        let base_path = self.base_path.clone().unwrap_or_else(|| {
            path.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from("."))
        });

        let content = self.read_file(path)?;
        let format = ConfigFormat::from_path(path)?;
        let mut config = self.parse_content(&content, format, path)?;

        self.finish(&mut config, Some(&base_path))?;

        info!("Configuration loaded successfully");
        debug!(
            environment = %config.environment,
            provider = config.database.provider.as_str(),
            port = config.server.port,
            "Effective configuration"
        );

        Ok(config)
    }

    /// Loads configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<RcmConfig> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)
        } else {
            content.to_string()
        };
        let mut config = parse_str(&content, format)?;
        self.finish(&mut config, self.base_path.as_deref())?;
        Ok(config)
    }

    /// Builds configuration from defaults and environment overrides only.
    pub fn load_defaults(&self) -> ConfigResult<RcmConfig> {
        let mut config = RcmConfig::default();
        self.finish(&mut config, self.base_path.as_deref())?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise falls back to
    /// [`load_defaults`](Self::load_defaults).
    pub fn load_or_defaults(&self, path: impl AsRef<Path>) -> ConfigResult<RcmConfig> {
        let path = path.as_ref();
        if path.exists() {
            self.load(path)
        } else {
            warn!(
                "Configuration file {} not found, using defaults and environment",
                path.display()
            );
            self.load_defaults()
        }
    }

    fn finish(&self, config: &mut RcmConfig, base_path: Option<&Path>) -> ConfigResult<()> {
        if self.resolve_env_vars {
            self.apply_env_overrides(config)?;
        }
        if self.resolve_paths {
            if let Some(base_path) = base_path {
                resolve_relative_paths(config, base_path);
            }
        }
        config.validate()
    }

    /// Reads file content.
    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    /// Parses content based on format.
    fn parse_content(
        &self,
        content: &str,
        format: ConfigFormat,
        path: &Path,
    ) -> ConfigResult<RcmConfig> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)
        } else {
            content.to_string()
        };

        parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })
    }

    /// Resolves environment variable placeholders in content.
    ///
    /// Supports the format: `${VAR_NAME}` or `${VAR_NAME:default}`
    fn resolve_env_placeholders(&self, content: &str) -> String {
        let mut result = String::with_capacity(content.len());
        let mut rest = content;

        while let Some(start) = rest.find("${") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find('}') else {
                // No closing brace, keep as-is
                result.push_str(&rest[start..]);
                return result;
            };

            let inner = &after[..end];
            let (name, default) = match inner.split_once(':') {
                Some((name, default)) => (name, Some(default)),
                None => (inner, None),
            };

            match (self.env.get(name), default) {
                (Some(value), _) => result.push_str(&value),
                (None, Some(default)) => result.push_str(default),
                (None, None) => {
                    warn!("Environment variable '{}' not found", name);
                    result.push_str(&format!("${{{name}}}"));
                }
            }
            rest = &after[end + 1..];
        }

        result.push_str(rest);
        result
    }

    fn var(&self, suffix: &str) -> (String, Option<String>) {
        let name = format!("{}_{}", self.env_prefix, suffix);
        let value = self.env.get(&name).filter(|v| !v.trim().is_empty());
        (name, value)
    }

    fn parsed<T: FromStr>(&self, suffix: &str, expected: &str) -> ConfigResult<Option<T>> {
        match self.var(suffix) {
            (name, Some(value)) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::invalid_env_var(name, format!("expected {expected}"))),
            (_, None) => Ok(None),
        }
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&self, config: &mut RcmConfig) -> ConfigResult<()> {
        if let (name, Some(value)) = self.var("ENV") {
            config.environment = Environment::parse(&value).ok_or_else(|| {
                ConfigError::invalid_env_var(name, "expected production, development, staging or test")
            })?;
        }

        // Server
        if let Some(host) = self.parsed("HOST", "an IP address")? {
            config.server.bind_address = host;
        }
        if let Some(port) = self.parsed("PORT", "valid port number")? {
            config.server.port = port;
        }
        if let (_, Some(value)) = self.var("ROUTES_VERSION") {
            config.server.routes_version = value;
        }
        if let (_, Some(value)) = self.var("CORS_ORIGINS") {
            config.server.cors.allowed_origins = value
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let (_, Some(value)) = self.var("CORS_CREDENTIALS") {
            config.server.cors.allow_credentials = parse_bool(&value);
        }

        // Database
        if let (name, Some(value)) = self.var("DB_PROVIDER") {
            config.database.provider = DatabaseProvider::parse(&value)
                .ok_or_else(|| ConfigError::invalid_env_var(name, "expected memory or mongodb"))?;
        }
        if let (_, Some(value)) = self.var("DB_HOST") {
            config.database.host = value;
        }
        if let Some(port) = self.parsed("DB_PORT", "valid port number")? {
            config.database.port = port;
        }
        if let (_, Some(value)) = self.var("DB_NAME") {
            config.database.name = value;
        }
        if let (_, Some(value)) = self.var("DB_USERNAME") {
            config.database.username = Some(value);
        }
        if let (_, Some(value)) = self.var("DB_PASSWORD") {
            config.database.password = Some(SecretValue::new(value));
        }

        // JWT
        if let (_, Some(value)) = self.var("JWT_SECRET") {
            config.jwt.secret = Some(SecretValue::new(value));
        }
        if let Some(mins) = self.parsed("JWT_ACCESS_EXP_MINS", "a number of minutes")? {
            config.jwt.access_expiration_mins = mins;
        }
        if let Some(days) = self.parsed("JWT_REFRESH_EXP_DAYS", "a number of days")? {
            config.jwt.refresh_expiration_days = days;
        }
        if let Some(mins) = self.parsed("JWT_RESET_PW_EXP_MINS", "a number of minutes")? {
            config.jwt.reset_password_expiration_mins = mins;
        }

        // Security
        if let Some(cost) = self.parsed("BCRYPT_COST", "a number")? {
            config.security.bcrypt_cost = cost;
        }

        // Logging
        if let (_, Some(value)) = self.var("LOG_LEVEL") {
            if let Some(level) = LogLevel::parse(&value) {
                config.logging.level = level;
            }
        }
        if let (_, Some(value)) = self.var("LOG_DIR") {
            config.logging.dir = Some(PathBuf::from(value));
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves relative paths in configuration.
fn resolve_relative_paths(config: &mut RcmConfig, base_path: &Path) {
    if let Some(ref mut dir) = config.logging.dir {
        if dir.is_relative() {
            *dir = base_path.join(&dir);
        }
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parses a string to bool.
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

/// Parses a string based on format.
fn parse_str(content: &str, format: ConfigFormat) -> ConfigResult<RcmConfig> {
    match format {
        ConfigFormat::Yaml => yaml_parse(content),
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// YAML parsing through the `config` crate.
fn yaml_parse<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
///
/// ```no_run
/// use rcm_config::loader::load_config;
///
/// let config = load_config("rcm.yaml").unwrap();
/// ```
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<RcmConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with the specified format.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<RcmConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LogFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn create_test_yaml() -> String {
        format!(
            r#"
environment: staging

server:
  port: 4000
  routes_version: v2
  cors:
    allowed_origins:
      - https://app.example.com

database:
  provider: memory

jwt:
  secret: "{SECRET}"
  access_expiration_mins: 60

logging:
  level: debug
  format: json
  dir: logs
"#
        )
    }

    fn isolated() -> ConfigLoader {
        ConfigLoader::new().with_env_map(HashMap::<String, String>::new())
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(create_test_yaml().as_bytes()).unwrap();

        let config = isolated().load(file.path()).unwrap();

        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.routes_version, "v2");
        assert_eq!(config.server.cors.allowed_origins, vec!["https://app.example.com"]);
        assert_eq!(config.jwt.access_expiration_mins, 60);
        assert_eq!(config.jwt.refresh_expiration_days, 30);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);

        assert_eq!(
            config.logging.dir.unwrap(),
            file.path().parent().unwrap().join("logs")
        );
    }

    #[test]
    fn test_load_toml() {
        let toml = format!(
            r#"
[server]
port = 5000

[jwt]
secret = "{SECRET}"
"#
        );
        let config = isolated().load_from_str(&toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_load_json() {
        let json = format!(r#"{{ "jwt": {{ "secret": "{SECRET}" }} }}"#);
        let config = isolated().load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let json = format!(r#"{{ "jwt": {{ "secret": "{SECRET}", "ttl": 5 }} }}"#);
        assert!(isolated().load_from_str(&json, ConfigFormat::Json).is_err());
    }

    #[test]
    fn test_config_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.yaml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.yml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::from_path(Path::new("config.txt")).is_err());
    }

    #[test]
    fn test_env_placeholder_resolution() {
        let loader = ConfigLoader::new().with_env_map([("DB_HOST", "mongo.internal")]);
        let result = loader.resolve_env_placeholders("host: ${DB_HOST}\nname: ${DB_NAME:rcm}");
        assert_eq!(result, "host: mongo.internal\nname: rcm");
    }

    #[test]
    fn test_env_placeholder_missing_kept() {
        let result = isolated().resolve_env_placeholders("value: ${MISSING} ${unterminated");
        assert_eq!(result, "value: ${MISSING} ${unterminated");
    }

    #[test]
    fn test_env_overrides() {
        let loader = ConfigLoader::new().with_env_map([
            ("RCM_JWT_SECRET", SECRET),
            ("RCM_ENV", "production"),
            ("RCM_PORT", "8081"),
            ("RCM_CORS_ORIGINS", "https://a.example, https://b.example"),
            ("RCM_CORS_CREDENTIALS", "false"),
            ("RCM_DB_PROVIDER", "mongodb"),
            ("RCM_DB_HOST", "db"),
            ("RCM_JWT_REFRESH_EXP_DAYS", "7"),
            ("RCM_LOG_LEVEL", "warn"),
        ]);
        let config = loader.load_defaults().unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.server.port, 8081);
        assert_eq!(
            config.server.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.server.cors.allow_credentials);
        assert_eq!(config.database.provider, DatabaseProvider::Mongodb);
        assert_eq!(config.database.host, "db");
        assert_eq!(config.jwt.refresh_expiration_days, 7);
        assert_eq!(config.jwt.secret.unwrap().raw(), SECRET);
        assert_eq!(config.logging.level, LogLevel::Warn);
    }

    #[test]
    fn test_invalid_env_override() {
        let loader = ConfigLoader::new().with_env_map([
            ("RCM_JWT_SECRET", SECRET),
            ("RCM_PORT", "not-a-port"),
        ]);
        let err = loader.load_defaults().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref name, .. } if name == "RCM_PORT"));
    }

    #[test]
    fn test_defaults_require_secret() {
        assert!(matches!(
            isolated().load_defaults(),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn test_load_or_defaults_without_file() {
        let loader = ConfigLoader::new().with_env_map([("RCM_JWT_SECRET", SECRET)]);
        let config = loader.load_or_defaults("/nonexistent/rcm.yaml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("1"));
        assert!(parse_bool("yes"));
        assert!(parse_bool("on"));
        assert!(parse_bool("enabled"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("no"));
    }

    #[test]
    fn test_custom_prefix_and_switches() {
        let loader = ConfigLoader::new()
            .with_env_prefix("CYBERSWEEP")
            .with_env_vars(false)
            .with_path_resolution(false)
            .with_base_path("/etc/rcm");

        assert_eq!(loader.env_prefix, "CYBERSWEEP");
        assert!(!loader.resolve_env_vars);
        assert!(!loader.resolve_paths);
        assert_eq!(loader.base_path.as_deref(), Some(Path::new("/etc/rcm")));
    }

    #[test]
    fn test_custom_prefix_override() {
        let config = ConfigLoader::new()
            .with_env_prefix("CYBERSWEEP")
            .with_env_map([
                ("CYBERSWEEP_JWT_SECRET", "prefixed-secret-that-is-long-enough"),
                ("CYBERSWEEP_PORT", "4000"),
                ("RCM_PORT", "5000"),
            ])
            .load_defaults()
            .unwrap();

        assert_eq!(config.server.port, 4000);
    }

    #[test]
    fn test_relative_log_dir_resolved() {
        let config = ConfigLoader::new()
            .with_env_map([("RCM_JWT_SECRET", "relative-secret-that-is-long-enough")])
            .with_base_path("/srv/rcm")
            .load_from_str("[logging]\ndir = \"logs\"\n", ConfigFormat::Toml)
            .unwrap();

        assert_eq!(config.logging.dir, Some(PathBuf::from("/srv/rcm/logs")));
    }

    #[test]
    fn test_file_not_found() {
        let result = isolated().load("/nonexistent/path/config.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_parse_error_carries_path() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(b"{ not json").unwrap();

        let result = isolated().load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }
}
