// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use rcm_config::{ConfigLoader, RcmConfig};
use serde_json::Value;

use crate::cli::{Cli, OutputFormat, ValidateArgs};
use crate::error::{BinError, BinResult};
use crate::runtime::api_config;

const REDACTED: &str = "***";

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let config_path = &cli.config;

    if !config_path.exists() {
        return Err(BinError::config(format!(
            "Configuration file not found: {}",
            config_path.display()
        )));
    }

    let config = ConfigLoader::new().load(config_path).map_err(|e| {
        BinError::config(format!("Configuration validation failed: {}", e))
    })?;
    // Surfaces mapping errors the schema checks cannot see.
    api_config(&config)?;

    let warnings = config.warnings();

    match args.format {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", config_path.display());
            println!();
            println!("Summary:");
            println!("  Environment: {}", config.environment);
            println!(
                "  API: {} (routes /{})",
                config.server.socket_addr(),
                config.server.routes_version
            );
            println!("  Database: {}", config.database.provider.as_str());
            println!(
                "  Bootstrap admin: {}",
                config.bootstrap.as_ref().map_or("none", |b| b.email.as_str())
            );

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", pretty(&redacted(&config)?)?);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_path": config_path.display().to_string(),
                "summary": {
                    "environment": config.environment.as_str(),
                    "bind_address": config.server.socket_addr().to_string(),
                    "routes_version": config.server.routes_version,
                    "database_provider": config.database.provider.as_str(),
                    "bootstrap": config.bootstrap.is_some(),
                },
                "warnings": warnings,
                "config": if args.show_config { Some(redacted(&config)?) } else { None },
            });
            println!("{}", pretty(&output)?);
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

/// Serializes the configuration with every secret masked.
fn redacted(config: &RcmConfig) -> BinResult<Value> {
    let mut value = serde_json::to_value(config)
        .map_err(|e| BinError::io(format!("Failed to serialize configuration: {}", e)))?;

    for pointer in ["/jwt/secret", "/database/password", "/bootstrap/password"] {
        if let Some(secret) = value.pointer_mut(pointer) {
            if !secret.is_null() {
                *secret = Value::String(REDACTED.to_string());
            }
        }
    }
    Ok(value)
}

fn pretty(value: &Value) -> BinResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| BinError::io(format!("Failed to render output: {}", e)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use rcm_config::{BootstrapConfig, SecretValue};

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = RcmConfig::default();
        config.jwt.secret = Some(SecretValue::new("super-secret-signing-key"));
        config.bootstrap = Some(BootstrapConfig {
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            password: SecretValue::new("bootstrap-password"),
        });

        let value = redacted(&config).unwrap();
        assert_eq!(value["jwt"]["secret"], REDACTED);
        assert_eq!(value["bootstrap"]["password"], REDACTED);
        assert!(value["database"]["password"].is_null());
        assert!(!value.to_string().contains("super-secret-signing-key"));
    }

    #[test]
    fn test_validate_missing_file() {
        let cli = Cli::parse_from(["rcm", "-c", "/nonexistent/rcm.yaml", "validate"]);
        let err = validate(&cli, ValidateArgs::default()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_validate_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rcm.toml");
        std::fs::write(
            &path,
            "[jwt]\nsecret = \"0123456789abcdef0123456789abcdef\"\n",
        )
        .unwrap();

        let cli = Cli::parse_from(["rcm", "-c", path.to_str().unwrap(), "validate"]);
        validate(&cli, ValidateArgs::default()).unwrap();
    }

    #[test]
    fn test_validate_strict_fails_on_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rcm.toml");
        std::fs::write(&path, "[jwt]\nsecret = \"short-secret\"\n").unwrap();

        let cli = Cli::parse_from(["rcm", "-c", path.to_str().unwrap(), "validate"]);
        let args = ValidateArgs {
            strict: true,
            ..Default::default()
        };
        assert!(validate(&cli, args).is_err());
    }
}
