// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `hash-password` command.

use std::io::BufRead;

use rcm_config::ConfigLoader;
use rcm_core::PasswordHasher;

use crate::cli::{Cli, HashPasswordArgs};
use crate::error::{BinError, BinResult};

/// Prints a bcrypt hash of the given password.
pub async fn hash_password(cli: &Cli, args: HashPasswordArgs) -> BinResult<()> {
    let password = match (args.password, args.stdin) {
        (_, true) => read_stdin_line()?,
        (Some(password), false) => password,
        (None, false) => return Err(BinError::config("No password given")),
    };
    if password.is_empty() {
        return Err(BinError::config("Password cannot be empty"));
    }

    let cost = match args.cost {
        Some(cost) => cost,
        None => ConfigLoader::new()
            .load_or_defaults(&cli.config)
            .map(|config| config.security.bcrypt_cost)
            .unwrap_or(PasswordHasher::DEFAULT_COST),
    };

    let hasher = PasswordHasher::new(cost).map_err(BinError::hashing)?;
    let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(BinError::hashing)?
        .map_err(BinError::hashing)?;

    println!("{}", hash);
    Ok(())
}

fn read_stdin_line() -> BinResult<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use clap::Parser;

    fn parse(args: &[&str]) -> (Cli, HashPasswordArgs) {
        let cli = Cli::parse_from(args);
        let args = match cli.command {
            Some(Commands::HashPassword(ref args)) => args.clone(),
            _ => panic!("expected hash-password"),
        };
        (cli, args)
    }

    #[tokio::test]
    async fn test_hash_with_explicit_cost() {
        let (cli, args) = parse(&["rcm", "hash-password", "secret", "--cost", "4"]);
        hash_password(&cli, args).await.unwrap();
    }

    #[tokio::test]
    async fn test_cost_out_of_range() {
        let (cli, args) = parse(&["rcm", "hash-password", "secret", "--cost", "2"]);
        let err = hash_password(&cli, args).await.unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[tokio::test]
    async fn test_empty_password() {
        let (cli, args) = parse(&["rcm", "hash-password", "", "--cost", "4"]);
        let err = hash_password(&cli, args).await.unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_password_required() {
        assert!(Cli::try_parse_from(["rcm", "hash-password"]).is_err());
    }
}
