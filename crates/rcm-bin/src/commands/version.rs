// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `version` command.

use std::fmt::Write as _;

use rcm_api::RoleRights;
use rcm_config::schema::{DEFAULT_PORT, DEFAULT_ROUTES_VERSION};
use rcm_core::UserRole;

use crate::cli::Cli;
use crate::error::BinResult;

/// Prints crate versions, compiled store backends and the built-in role table.
pub fn version(_cli: &Cli) -> BinResult<()> {
    print!("{}", render());
    Ok(())
}

fn store_backends() -> &'static str {
    if cfg!(feature = "mongodb") {
        "memory, mongodb"
    } else {
        "memory"
    }
}

fn render() -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "rcm {} (multi-tenant client management backend)", crate::VERSION);
    let _ = writeln!(
        out,
        "  crates: rcm-core {}, rcm-config {}, rcm-api {}",
        rcm_core::VERSION,
        rcm_config::VERSION,
        rcm_api::VERSION
    );
    let _ = writeln!(
        out,
        "  target: {}-{}",
        std::env::consts::ARCH,
        std::env::consts::OS
    );
    let _ = writeln!(out, "  stores: {}", store_backends());
    let _ = writeln!(
        out,
        "  default listener: :{} under /{}",
        DEFAULT_PORT, DEFAULT_ROUTES_VERSION
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Role rights:");
    for role in UserRole::ALL {
        let _ = writeln!(
            out,
            "  {:<11} {}",
            role.as_str(),
            RoleRights::default_permissions(role).join(" ")
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lists_roles() {
        let out = render();
        assert!(out.starts_with(&format!("rcm {}", crate::VERSION)));
        assert!(out.contains("superadmin  user-orwx client-orwx auth$logout"));
        assert!(out.contains("user        user-o auth$logout"));
        assert!(out.contains(":3000 under /v1"));
    }

    #[test]
    fn test_store_backends() {
        assert!(store_backends().starts_with("memory"));
    }
}
