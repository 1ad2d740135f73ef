// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server runtime orchestration.
//!
//! Startup order: configuration, stores, API state, bootstrap account,
//! token purge task, HTTP server. Shutdown runs in reverse once a signal
//! arrives.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use tracing::{debug, error, info, warn};

use rcm_api::{ApiConfig, ApiServer, ApiServerBuilder, CorsConfig, JwtConfig, TokenService};
use rcm_config::{ConfigLoader, DatabaseConfig, DatabaseProvider, JwtAlgorithm, RcmConfig};
use rcm_core::Stores;

use crate::error::{BinError, BinResult};
use crate::shutdown::{ShutdownCoordinator, ShutdownSignal};

// =============================================================================
// ServerRuntime
// =============================================================================

/// Runs the API server and its background tasks until shutdown.
#[derive(Debug)]
pub struct ServerRuntime {
    config: Arc<RcmConfig>,
    shutdown: ShutdownCoordinator,
    skip_bootstrap: bool,
}

impl ServerRuntime {
    /// Creates a new runtime.
    pub fn new(config: RcmConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
            skip_bootstrap: false,
        }
    }

    /// Skips creation of the bootstrap superadmin.
    pub fn with_skip_bootstrap(mut self, skip: bool) -> Self {
        self.skip_bootstrap = skip;
        self
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &RcmConfig {
        &self.config
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Runs the server until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!(
            version = rcm_api::VERSION,
            environment = %self.config.environment,
            "Starting RCM backend"
        );

        let server = self.initialize().await?;

        let signals = self.shutdown.clone();
        tokio::spawn(async move { signals.wait_for_os_signal().await });

        if let Some(interval) = self.config.security.token_purge_interval() {
            spawn_token_purge(
                server.state().tokens.clone(),
                interval,
                self.shutdown.shutdown_signal(),
            );
        }

        let result = self.serve(server).await;
        info!("RCM backend shutdown complete");
        result
    }

    async fn initialize(&self) -> BinResult<ApiServer> {
        let stores = connect_stores(&self.config.database).await?;
        let server = ApiServerBuilder::new()
            .config(api_config(&self.config)?)
            .stores(stores)
            .build()
            .map_err(|e| BinError::config(e.to_string()))?;

        if self.skip_bootstrap {
            debug!("Bootstrap account creation skipped");
        } else if let Some(ref bootstrap) = self.config.bootstrap {
            let created = server
                .state()
                .users
                .ensure_superadmin(&bootstrap.name, &bootstrap.email, bootstrap.password.raw())
                .await
                .map_err(|source| BinError::Bootstrap {
                    email: bootstrap.email.clone(),
                    source,
                })?;
            match created {
                Some(user) => info!(user_id = %user.id, email = %user.email, "Bootstrap superadmin created"),
                None => debug!(email = %bootstrap.email, "Bootstrap account already present"),
            }
        }

        Ok(server)
    }

    /// Serves until shutdown, then allows in-flight requests the configured
    /// grace period.
    async fn serve(&self, server: ApiServer) -> BinResult<()> {
        let grace = self.config.server.shutdown_timeout();
        let serve = server.run_with_shutdown(self.shutdown.shutdown_signal().wait());
        tokio::pin!(serve);

        let deadline = {
            let signal = self.shutdown.shutdown_signal();
            async move {
                signal.wait().await;
                tokio::time::sleep(grace).await;
            }
        };

        tokio::select! {
            result = &mut serve => result.map_err(BinError::Serve),
            _ = deadline => {
                warn!(grace_secs = grace.as_secs(), "Graceful shutdown timed out, dropping open connections");
                Ok(())
            }
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the server runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<RcmConfig>,
    port: Option<u16>,
    skip_bootstrap: bool,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: RcmConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the listen port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Skips creation of the bootstrap superadmin.
    pub fn skip_bootstrap(mut self, skip: bool) -> Self {
        self.skip_bootstrap = skip;
        self
    }

    /// Builds the runtime.
    ///
    /// A missing configuration file falls back to defaults plus `RCM_*`
    /// environment overrides.
    pub fn build(self) -> BinResult<ServerRuntime> {
        let mut config = match self.config {
            Some(config) => {
                config.validate()?;
                config
            }
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;
                ConfigLoader::new()
                    .load_or_defaults(&path)
                    .map_err(|e| BinError::config_file(path.display(), e))?
            }
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        for warning in config.warnings() {
            warn!("{}", warning);
        }

        Ok(ServerRuntime::new(config).with_skip_bootstrap(self.skip_bootstrap))
    }
}

// =============================================================================
// Component Construction
// =============================================================================

/// Maps the file configuration onto the API server configuration.
pub fn api_config(config: &RcmConfig) -> BinResult<ApiConfig> {
    let secret = config
        .jwt
        .secret
        .as_ref()
        .ok_or_else(|| BinError::config("jwt.secret is required"))?;

    let mut jwt = JwtConfig::new(secret.raw())
        .with_algorithm(match config.jwt.algorithm {
            JwtAlgorithm::HS256 => Algorithm::HS256,
            JwtAlgorithm::HS384 => Algorithm::HS384,
            JwtAlgorithm::HS512 => Algorithm::HS512,
        })
        .with_leeway(config.jwt.leeway_secs)
        .with_expirations(
            to_i64(config.jwt.access_expiration_mins, "jwt.access_expiration_mins")?,
            to_i64(config.jwt.refresh_expiration_days, "jwt.refresh_expiration_days")?,
            to_i64(
                config.jwt.reset_password_expiration_mins,
                "jwt.reset_password_expiration_mins",
            )?,
        );
    if let Some(ref issuer) = config.jwt.issuer {
        jwt = jwt.with_issuer(issuer.clone());
    }

    let server = &config.server;
    let mut api = ApiConfig::new()
        .with_host(server.bind_address)
        .with_port(server.port)
        .with_routes_version(server.routes_version.clone())
        .with_cors(CorsConfig {
            allowed_origins: server.cors.allowed_origins.clone(),
            allow_credentials: server.cors.allow_credentials,
            max_age: server.cors.max_age_secs,
        })
        .with_jwt(jwt)
        .with_bcrypt_cost(config.security.bcrypt_cost);
    api.request_timeout = server.request_timeout();
    api.max_body_size = server.max_body_size;

    Ok(api)
}

fn to_i64(value: u64, field: &str) -> BinResult<i64> {
    i64::try_from(value).map_err(|_| BinError::config(format!("{} is too large", field)))
}

/// Opens the configured storage backend.
pub async fn connect_stores(database: &DatabaseConfig) -> BinResult<Stores> {
    match database.provider {
        DatabaseProvider::Memory => {
            info!("Using in-memory store; data is lost on restart");
            Ok(Stores::in_memory())
        }
        DatabaseProvider::Mongodb => connect_mongo(database).await,
    }
}

#[cfg(feature = "mongodb")]
async fn connect_mongo(database: &DatabaseConfig) -> BinResult<Stores> {
    let settings = rcm_core::MongoSettings {
        host: database.host.clone(),
        port: database.port,
        database: database.name.clone(),
        username: database.username.clone(),
        password: database.password.as_ref().map(|p| p.raw().to_string()),
    };
    let store = rcm_core::MongoStore::connect(&settings)
        .await
        .map_err(|e| BinError::store("mongodb", e))?;
    Ok(Stores::from_shared(Arc::new(store)))
}

#[cfg(not(feature = "mongodb"))]
async fn connect_mongo(_database: &DatabaseConfig) -> BinResult<Stores> {
    Err(BinError::config(
        "database.provider 'mongodb' requires a build with the `mongodb` feature",
    ))
}

/// Periodically removes expired token records until shutdown.
fn spawn_token_purge(tokens: TokenService, interval: Duration, shutdown: ShutdownSignal) {
    info!(interval_secs = interval.as_secs(), "Token purge task started");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let stop = shutdown.wait();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = ticker.tick() => {
                    if let Err(e) = tokens.purge_expired().await {
                        error!(error = %e, "Token purge failed");
                    }
                }
            }
        }
        debug!("Token purge task stopped");
    });
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rcm_config::{BootstrapConfig, SecretValue};
    use rcm_core::UserRole;

    fn test_config() -> RcmConfig {
        let mut config = RcmConfig::default();
        config.jwt.secret = Some(SecretValue::new("0123456789abcdef0123456789abcdef"));
        config.security.bcrypt_cost = 4;
        config
    }

    #[test]
    fn test_runtime_builder() {
        let runtime = RuntimeBuilder::new()
            .config(test_config())
            .port(Some(8081))
            .skip_bootstrap(true)
            .build()
            .unwrap();

        assert_eq!(runtime.config().server.port, 8081);
        assert!(runtime.skip_bootstrap);
    }

    #[test]
    fn test_runtime_builder_rejects_invalid_config() {
        let result = RuntimeBuilder::new().config(RcmConfig::default()).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_runtime_builder_requires_config() {
        assert!(RuntimeBuilder::new().build().is_err());
    }

    #[test]
    fn test_api_config_mapping() {
        let mut config = test_config();
        config.server.routes_version = "v2".to_string();
        config.server.cors.allowed_origins = vec!["https://app.example.com".to_string()];
        config.jwt.issuer = Some("rcm".to_string());
        config.jwt.algorithm = JwtAlgorithm::HS512;
        config.jwt.access_expiration_mins = 15;

        let api = api_config(&config).unwrap();
        assert_eq!(api.base_path(), "/v2");
        assert_eq!(api.cors.allowed_origins, vec!["https://app.example.com"]);
        assert_eq!(api.jwt.issuer.as_deref(), Some("rcm"));
        assert_eq!(api.jwt.algorithm, Algorithm::HS512);
        assert_eq!(api.jwt.access_expiration_mins, 15);
        assert_eq!(api.jwt.refresh_expiration_days, 30);
        assert_eq!(api.bcrypt_cost, 4);
    }

    #[test]
    fn test_api_config_requires_secret() {
        let err = api_config(&RcmConfig::default()).unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_memory_stores() {
        let stores = connect_stores(&DatabaseConfig::default()).await.unwrap();
        stores.users.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_creates_bootstrap_admin() {
        let mut config = test_config();
        config.bootstrap = Some(BootstrapConfig {
            name: "Admin".to_string(),
            email: "admin@example.com".to_string(),
            password: SecretValue::new("bootstrap-password"),
        });

        let runtime = ServerRuntime::new(config);
        let server = runtime.initialize().await.unwrap();

        let admin = server
            .state()
            .stores
            .users
            .find_user_by_email("admin@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.has_role(UserRole::Superadmin));
    }

    #[tokio::test]
    async fn test_port_in_use_is_a_serve_error() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut config = test_config();
        config.server.bind_address = "127.0.0.1".parse().unwrap();
        config.server.port = taken.local_addr().unwrap().port();

        let runtime = ServerRuntime::new(config).with_skip_bootstrap(true);
        let err = tokio::time::timeout(Duration::from_secs(5), runtime.run())
            .await
            .expect("Bind failure should end the run")
            .unwrap_err();

        assert!(matches!(err, BinError::Serve(_)));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn test_malformed_file_is_a_config_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rcm.yaml");
        std::fs::write(&path, "server: [not, a, map]\n").unwrap();

        let err = RuntimeBuilder::new().config_path(&path).build().unwrap_err();
        assert!(matches!(err, BinError::ConfigFile { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_stops_serving() {
        let mut config = test_config();
        config.server.bind_address = "127.0.0.1".parse().unwrap();
        config.server.port = 0;

        let runtime = ServerRuntime::new(config).with_skip_bootstrap(true);
        runtime.shutdown().initiate_shutdown();

        tokio::time::timeout(Duration::from_secs(5), runtime.run())
            .await
            .expect("Runtime should stop once shutdown is initiated")
            .unwrap();
    }
}
