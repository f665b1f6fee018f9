//! Database connection pool management
//!
//! This module provides connection pool configuration and creation for
//! PostgreSQL using SQLx, plus the env-driven configuration path used in
//! deployments.

use std::time::{Duration, Instant};

use serde::Deserialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};

use crate::error::DatabaseError;

/// Type alias for the PostgreSQL connection pool
pub type DatabasePool = PgPool;

/// Configuration options for the database connection pool
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use infra_db::DatabaseConfig;
///
/// let config = DatabaseConfig::new("postgres://localhost/lodging")
///     .max_connections(20)
///     .min_connections(5)
///     .connect_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
    /// Idle timeout before closing a connection
    pub idle_timeout: Duration,
}

/// Environment-facing shape of the database configuration
///
/// Read from `LODGING_DB_*` variables (e.g. `LODGING_DB_URL`,
/// `LODGING_DB_MAX_CONNECTIONS`).
#[derive(Debug, Clone, Deserialize)]
struct DatabaseEnv {
    url: String,
    max_connections: Option<u32>,
    min_connections: Option<u32>,
    connect_timeout_secs: Option<u64>,
}

impl DatabaseConfig {
    /// Creates a new database configuration with the given connection URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            min_connections: 2,
            connect_timeout: Duration::from_secs(30),
            max_lifetime: Duration::from_secs(30 * 60), // 30 minutes
            idle_timeout: Duration::from_secs(10 * 60), // 10 minutes
        }
    }

    /// Loads configuration from `LODGING_DB_*` environment variables
    ///
    /// A local `.env` file is honored when present.
    pub fn from_env() -> Result<Self, DatabaseError> {
        dotenvy::dotenv().ok();

        let env: DatabaseEnv = config::Config::builder()
            .add_source(config::Environment::with_prefix("LODGING_DB"))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| DatabaseError::Configuration(e.to_string()))?;

        let mut cfg = Self::new(env.url);
        if let Some(max) = env.max_connections {
            cfg = cfg.max_connections(max);
        }
        if let Some(min) = env.min_connections {
            cfg = cfg.min_connections(min);
        }
        if let Some(secs) = env.connect_timeout_secs {
            cfg = cfg.connect_timeout(Duration::from_secs(secs));
        }
        Ok(cfg)
    }

    /// Sets the maximum number of connections in the pool
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections to maintain
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout duration
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the maximum lifetime of a connection
    pub fn max_lifetime(mut self, lifetime: Duration) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Sets the idle timeout before closing a connection
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::new("postgres://localhost/lodging")
    }
}

/// Creates a database connection pool with the given configuration
///
/// # Errors
///
/// Returns `DatabaseError::ConnectionFailed` if the pool cannot be created
pub async fn create_pool(config: DatabaseConfig) -> Result<DatabasePool, DatabaseError> {
    info!(
        "Creating database pool with max_connections={}, min_connections={}",
        config.max_connections, config.min_connections
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .max_lifetime(config.max_lifetime)
        .idle_timeout(config.idle_timeout)
        .connect(&config.url)
        .await
        .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

    info!("Database pool created successfully");
    Ok(pool)
}

/// Creates a connection pool from a URL string with default settings
pub async fn create_pool_from_url(url: &str) -> Result<DatabasePool, DatabaseError> {
    create_pool(DatabaseConfig::new(url)).await
}

/// Handle over a live pool with schema and health management
pub struct Database {
    pool: DatabasePool,
}

impl Database {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Returns the underlying connection pool
    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Applies the embedded schema migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }
}

#[async_trait::async_trait]
impl HealthCheckable for Database {
    async fn health_check(&self) -> HealthCheckResult {
        let started = Instant::now();
        let outcome = sqlx::query("SELECT 1").execute(&self.pool).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(_) => HealthCheckResult {
                adapter_id: "lodging_db".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: chrono::Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "lodging_db".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(e.to_string()),
                checked_at: chrono::Utc::now(),
            },
        }
    }
}
