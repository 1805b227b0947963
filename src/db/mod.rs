//! Database access: the process-wide connection provider and the credential
//! store built on top of it.

pub mod users;
pub use self::users::{CredentialStore, MySqlCredentialStore, NewUser, StoreError, UserRecord};

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

use secrecy::{ExposeSecret, SecretString};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use std::{str::FromStr, time::Duration};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{Instrument, debug, error, info, info_span, instrument};
use url::Url;

pub const DEFAULT_CHARSET: &str = "utf8mb4";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 5;
pub const USERS_TABLE: &str = "usuario";

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("invalid database configuration: {0}")]
    Config(String),
    #[error("failed to connect to database: {0}")]
    Connect(#[source] sqlx::Error),
    #[error("failed to negotiate charset {expected}: {reason}")]
    Charset { expected: String, reason: String },
    #[error("database round-trip check failed: {0}")]
    RoundTrip(#[source] sqlx::Error),
    #[error("table '{0}' does not exist in the database")]
    MissingTable(String),
    #[error("database connection lost: {0}")]
    Lost(#[source] sqlx::Error),
}

/// True for errors that mean the database could not be reached, as opposed
/// to a failed statement.
pub(crate) fn is_transport_error(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
    )
}

/// Fixed connection settings, built once at startup.
#[derive(Clone)]
pub struct DatabaseConfig {
    dsn: Url,
    password: Option<SecretString>,
    charset: String,
    max_connections: u32,
    connect_timeout: Duration,
}

impl DatabaseConfig {
    /// Parse a `mysql://user@host:port/database` connection string.
    ///
    /// # Errors
    /// Returns [`ConnectionError::Config`] if the DSN is not a `MySQL` URL or
    /// lacks a database name.
    pub fn new(dsn: &str) -> Result<Self, ConnectionError> {
        let dsn = Url::parse(dsn).map_err(|e| ConnectionError::Config(e.to_string()))?;

        if !matches!(dsn.scheme(), "mysql" | "mariadb") {
            return Err(ConnectionError::Config(format!(
                "unsupported scheme '{}', expected mysql://",
                dsn.scheme()
            )));
        }

        if dsn.host_str().map_or(true, str::is_empty) {
            return Err(ConnectionError::Config("missing host".to_string()));
        }

        if dsn.path().trim_start_matches('/').is_empty() {
            return Err(ConnectionError::Config("missing database name".to_string()));
        }

        Ok(Self {
            dsn,
            password: None,
            charset: DEFAULT_CHARSET.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECONDS),
        })
    }

    #[must_use]
    pub fn with_password(mut self, password: SecretString) -> Self {
        self.password = Some(password);
        self
    }

    #[must_use]
    pub fn with_charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = charset.into();
        self
    }

    #[must_use]
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections.max(1);
        self
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        self.dsn.host_str().unwrap_or_default()
    }

    #[must_use]
    pub fn database(&self) -> &str {
        self.dsn.path().trim_start_matches('/')
    }

    #[must_use]
    pub fn charset(&self) -> &str {
        &self.charset
    }

    fn connect_options(&self) -> Result<MySqlConnectOptions, ConnectionError> {
        let mut options = MySqlConnectOptions::from_str(self.dsn.as_str())
            .map_err(|e| ConnectionError::Config(e.to_string()))?
            .charset(&self.charset);

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        Ok(options)
    }

    /// DSN with any inline password removed, safe for logs.
    fn redacted_dsn(&self) -> String {
        let mut dsn = self.dsn.clone();
        if dsn.password().is_some() {
            let _ = dsn.set_password(Some("***"));
        }
        dsn.to_string()
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("dsn", &self.redacted_dsn())
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("charset", &self.charset)
            .field("max_connections", &self.max_connections)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Owns the single database handle of the process.
///
/// The pool is created on first [`acquire`](Self::acquire) and reused until
/// [`close`](Self::close) is called. Concurrent first access is serialized by
/// the inner mutex so only one pool is ever opened.
#[derive(Debug)]
pub struct ConnectionProvider {
    config: DatabaseConfig,
    pool: Mutex<Option<MySqlPool>>,
}

impl ConnectionProvider {
    #[must_use]
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            pool: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Return the cached handle, opening and verifying a new one if needed.
    ///
    /// # Errors
    /// Returns a [`ConnectionError`] if connecting, charset negotiation, the
    /// round-trip query or the users table check fails.
    #[instrument(skip(self), fields(db.host = %self.config.host(), db.name = %self.config.database()))]
    pub async fn acquire(&self) -> Result<MySqlPool, ConnectionError> {
        let mut guard = self.pool.lock().await;

        if let Some(pool) = guard.as_ref() {
            if !pool.is_closed() {
                return Ok(pool.clone());
            }
            debug!("Cached database handle was closed, reconnecting");
        }

        let pool = self.open().await?;
        *guard = Some(pool.clone());

        info!("Database connection established");

        Ok(pool)
    }

    /// Release the cached handle. Safe to call when nothing is cached.
    pub async fn close(&self) {
        if let Some(pool) = self.pool.lock().await.take() {
            pool.close().await;
            debug!("Database connection closed");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.pool
            .lock()
            .await
            .as_ref()
            .is_some_and(|pool| !pool.is_closed())
    }

    async fn open(&self) -> Result<MySqlPool, ConnectionError> {
        let options = self.config.connect_options().inspect_err(|e| {
            error!("Invalid database configuration: {}", e);
        })?;

        let connect_span = info_span!("db.connect", db.system = "mysql", db.operation = "CONNECT");
        let pool = MySqlPoolOptions::new()
            .min_connections(0)
            .max_connections(self.config.max_connections)
            .acquire_timeout(self.config.connect_timeout)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect_with(options)
            .instrument(connect_span)
            .await
            .map_err(|e| {
                error!(dsn = %self.config.redacted_dsn(), "Database connection error: {}", e);
                ConnectionError::Connect(e)
            })?;

        if let Err(e) = self.verify(&pool).await {
            pool.close().await;
            return Err(e);
        }

        Ok(pool)
    }

    async fn verify(&self, pool: &MySqlPool) -> Result<(), ConnectionError> {
        let expected = &self.config.charset;

        let charset: String = sqlx::query_scalar("SELECT CAST(@@character_set_connection AS CHAR)")
            .fetch_one(pool)
            .await
            .map_err(|e| {
                error!("Error reading connection charset: {}", e);
                ConnectionError::Charset {
                    expected: expected.clone(),
                    reason: e.to_string(),
                }
            })?;

        if !charset.eq_ignore_ascii_case(expected) {
            error!("Error setting charset: server reported {}", charset);
            return Err(ConnectionError::Charset {
                expected: expected.clone(),
                reason: format!("server reported {charset}"),
            });
        }

        sqlx::query("SELECT 1").execute(pool).await.map_err(|e| {
            error!("Database round-trip check failed: {}", e);
            ConnectionError::RoundTrip(e)
        })?;

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = ?",
        )
        .bind(USERS_TABLE)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            error!("Error checking for table '{}': {}", USERS_TABLE, e);
            ConnectionError::RoundTrip(e)
        })?;

        if tables == 0 {
            error!("Table '{}' not found", USERS_TABLE);
            return Err(ConnectionError::MissingTable(USERS_TABLE.to_string()));
        }

        Ok(())
    }
}
