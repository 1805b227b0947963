//! Parameterized queries against the `usuario` table.

use super::{ConnectionError, ConnectionProvider, is_transport_error};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, mysql::MySqlRow};
use std::sync::Arc;
use thiserror::Error;
use tracing::{Instrument, error, info_span};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("a user with this email already exists")]
    Duplicate,
    #[error("database query failed: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if is_transport_error(&err) {
            Self::Connection(ConnectionError::Lost(err))
        } else {
            Self::Query(err)
        }
    }
}

/// A row of the `usuario` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i64,
}

/// Fields needed to insert a user; the store assigns the id.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i64,
}

/// Persistence operations the login and registration flows depend on.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Insert the user and return the id assigned by the store.
    async fn create(&self, user: &NewUser) -> Result<u64, StoreError>;

    /// Replace the stored hash of user `id`, e.g. after upgrading a legacy hash.
    async fn update_password_hash(&self, id: u64, password_hash: &str) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// `MySQL` implementation backed by the process-wide [`ConnectionProvider`].
#[derive(Clone, Debug)]
pub struct MySqlCredentialStore {
    provider: Arc<ConnectionProvider>,
}

impl MySqlCredentialStore {
    #[must_use]
    pub fn new(provider: Arc<ConnectionProvider>) -> Self {
        Self { provider }
    }

    async fn pool(&self) -> Result<MySqlPool, StoreError> {
        Ok(self.provider.acquire().await?)
    }
}

fn user_from_row(row: &MySqlRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        age: row.try_get("age")?,
    })
}

#[async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let pool = self.pool().await?;

        let query = r"
            SELECT
                CAST(ID_Usuario AS UNSIGNED) AS id,
                Nombre AS name,
                Correo AS email,
                Contrasena AS password_hash,
                CAST(Edad AS SIGNED) AS age
            FROM usuario
            WHERE Correo = ?
        ";

        let span = info_span!("db.query", db.system = "mysql", db.operation = "SELECT");
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&pool)
            .instrument(span)
            .await
            .inspect_err(|e| error!("Error fetching user by email: {}", e))?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(StoreError::from)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let pool = self.pool().await?;

        let span = info_span!("db.query", db.system = "mysql", db.operation = "SELECT");
        let row = sqlx::query("SELECT ID_Usuario FROM usuario WHERE Correo = ? LIMIT 1")
            .bind(email)
            .fetch_optional(&pool)
            .instrument(span)
            .await
            .inspect_err(|e| error!("Error checking if user exists: {}", e))?;

        Ok(row.is_some())
    }

    async fn create(&self, user: &NewUser) -> Result<u64, StoreError> {
        let pool = self.pool().await?;

        let span = info_span!("db.query", db.system = "mysql", db.operation = "INSERT");
        let result = sqlx::query(
            "INSERT INTO usuario (Nombre, Correo, Contrasena, Edad) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.age)
        .execute(&pool)
        .instrument(span)
        .await;

        match result {
            Ok(done) => Ok(done.last_insert_id()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(StoreError::Duplicate)
            }
            Err(e) => {
                error!("Error inserting user: {}", e);
                Err(e.into())
            }
        }
    }

    async fn update_password_hash(&self, id: u64, password_hash: &str) -> Result<(), StoreError> {
        let pool = self.pool().await?;

        let span = info_span!("db.query", db.system = "mysql", db.operation = "UPDATE");
        sqlx::query("UPDATE usuario SET Contrasena = ? WHERE ID_Usuario = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&pool)
            .instrument(span)
            .await
            .inspect_err(|e| error!("Error updating password hash: {}", e))?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let pool = self.pool().await?;

        let span = info_span!("db.ping", db.system = "mysql", db.operation = "PING");
        sqlx::query("SELECT 1")
            .execute(&pool)
            .instrument(span)
            .await
            .inspect_err(|e| error!("Failed to ping database: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::FlowError;
    use axum::http::StatusCode;
    use std::io;

    #[test]
    fn transport_errors_are_connection_errors() {
        for err in [
            sqlx::Error::PoolTimedOut,
            sqlx::Error::PoolClosed,
            sqlx::Error::WorkerCrashed,
            sqlx::Error::Io(io::Error::from(io::ErrorKind::ConnectionRefused)),
            sqlx::Error::Io(io::Error::from(io::ErrorKind::BrokenPipe)),
        ] {
            let store_err = StoreError::from(err);
            assert!(
                matches!(store_err, StoreError::Connection(ConnectionError::Lost(_))),
                "{store_err:?}"
            );

            let flow_err = FlowError::from(store_err);
            assert_eq!(flow_err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
            assert_eq!(flow_err.to_string(), "Error de conexión a la base de datos");
        }
    }

    #[test]
    fn statement_errors_stay_query_errors() {
        let store_err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(store_err, StoreError::Query(_)));
        assert_eq!(
            FlowError::from(store_err).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
