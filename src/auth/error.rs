use crate::db::{ConnectionError, StoreError};
use axum::http::StatusCode;
use thiserror::Error;

/// Outcome of a failed login or registration.
///
/// The `Display` text is what the caller sees; connection and unexpected
/// failures keep their details for the logs only.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{0}")]
    Validation(String),
    #[error("Ya existe un usuario con este correo electrónico")]
    DuplicateEmail,
    #[error("No existe una cuenta con este correo. Por favor regístrate primero.")]
    NotFound,
    #[error("Contraseña incorrecta")]
    InvalidCredential,
    #[error("Error de conexión a la base de datos")]
    Connection(#[source] ConnectionError),
    #[error("Error interno del servidor")]
    Unexpected(String),
}

impl FlowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateEmail => "duplicate_email",
            Self::NotFound => "not_found",
            Self::InvalidCredential => "invalid_credential",
            Self::Connection(_) => "connection",
            Self::Unexpected(_) => "unexpected",
        }
    }

    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::DuplicateEmail | Self::NotFound | Self::InvalidCredential => {
                StatusCode::BAD_REQUEST
            }
            Self::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for FlowError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Connection(e) => Self::Connection(e),
            StoreError::Duplicate => Self::DuplicateEmail,
            StoreError::Query(e) => Self::Unexpected(e.to_string()),
        }
    }
}
