use super::{body_fields, flow_failure, parse_body};
use crate::auth::{AuthState, FlowError, RegisterInput, RegisteredUser, register as register_user, validate::field_text};
use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{instrument, warn};
use utoipa::ToSchema;

/// Request body. Fields are read by key from a non-empty JSON object.
#[derive(ToSchema)]
pub struct UserRegister {
    pub nombre: String,
    pub correo: String,
    pub contrasena: String,
    /// Age as a number or a numeric string.
    #[schema(example = "30")]
    pub edad: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RegisterSuccess {
    success: bool,
    message: String,
    data: RegisteredUser,
}

#[utoipa::path(
    post,
    path= "/register",
    request_body = UserRegister,
    responses (
        (status = 200, description = "Registration successful", body = RegisterSuccess, content_type = "application/json"),
        (status = 400, description = "Invalid fields or email already registered", body = super::Failure),
        (status = 405, description = "Method not allowed", body = super::Failure),
        (status = 503, description = "Database unavailable", body = super::Failure),
    ),
    tag= "register"
)]
// axum handler for register
#[instrument(skip(auth, body))]
pub async fn register(auth: Extension<Arc<AuthState>>, body: Bytes) -> Response {
    let request = match parse_body(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Invalid register payload: {}", e);
            return flow_failure(&e);
        }
    };

    let fields = match body_fields(&request) {
        Some(fields) if !fields.is_empty() => fields,
        _ => {
            warn!("Register payload is not a non-empty object");
            return flow_failure(&FlowError::validation("No se recibieron datos válidos"));
        }
    };

    let input = RegisterInput {
        nombre: field_text(fields.get("nombre")),
        correo: field_text(fields.get("correo")),
        contrasena: field_text(fields.get("contrasena")),
        edad: field_text(fields.get("edad")),
    };

    match register_user(&auth, input).await {
        Ok(user) => (
            StatusCode::OK,
            Json(RegisterSuccess {
                success: true,
                message: "Usuario registrado exitosamente".to_string(),
                data: user,
            }),
        )
            .into_response(),
        Err(e) => flow_failure(&e),
    }
}
