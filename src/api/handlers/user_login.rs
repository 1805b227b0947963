use super::{body_fields, flow_failure, parse_body};
use crate::auth::{AuthResult, AuthState, LoginInput, authenticate, validate::field_text};
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

/// Request body. Fields are read by key from a JSON object.
#[derive(ToSchema)]
pub struct UserLogin {
    /// Email address or admin username.
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct LoginSuccess {
    success: bool,
    #[serde(rename = "userType")]
    user_type: String,
    message: String,
    data: AuthResult,
}

#[utoipa::path(
    post,
    path= "/login",
    request_body = UserLogin,
    responses (
        (status = 200, description = "Login successful", body = LoginSuccess, content_type = "application/json"),
        (status = 400, description = "Missing fields, unknown email or wrong password", body = super::Failure),
        (status = 405, description = "Method not allowed", body = super::Failure),
        (status = 503, description = "Database unavailable", body = super::Failure),
    ),
    tag= "login"
)]
// axum handler for login
#[instrument(skip(auth, body))]
pub async fn login(auth: Extension<Arc<AuthState>>, body: Bytes) -> Response {
    let request = match parse_body(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Invalid login payload: {}", e);
            return flow_failure(&e);
        }
    };

    // a body that is not an object has no fields and fails the presence check
    let fields = body_fields(&request);
    let input = LoginInput {
        email: fields.and_then(|f| field_text(f.get("email"))),
        password: fields.and_then(|f| field_text(f.get("password"))),
    };

    match authenticate(&auth, input).await {
        Ok(result) => (
            StatusCode::OK,
            Json(LoginSuccess {
                success: true,
                user_type: result.user_type().to_string(),
                message: format!("Bienvenido, {}", result.name()),
                data: result,
            }),
        )
            .into_response(),
        Err(e) => flow_failure(&e),
    }
}
