pub mod health;
pub use self::health::health;

pub mod user_register;
pub use self::user_register::register;

pub mod user_login;
pub use self::user_login::login;

// common functions for the handlers
use crate::auth::FlowError;
use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;
use utoipa::ToSchema;

const METHOD_NOT_ALLOWED: &str = "Método no permitido. Use POST.";

/// Body of every failed request.
#[derive(ToSchema, Serialize, Debug)]
pub struct Failure {
    success: bool,
    message: String,
}

pub(crate) fn failure(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(Failure {
            success: false,
            message,
        }),
    )
        .into_response()
}

pub(crate) fn flow_failure(err: &FlowError) -> Response {
    failure(err.status_code(), err.to_string())
}

/// Decode a JSON request body, reporting empty and malformed input the way
/// the site's frontend expects.
pub(crate) fn parse_body(body: &Bytes) -> Result<Value, FlowError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(FlowError::validation("No se recibieron datos"));
    }

    serde_json::from_slice(body)
        .map_err(|e| FlowError::validation(format!("Error decodificando JSON: {e}")))
}

/// Fields of a decoded body. Only a JSON object carries fields, so arrays and
/// scalars yield `None` instead of being read positionally.
pub(crate) fn body_fields(value: &Value) -> Option<&Map<String, Value>> {
    value.as_object()
}

// axum handler for CORS preflight
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

// axum handler for any method other than POST/OPTIONS
pub async fn method_not_allowed() -> Response {
    warn!("Rejected request with unsupported method");
    failure(StatusCode::METHOD_NOT_ALLOWED, METHOD_NOT_ALLOWED.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_body_rejects_empty_input() {
        for body in ["", "  \n"] {
            let result = parse_body(&Bytes::from(body));
            assert!(
                matches!(result, Err(FlowError::Validation(ref msg)) if msg == "No se recibieron datos")
            );
        }
    }

    #[test]
    fn parse_body_reports_decode_errors() {
        let result = parse_body(&Bytes::from("{\"email\":"));
        assert!(
            matches!(result, Err(FlowError::Validation(ref msg)) if msg.starts_with("Error decodificando JSON: "))
        );
    }

    #[test]
    fn only_objects_have_fields() {
        assert!(body_fields(&json!({"email": "a@b.co"})).is_some());
        for value in [json!(["owner", "Nain456"]), json!(null), json!("owner"), json!(7)] {
            assert!(body_fields(&value).is_none(), "{value}");
        }
    }

    #[test]
    fn flow_failure_uses_error_status() {
        let response = flow_failure(&FlowError::NotFound);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
