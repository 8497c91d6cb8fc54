use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::domain::DomainError;
use serde_json::json;
use tracing::error;

/// Convert DomainError to an HTTP response with a JSON error body
pub fn domain_error_to_response(err: DomainError) -> Response {
    let (status, message) = match err {
        DomainError::InvalidUserId(msg) => (StatusCode::BAD_REQUEST, msg),

        DomainError::UnrecognizedRole(role) => {
            (StatusCode::BAD_REQUEST, format!("Unrecognized role: {}", role))
        }

        DomainError::InvalidToken(msg) => {
            (StatusCode::UNAUTHORIZED, format!("Invalid token: {}", msg))
        }

        DomainError::UserRoleNotFound(user_id) => (
            StatusCode::NOT_FOUND,
            format!("No role assigned to user {}", user_id),
        ),

        DomainError::RepositoryError(err) => {
            error!(error = %err, "repository error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
        }
    };

    (status, Json(json!({ "error": message }))).into_response()
}
