use crate::domain::DomainError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Error response body
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub code: u16,
}

/// HTTP status for a domain error
pub fn domain_error_status(error: &DomainError) -> StatusCode {
    match error {
        DomainError::DeviceNotFound(_) => StatusCode::NOT_FOUND,

        DomainError::MissingFields(_)
        | DomainError::ImmutableField(_)
        | DomainError::DeviceInUse(_) => StatusCode::BAD_REQUEST,

        DomainError::RepositoryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert domain error to an HTTP response with a JSON body
pub fn domain_error_to_response(error: DomainError) -> Response {
    let status = domain_error_status(&error);
    if status.is_server_error() {
        error!(error = %error, "request failed with internal error");
    }

    error_response(status, error.to_string(), error.kind())
}

/// Convert a rejected JSON body into the same error shape as domain errors
pub fn json_rejection_to_response(rejection: JsonRejection) -> Response {
    let status = match &rejection {
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };
    error_response(status, rejection.body_text(), "invalid_body")
}

fn error_response(status: StatusCode, error: String, kind: &str) -> Response {
    let body = ErrorResponse {
        error,
        kind: kind.to_string(),
        code: status.as_u16(),
    };
    (status, Json(body)).into_response()
}
