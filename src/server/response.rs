use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::error::Error;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BadRequest",
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "NotFound",
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "Internal",
            message: message.into(),
        }
    }
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::NotFound
        | Error::ProjectNotFound(_)
        | Error::UserNotFound(_)
        | Error::TeamNotFound(_)
        | Error::LinkShareNotFound => StatusCode::NOT_FOUND,
        Error::AlreadyExists | Error::AlreadyHasAccess => StatusCode::CONFLICT,
        Error::CyclicHierarchy | Error::BadRequest(_) | Error::InvalidPermission(_) => {
            StatusCode::BAD_REQUEST
        }
        Error::Unauthorized | Error::InvalidTokenFormat | Error::TokenExpired => {
            StatusCode::UNAUTHORIZED
        }
        Error::Forbidden
        | Error::ProjectIsArchived(_)
        | Error::LinkSharePasswordRequired
        | Error::LinkSharePasswordInvalid => StatusCode::FORBIDDEN,
        Error::CorruptHierarchy(_)
        | Error::Database(_)
        | Error::Io(_)
        | Error::Config(_)
        | Error::TokenLookupCollision => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Malformed or mistyped request bodies are client errors in the usual envelope.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "Rejected request body");
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let status = status_for(&error);

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = error.code(), "Request failed: {error}");
            "Internal server error".to_string()
        } else {
            if error.is_business_outcome() {
                tracing::debug!(code = error.code(), "Request refused: {error}");
            }
            error.to_string()
        };

        Self {
            status,
            code: error.code(),
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "data": null, "error": self.message, "code": self.code });
        (self.status, Json(body)).into_response()
    }
}
