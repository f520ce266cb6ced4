// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// Machine-readable error codes surfaced to clients inside the error envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Validation / business-rule failures (422)
    ValidationError,
    UnsupportedFileType,
    DuplicateEntry,
    UnregisteredEmail,
    WrongPassword,
    ValuesDontMatch,
    AlreadyVerified,

    // Authentication failures (401)
    Unauthenticated,
    TokenExpired,
    InvalidToken,

    // Resource failures (403/404)
    ResourceNotFound,
    ResourceForbidden,

    // Request failures (400)
    BadRequest,

    // Too many requests (429)
    TooManyRequests,

    // Server errors (5xx)
    InternalServerError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::UnsupportedFileType => "UNSUPPORTED_FILE_TYPE",
            ErrorCode::DuplicateEntry => "DUPLICATE_ENTRY",
            ErrorCode::UnregisteredEmail => "UNREGISTERED_EMAIL",
            ErrorCode::WrongPassword => "WRONG_PASSWORD",
            ErrorCode::ValuesDontMatch => "VALUES_DONT_MATCH",
            ErrorCode::AlreadyVerified => "ALREADY_VERIFIED",
            ErrorCode::Unauthenticated => "UNAUTHENTICATED",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::ResourceForbidden => "RESOURCE_FORBIDDEN",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::TooManyRequests => "TOO_MANY_REQUESTS",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        }
    }
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthenticated { code: ErrorCode, message: String },

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 422 Unprocessable Entity (domain validation and business-rule errors)
    Validation {
        code: ErrorCode,
        message: String,
        data: Option<Value>,
    },

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ApiError::BadRequest(_) => ErrorCode::BadRequest,
            ApiError::Unauthenticated { code, .. } => *code,
            ApiError::Forbidden(_) => ErrorCode::ResourceForbidden,
            ApiError::NotFound(_) => ErrorCode::ResourceNotFound,
            ApiError::Validation { code, .. } => *code,
            ApiError::TooManyRequests(_) => ErrorCode::TooManyRequests,
            ApiError::InternalServerError(_) => ErrorCode::InternalServerError,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthenticated { message, .. } => message,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Validation { message, .. } => message,
            ApiError::TooManyRequests(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
        }
    }

    /// Convert to the uniform JSON error envelope
    pub fn to_json(&self) -> Value {
        let data = match self {
            ApiError::Validation { data, .. } => data.clone().unwrap_or(Value::Null),
            _ => Value::Null,
        };
        json!({
            "status": false,
            "error_code": self.error_code().as_str(),
            "message": self.message(),
            "data": data,
        })
    }
}

// Static constructor methods, mirroring the exception hierarchy the handlers lean on
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError::Validation {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn validation_with_data(code: ErrorCode, message: impl Into<String>, data: Value) -> Self {
        ApiError::Validation {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated {
            code: ErrorCode::Unauthenticated,
            message: message.into(),
        }
    }

    pub fn invalid_token(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated {
            code: ErrorCode::InvalidToken,
            message: message.into(),
        }
    }

    pub fn token_expired() -> Self {
        ApiError::Unauthenticated {
            code: ErrorCode::TokenExpired,
            message: "Token has expired. Please log in again.".to_string(),
        }
    }

    pub fn forbidden() -> Self {
        ApiError::Forbidden("You're not allowed to access this resource.".to_string())
    }

    pub fn forbidden_with_message(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error() -> Self {
        ApiError::InternalServerError(
            "Something went wrong at our end. Please try again later".to_string(),
        )
    }
}

// Convert collaborator error types to ApiError. Internal details are logged
// server-side and never exposed to clients.
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Resource not found"),
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::internal_server_error()
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details: Vec<Value> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    json!({
                        "field": field,
                        "message": e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string()),
                    })
                })
            })
            .collect();
        ApiError::validation_with_data(
            ErrorCode::ValidationError,
            "Validation failed",
            json!({ "errors": details }),
        )
    }
}

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        match err {
            crate::database::manager::DatabaseError::Sqlx(sqlx_err) => sqlx_err.into(),
            other => {
                tracing::error!("Database configuration error: {}", other);
                ApiError::internal_server_error()
            }
        }
    }
}

impl From<crate::services::object_store::StorageError> for ApiError {
    fn from(err: crate::services::object_store::StorageError) -> Self {
        tracing::error!("Object store error: {}", err);
        ApiError::internal_server_error()
    }
}

impl From<crate::services::processing::ProcessingError> for ApiError {
    fn from(err: crate::services::processing::ProcessingError) -> Self {
        tracing::error!("Processor dispatch error: {}", err);
        ApiError::internal_server_error()
    }
}

impl From<crate::services::email::EmailError> for ApiError {
    fn from(err: crate::services::email::EmailError) -> Self {
        tracing::error!("Email send error: {}", err);
        ApiError::internal_server_error()
    }
}

impl From<crate::services::push::PushError> for ApiError {
    fn from(err: crate::services::push::PushError) -> Self {
        tracing::error!("Push notification error: {}", err);
        ApiError::internal_server_error()
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_422_with_code() {
        let err = ApiError::validation(
            ErrorCode::DuplicateEntry,
            "This email is already registered with Wonderspaced.",
        );
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = err.to_json();
        assert_eq!(body["status"], false);
        assert_eq!(body["error_code"], "DUPLICATE_ENTRY");
    }

    #[test]
    fn not_found_maps_to_404_envelope() {
        let err = ApiError::not_found("Adventure not found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_json()["error_code"], "RESOURCE_NOT_FOUND");
        assert_eq!(err.to_json()["data"], serde_json::Value::Null);
    }

    #[test]
    fn row_not_found_becomes_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn token_errors_carry_distinct_codes() {
        assert_eq!(ApiError::token_expired().error_code(), ErrorCode::TokenExpired);
        assert_eq!(
            ApiError::invalid_token("Invalid token payload").error_code(),
            ErrorCode::InvalidToken
        );
    }
}
