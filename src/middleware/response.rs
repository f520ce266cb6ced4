use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Wrapper for API responses that adds the uniform success envelope:
/// `{"status": true, "message": ..., "data": ..., "meta": ...?}`
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub message: String,
    pub meta: Option<Value>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with the default message
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: "Request successful".to_string(),
            meta: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return crate::error::ApiError::internal_server_error().into_response();
            }
        };

        let mut envelope = json!({
            "status": true,
            "message": self.message,
            "data": data_value,
        });
        if let Some(meta) = self.meta {
            envelope["meta"] = meta;
        }

        (StatusCode::OK, Json(envelope)).into_response()
    }
}

/// Standard handler return type
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wraps_data_and_message() {
        let response = ApiResponse::with_message(json!({"id": 1}), "Profile deleted");
        assert_eq!(response.message, "Profile deleted");
        assert!(response.meta.is_none());
    }

    #[test]
    fn meta_is_attached_when_present() {
        let response =
            ApiResponse::success(json!([])).with_meta(json!({"offset": 0, "limit": 10}));
        assert_eq!(response.meta.unwrap()["limit"], 10);
    }
}
