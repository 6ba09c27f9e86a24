// src/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Errors a handler can surface to the client. Every variant maps to one
/// HTTP status and one `{error, message?, code?, details?}` body, so the
/// aggregation gateway can turn any of them into a per-part result without
/// going through an HTTP response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("{0}")]
    NotFound(String),

    /// Expected column missing from an underlying table (deployment /
    /// migration-state problem, not a client error).
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("{message}")]
    Internal {
        message: String,
        code: Option<String>,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn validation_with(message: impl Into<String>, details: Value) -> Self {
        ApiError::Validation {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            message: message.into(),
            code: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::SchemaMismatch(_) | ApiError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ApiError::Validation { message, details } => {
                let mut body = json!({ "error": message });
                if let Some(details) = details {
                    body["details"] = details.clone();
                }
                body
            }
            ApiError::NotFound(message) => json!({ "error": message }),
            ApiError::SchemaMismatch(message) => json!({
                "error": "Schema mismatch",
                "message": message,
            }),
            ApiError::Internal { message, code } => {
                let mut body = json!({
                    "error": "Internal server error",
                    "message": message,
                });
                if let Some(code) = code {
                    body["code"] = json!(code);
                }
                body
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code().map(|c| c.into_owned()));
        ApiError::Internal {
            message: err.to_string(),
            code,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status().is_server_error() {
            tracing::error!("request failed: {self}");
        }
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_body_carries_details() {
        let err = ApiError::validation_with(
            "Invalid query",
            json!({ "field_errors": { "site_id": ["site_id must be a positive integer"] } }),
        );
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let body = err.body();
        assert_eq!(body["error"], "Invalid query");
        assert_eq!(
            body["details"]["field_errors"]["site_id"][0],
            "site_id must be a positive integer"
        );
    }

    #[test]
    fn internal_body_is_generic_with_message_and_code() {
        let err = ApiError::Internal {
            message: "connection refused".into(),
            code: Some("57P01".into()),
        };
        let body = err.body();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["message"], "connection refused");
        assert_eq!(body["code"], "57P01");
    }

    #[test]
    fn not_found_uses_message_as_error_field() {
        let err = ApiError::NotFound("Site not found".into());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.body(), json!({ "error": "Site not found" }));
    }
}
