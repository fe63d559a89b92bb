//! Error handling for the catalog HTTP layer

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

const INTERNAL_MESSAGE: &str = "An internal server error occurred";

/// Standard error response format for all HTTP errors
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub details: Vec<serde_json::Value>,
    pub message: String,
    pub code: String,
    pub trace_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error("bad request: {message}")]
    BadRequest { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: "bad_request".to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Envelope sent to the client. Internal failures carry a generic message.
    pub fn body(&self, trace_id: Uuid) -> ErrorBody {
        let (code, message) = match self {
            AppError::NotFound { message, code } | AppError::BadRequest { message, code } => {
                (code.clone(), message.clone())
            }
            AppError::Internal(_) => ("internal_error".to_string(), INTERNAL_MESSAGE.to_string()),
        };

        ErrorBody {
            details: Vec::new(),
            message,
            code,
            trace_id: trace_id.to_string(),
            timestamp: OffsetDateTime::now_utc().to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();
        let body = self.body(error_id);

        match &self {
            AppError::Internal(source) => tracing::error!(
                error_id = %error_id,
                error_code = %body.code,
                status_code = %status.as_u16(),
                error = ?source,
                "Request error"
            ),
            _ => tracing::warn!(
                error_id = %error_id,
                error_code = %body.code,
                status_code = %status.as_u16(),
                message = %body.message,
                "Request error"
            ),
        }

        (status, Json(ErrorEnvelope { error: body })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_error_response_mapping() {
        let error = AppError::not_found("Book not found");
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_error_mapping() {
        let internal_error = anyhow::anyhow!("Database connection failed");
        let error = AppError::Internal(internal_error);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let error = AppError::Internal(anyhow::anyhow!("collection `books` exploded"));
        let body = error.body(Uuid::nil());
        assert_eq!(body.code, "internal_error");
        assert_eq!(body.message, INTERNAL_MESSAGE);
        assert!(body.details.is_empty());
    }

    #[tokio::test]
    async fn test_error_response_format() {
        let response = AppError::not_found("Genre not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], "not_found");
        assert_eq!(json["error"]["message"], "Genre not found");
        assert!(json["error"]["trace_id"].as_str().unwrap().parse::<Uuid>().is_ok());
        assert!(json["error"]["timestamp"].is_string());
    }
}
