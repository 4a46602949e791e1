use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::analysis::recovery::{truncate_chars, RecoveryError};
use crate::extraction::ExtractionError;

/// How much of the raw model output is echoed back when recovery fails.
const RAW_OUTPUT_EXCERPT_CHARS: usize = 5000;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Upload exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("PDF extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("AI service error: {0}")]
    Service(String),

    #[error("AI output recovery failed: {error}")]
    Recovery {
        error: RecoveryError,
        raw_output: String,
    },

    #[error("Request cancelled")]
    Cancelled,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut details: Option<Value> = None;

        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                format!("Uploaded file exceeds the {limit} byte limit"),
            ),
            AppError::Extraction(e) => {
                tracing::warn!("Extraction error: {e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EXTRACTION_ERROR",
                    "Could not read text from the uploaded PDF".to_string(),
                )
            }
            AppError::Service(msg) => {
                tracing::error!("AI service error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "AI_SERVICE_ERROR",
                    "AI model request failed (all fallbacks).".to_string(),
                )
            }
            AppError::Recovery { error, raw_output } => {
                tracing::error!("AI output recovery failed: {error}");
                details = Some(json!({
                    "exception": error.to_string(),
                    "candidate_excerpt": error.excerpt(),
                    "raw_output": truncate_chars(raw_output, RAW_OUTPUT_EXCERPT_CHARS),
                }));
                (
                    StatusCode::BAD_GATEWAY,
                    "AI_UNPARSEABLE_OUTPUT",
                    "AI returned unparseable JSON".to_string(),
                )
            }
            AppError::Cancelled => (
                StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
                "REQUEST_CANCELLED",
                "The request was cancelled".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_maps_to_400() {
        let response = AppError::Validation("job_description is required".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "job_description is required");
    }

    #[tokio::test]
    async fn test_recovery_error_carries_excerpts() {
        let response = AppError::Recovery {
            error: RecoveryError::NoObject {
                excerpt: "plain prose".into(),
            },
            raw_output: "plain prose".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "AI_UNPARSEABLE_OUTPUT");
        assert_eq!(body["error"]["details"]["raw_output"], "plain prose");
        assert_eq!(body["error"]["details"]["candidate_excerpt"], "plain prose");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let response = AppError::Internal(anyhow::anyhow!("secret path /tmp/x")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"]["message"], "An internal server error occurred");
    }

    #[test]
    fn test_cancelled_uses_client_closed_status() {
        let response = AppError::Cancelled.into_response();
        assert_eq!(response.status().as_u16(), 499);
    }
}
