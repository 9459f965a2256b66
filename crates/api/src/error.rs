use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use vidsum_core::error::CoreError;
use vidsum_db::StoreError;
use vidsum_worker::SubmitError;

/// Application-level error type for HTTP handlers.
///
/// Every variant renders as `{"error": <message>}`; internal details are
/// logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `vidsum_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The job store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The worker pool would not take the job.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The request body exceeded the configured size limit.
    #[error("Request body too large")]
    PayloadTooLarge,
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, .. } => {
                    (StatusCode::NOT_FOUND, format!("{entity} not found"))
                }
                CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                CoreError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                CoreError::InvalidTransition { .. } | CoreError::Internal(_) => {
                    tracing::error!(error = %core, "Internal core error");
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },

            // --- Store errors ---
            AppError::Store(err) => {
                tracing::error!(error = %err, "Job store error");
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
            }

            // --- Backpressure ---
            AppError::Submit(err) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_hides_the_id() {
        let (status, body) = render(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: "abc".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Job not found" }));
    }

    #[tokio::test]
    async fn validation_message_is_passed_through() {
        let (status, body) =
            render(AppError::Core(CoreError::Validation("Invalid YouTube URL".into()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid YouTube URL" }));
    }

    #[tokio::test]
    async fn store_errors_are_sanitized() {
        let err = StoreError::Corrupt {
            path: "/secret/jobs/x.json".into(),
            message: "eof".into(),
        };
        let (status, body) = render(AppError::Store(err)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": INTERNAL_MESSAGE }));
    }

    #[tokio::test]
    async fn full_queue_is_service_unavailable() {
        let (status, body) = render(AppError::Submit(SubmitError::QueueFull)).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, json!({ "error": "Job queue is full" }));
    }
}
