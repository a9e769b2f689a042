//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tether_core::files::FileError;
use tether_shared::AppError;
use tracing::error;

/// Error returned by handlers, rendered as `{"error", "message"}`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl ApiError {
    /// Create a 400 response.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let code = self.0.error_code().to_ascii_lowercase();

        // Server-side details stay in the logs
        let message = match status {
            StatusCode::SERVICE_UNAVAILABLE => {
                "Request was cancelled or timed out".to_string()
            }
            s if s.is_server_error() => {
                error!(error = %self.0, "Request failed");
                "An error occurred".to_string()
            }
            _ => self.0.to_string(),
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use rstest::rstest;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[rstest]
    #[case(AppError::Validation("file is missing".into()), StatusCode::BAD_REQUEST, "validation_error")]
    #[case(AppError::NotFound("x".into()), StatusCode::NOT_FOUND, "not_found")]
    #[case(AppError::Conflict("x".into()), StatusCode::CONFLICT, "conflict")]
    #[case(AppError::Forbidden("x".into()), StatusCode::FORBIDDEN, "forbidden")]
    #[case(AppError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "storage_error")]
    #[case(AppError::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")]
    #[tokio::test]
    async fn test_error_rendering(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let (actual, body) = render(ApiError(err)).await;
        assert_eq!(actual, status);
        assert_eq!(body["error"], code);
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (_, body) = render(ApiError(AppError::Database("password=hunter2".into()))).await;
        assert_eq!(body["message"], "An error occurred");
    }

    #[tokio::test]
    async fn test_client_errors_keep_message() {
        let (_, body) = render(ApiError::validation("referenceObjectId is empty")).await;
        assert_eq!(body["message"], "Validation error: referenceObjectId is empty");
    }
}
