use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use corpreg_core::CoreError;
use serde::Serialize;

#[derive(Debug)]
pub enum AppError {
    /// Malformed input: bad JSON, bad id, failed validation.
    BadRequest(String),
    Auth(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    /// Carries the suggested wait in whole seconds.
    TooManyRequests(u64),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::TooManyRequests(_) => (
                StatusCode::TOO_MANY_REQUESTS,
                "too many requests".to_string(),
            ),
            AppError::Internal(msg) => {
                // Log the real error server-side, return generic message to client
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            code: status.as_u16(),
            error: message,
        };

        let mut response = (status, axum::Json(body)).into_response();
        if let AppError::TooManyRequests(wait_secs) = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(wait_secs.max(1)));
        }
        response
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(violations) => AppError::BadRequest(violations.to_string()),
            CoreError::NotFound(_) => AppError::NotFound("company not found".to_string()),
            CoreError::Conflict(_) => {
                AppError::Conflict("company name already exists".to_string())
            }
            err @ CoreError::Store { .. } => {
                AppError::Internal(format!("{:#}", anyhow::Error::new(err)))
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{e:#}"))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use corpreg_core::{Violation, Violations};
    use uuid::Uuid;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn core_errors_map_to_statuses() {
        let cases = [
            (
                CoreError::Validation(Violations::from(vec![Violation::new("name", "name is required")])),
                StatusCode::BAD_REQUEST,
            ),
            (CoreError::NotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (CoreError::Conflict("A".into()), StatusCode::CONFLICT),
            (
                CoreError::store("get", std::io::Error::other("boom")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let response = AppError::from(err).into_response();
            assert_eq!(response.status(), status);
        }
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let err = CoreError::store("get", std::io::Error::other("secret path /var/db"));
        let response = AppError::from(err).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["code"], 500);
    }

    #[tokio::test]
    async fn validation_message_is_surfaced() {
        let err = CoreError::Validation(Violations::from(vec![Violation::new(
            "type",
            "type is required",
        )]));
        let body = body_json(AppError::from(err).into_response()).await;
        assert_eq!(body["error"], "type is required");
    }

    #[tokio::test]
    async fn too_many_requests_sets_retry_after() {
        let response = AppError::TooManyRequests(0).into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }
}
