//! Request-processing errors and their HTTP renderings.
//!
//! The payload shapes here are wire contracts that clients match on:
//! `Broken json` at 400, `{"errors": ...}` at 400 for validation,
//! plain-text 403s, and `{"message": "Server Error"}` at 500 in
//! production mode.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use jetway_schema::FieldErrors;

use crate::config::Mode;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is not valid JSON. Terminal: the handler never runs
    /// past the point of discovery.
    #[error("broken json body")]
    MalformedBody,

    /// The body or query string failed schema validation.
    #[error(transparent)]
    Validation(FieldErrors),

    /// The caller failed an authentication/authorization predicate.
    #[error("{0}")]
    Forbidden(&'static str),

    /// An unhandled handler fault. The only category that is logged as an
    /// application error.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn forbidden(message: &'static str) -> Self {
        Self::Forbidden(message)
    }

    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }

    /// Render for the client. Only `Internal` depends on the operating
    /// mode; everything else is a fixed 4xx contract.
    pub fn into_response(self, mode: Mode) -> Response {
        match self {
            ApiError::MalformedBody => {
                (StatusCode::BAD_REQUEST, "Broken json").into_response()
            }
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                axum::Json(json!({"errors": errors.as_json()})),
            )
                .into_response(),
            ApiError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, message).into_response()
            }
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "unhandled handler fault");
                if mode.is_debug() {
                    (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:?}")).into_response()
                } else {
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        axum::Json(json!({"message": "Server Error"})),
                    )
                        .into_response()
                }
            }
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn malformed_body_is_fixed_400() {
        let response = ApiError::MalformedBody.into_response(Mode::Production);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Broken json");
    }

    #[tokio::test]
    async fn validation_payload_shape() {
        let mut errors = FieldErrors::new();
        errors.required("id");
        let response = ApiError::from(errors).into_response(Mode::Production);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_text(response).await,
            r#"{"errors":{"id":"is required"}}"#
        );
    }

    #[tokio::test]
    async fn production_faults_hide_detail() {
        let err = ApiError::internal(anyhow::anyhow!("secret db string"));
        let response = err.into_response(Mode::Production);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_text(response).await;
        assert_eq!(body, r#"{"message":"Server Error"}"#);
    }

    #[tokio::test]
    async fn debug_faults_expose_detail() {
        let err = ApiError::internal(anyhow::anyhow!("boom at line 3"));
        let response = err.into_response(Mode::Debug);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("boom at line 3"));
    }
}
