/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status + `{"error":{"code","message"}}` body)
 * - Uniform conversion of repo / id codec / auth gate / password errors
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::gate::Rejection;
use crate::services::id_codec::IdCodecError;
use crate::services::password::PasswordError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{code}: {message}")]
    BadRequest { code: &'static str, message: String },
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {resource}")]
    NotFound { resource: &'static str },
    #[error("{code}: {message}")]
    Conflict { code: &'static str, message: String },
    #[error("too many requests")]
    TooManyRequests,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::bad_request("VALIDATION_ERROR", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound { resource }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest { code, message } => (StatusCode::BAD_REQUEST, code, message),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, "FORBIDDEN", message),
            AppError::NotFound { resource } => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{resource} not found"),
            ),
            AppError::Conflict { code, message } => (StatusCode::CONFLICT, code, message),
            AppError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "TOO_MANY_REQUESTS",
                "too many login attempts".into(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".into(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<Rejection> for AppError {
    fn from(r: Rejection) -> Self {
        let message = r.to_string();
        match r {
            Rejection::Unauthenticated(reason) => AppError::Unauthorized(reason.message().into()),
            Rejection::Forbidden => AppError::Forbidden(message),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => AppError::conflict("CONFLICT", "conflict"),
            RepoError::Db(err) => {
                tracing::error!(error = %err, "database error");
                AppError::Internal
            }
        }
    }
}

impl From<IdCodecError> for AppError {
    fn from(e: IdCodecError) -> Self {
        match e {
            // Client supplied a malformed public id (e.g. /smetas/{id})
            IdCodecError::DecodeInvalidFormat | IdCodecError::DecodeOutOfRange => {
                AppError::bad_request("INVALID_PUBLIC_ID", "invalid id")
            }

            // server-side config / programming errors
            IdCodecError::InvalidMinLength { .. }
            | IdCodecError::Sqids(_)
            | IdCodecError::NegativeId { .. } => {
                tracing::error!(error = %e, "id codec failure");
                AppError::Internal
            }
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        tracing::error!(error = %e, "password hashing failure");
        AppError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth::gate::Unauthenticated;
    use axum::body::to_bytes;
    use serde_json::{Value, json};

    async fn render(err: AppError) -> (StatusCode, Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn missing_token_renders_unauthorized_body() {
        let err = AppError::from(Rejection::Unauthenticated(Unauthenticated::NoToken));
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            json!({"error": {"code": "UNAUTHORIZED", "message": "no token provided"}})
        );
    }

    #[tokio::test]
    async fn forbidden_rejection_is_403() {
        let (status, body) = render(Rejection::Forbidden.into()).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "insufficient role");
    }

    #[tokio::test]
    async fn repo_errors_map_to_conflict_and_internal() {
        let (status, _) = render(RepoError::Conflict.into()).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = render(RepoError::Db(sqlx::Error::RowNotFound).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "internal server error");
    }

    #[tokio::test]
    async fn bad_public_id_is_400() {
        let (status, body) = render(IdCodecError::DecodeInvalidFormat.into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_PUBLIC_ID");
    }

    #[tokio::test]
    async fn throttled_login_is_429() {
        let (status, body) = render(AppError::TooManyRequests).await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["message"], "too many login attempts");
    }
}
