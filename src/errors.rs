use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::authz::{Decision, IdentityError, Rejection};
use crate::storage::StorageError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("invalid credential: {0}")]
    InvalidCredential(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    Rejected(Rejection),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("storage unavailable")]
    StorageUnavailable(#[from] StorageError),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn invalid_credential(message: impl Into<String>) -> Self {
        Self::InvalidCredential(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Rejected(reason) => match reason {
                Rejection::NotFound => StatusCode::NOT_FOUND,
                Rejection::UploadsClosed => StatusCode::FORBIDDEN,
                Rejection::InvalidGuestName => StatusCode::BAD_REQUEST,
                Rejection::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                Rejection::UnsupportedType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            },
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::InvalidCredential(_) => "invalid_credential",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::BadRequest(_) => "bad_request",
            AppError::Rejected(reason) => reason.kind(),
            AppError::Configuration(_) => "configuration",
            AppError::StorageUnavailable(_) => "storage_unavailable",
            AppError::Database(_) => "database",
            AppError::Internal(_) => "internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Infrastructure faults are logged here with their source and rendered opaquely.
        match &self {
            AppError::Database(err) => tracing::error!(error = %err, "database failure"),
            AppError::StorageUnavailable(err) => tracing::error!(error = %err, "blob store failure"),
            AppError::Internal(msg) | AppError::Configuration(msg) => {
                tracing::error!(error = %msg, "internal failure")
            }
            _ => {}
        }

        let status = self.status();
        let payload = ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
        };

        (status, Json(payload)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<IdentityError> for AppError {
    fn from(value: IdentityError) -> Self {
        match value {
            IdentityError::Unauthenticated => Self::unauthenticated("authorization required"),
            IdentityError::InvalidCredential(reason) => Self::InvalidCredential(reason),
        }
    }
}

impl From<Rejection> for AppError {
    fn from(value: Rejection) -> Self {
        match value {
            // Same wording as any other missing event so guests cannot tell a deactivated one apart.
            Rejection::NotFound => Self::not_found("wedding not found"),
            other => Self::Rejected(other),
        }
    }
}

impl Decision {
    /// Converts a denial into the generic forbidden error, without resource details.
    pub fn into_result(self) -> AppResult<()> {
        match self {
            Decision::Allowed => Ok(()),
            Decision::Forbidden => Err(AppError::forbidden("you do not have access to this resource")),
        }
    }
}
