use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::{auth::tokens::TokenError, db::StoreError};

/// Broad classes of failure, each with a fixed HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned by services and handlers.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// A required upload field is missing or empty.
    #[error("Video {0} is required")]
    MissingUploadField(&'static str),

    #[error("Only video/mp4 uploads are accepted")]
    UnsupportedFormat,

    #[error("Nothing to update")]
    NothingToUpdate,

    #[error("User not found")]
    UserNotFound,

    #[error("Video not found")]
    VideoNotFound,

    #[error("Page not found")]
    PageNotFound,

    #[error("Forbidden")]
    Forbidden,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0} already taken")]
    Conflict(&'static str),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { field } => AppError::Conflict(field),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_)
            | AppError::MissingUploadField(_)
            | AppError::UnsupportedFormat
            | AppError::NothingToUpdate => ErrorKind::Validation,
            AppError::UserNotFound | AppError::VideoNotFound | AppError::PageNotFound => {
                ErrorKind::NotFound
            }
            AppError::Forbidden => ErrorKind::Forbidden,
            AppError::InvalidCredentials => ErrorKind::Unauthorized,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Token(token) => match token {
                TokenError::NotFound | TokenError::VerificationFailed | TokenError::Expired => {
                    ErrorKind::Unauthorized
                }
                TokenError::Creation(_) | TokenError::Store(_) => ErrorKind::Internal,
            },
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable numeric code clients can switch on.
    pub fn code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 1001,
            AppError::MissingUploadField(_) => 1002,
            AppError::UnsupportedFormat => 1003,
            AppError::UserNotFound => 1004,
            AppError::VideoNotFound => 1005,
            AppError::Forbidden => 1006,
            AppError::NothingToUpdate => 1007,
            AppError::PageNotFound => 1008,
            AppError::Conflict(_) => 1009,
            AppError::InvalidCredentials => 1403,
            AppError::Token(token) => match token {
                TokenError::Expired => 1401,
                TokenError::NotFound => 1402,
                TokenError::VerificationFailed => 1444,
                TokenError::Creation(_) => 1405,
                TokenError::Store(_) => 1999,
            },
            AppError::Internal(_) => 1999,
        }
    }

    /// Message safe to show to the client.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Token(TokenError::Creation(_)) => "Error while creating token".into(),
            _ if self.kind() == ErrorKind::Internal => "An internal error occurred".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            error!(error = %self, code = self.code(), "request failed");
        }
        let message = self.public_message();
        let body = json!({
            "message": message,
            "code": self.code(),
            "data": [message],
        });
        (kind.status(), Json(body)).into_response()
    }
}
