use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("token error: {0}")]
    Token(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn token(err: impl Into<String>) -> Self {
        Self::Token(err.into())
    }
}

/// Reason attached to a `Decision::Deny`.
///
/// Messages name the claim or scope that failed the check. They never embed
/// the raw token.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("client id '{cid}' is not generated from a clone OAuth client")]
    UntrustedClone { cid: String },
    #[error("client id '{cid}' is not trusted")]
    UntrustedClient { cid: String },
    #[error(
        "none of the required scopes [{}] are present in the user token scopes [{}]",
        .required.join(", "),
        .presented.join(", ")
    )]
    MissingScopes {
        required: Vec<String>,
        presented: Vec<String>,
    },
    #[error("{}", join_errors(.0))]
    Combined(Vec<AuthzError>),
}

impl AuthzError {
    pub fn invalid_token(err: impl ToString) -> Self {
        Self::InvalidToken(err.to_string())
    }

    /// Folds several denials into one error. A single denial is returned as is.
    pub fn combine(mut errors: Vec<AuthzError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            Self::Combined(errors)
        }
    }
}

fn join_errors(errors: &[AuthzError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<AuthzError> for AppError {
    fn from(value: AuthzError) -> Self {
        Self::Forbidden(value.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Token(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.to_string();
        let error = match &self {
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Configuration(_) => "configuration",
            AppError::Token(_) => "token",
            AppError::Internal(_) => "internal",
        };

        let payload = ErrorResponse {
            error: error.to_string(),
            message,
        };

        (status, Json(payload)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}
