//! Editor error types

use reqwest::StatusCode;
use shared::error::{AppError, ErrorCategory, ErrorCode};
use thiserror::Error;

/// Failure reported by the persistence boundary for one call
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PersistError {
    /// Target entity no longer exists server-side
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation; `field` names the offending column
    #[error("Conflict on {field}: {message}")]
    Conflict { field: String, message: String },

    /// Payload rejected by the server
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication required
    #[error("Authentication required")]
    Unauthorized,

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Server-side failure
    #[error("Server error: {0}")]
    Server(String),

    /// Request never completed (connect, timeout, TLS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl PersistError {
    pub fn conflict(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether re-running the same call later can succeed
    ///
    /// Conflicts count as retryable: the caller re-derives the value (e.g.
    /// re-runs the slug allocator) and commits again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::Transport(_) | Self::Server(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Field named by a conflict, if any
    pub fn conflict_field(&self) -> Option<&str> {
        match self {
            Self::Conflict { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Classify a structured error returned by the backend
    pub fn from_app_error(err: AppError) -> Self {
        match err.code {
            ErrorCode::NotFound
            | ErrorCode::RestaurantNotFound
            | ErrorCode::CategoryNotFound
            | ErrorCode::DishNotFound => Self::NotFound(err.message),
            ErrorCode::SlugTaken => {
                let field = err.detail_str("field").unwrap_or("slug").to_string();
                Self::Conflict {
                    field,
                    message: err.message,
                }
            }
            ErrorCode::AlreadyExists | ErrorCode::CategoryNameExists => {
                let field = err.detail_str("field").unwrap_or("name").to_string();
                Self::Conflict {
                    field,
                    message: err.message,
                }
            }
            ErrorCode::PermissionDenied => Self::Forbidden(err.message),
            code => match code.category() {
                ErrorCategory::Auth => Self::Unauthorized,
                ErrorCategory::System => Self::Server(err.message),
                _ => Self::Validation(err.message),
            },
        }
    }

    /// Classify an HTTP error response body
    ///
    /// The body is expected to be an `ApiResponse` envelope; anything else
    /// falls back to the status code alone.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let envelope = serde_json::from_str::<shared::ApiResponse<serde_json::Value>>(body).ok();

        if let Some(envelope) = envelope
            && !envelope.is_success()
        {
            let err = envelope.to_error();
            if err.code != ErrorCode::Unknown {
                return Self::from_app_error(err);
            }
        }

        match status {
            StatusCode::NOT_FOUND => Self::NotFound(body.to_string()),
            StatusCode::CONFLICT => Self::conflict("unknown", body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                Self::Validation(body.to_string())
            }
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::FORBIDDEN => Self::Forbidden(body.to_string()),
            _ => Self::Server(format!("{}: {}", status, body)),
        }
    }
}

impl From<reqwest::Error> for PersistError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

/// Session-level error type
#[derive(Debug, Error)]
pub enum EditorError {
    /// Staging call rejected; the cache is unchanged
    #[error(transparent)]
    Stage(#[from] AppError),

    /// Backend call failed
    #[error(transparent)]
    Persist(#[from] PersistError),

    /// A commit is already running for this session
    #[error("A commit is already in progress")]
    CommitInProgress,

    /// No restaurant loaded into the session
    #[error("No restaurant loaded")]
    NotLoaded,
}

/// Result type for session operations
pub type EditorResult<T> = Result<T, EditorError>;
