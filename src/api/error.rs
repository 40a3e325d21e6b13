use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::fmt;
use std::time::Duration;

use super::ApiResponse;
use crate::services::{AuthError, FileError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    Unauthorized {
        /// Machine-readable refinement: "unauthorized" for a missing
        /// token, "invalid_credential", "token_expired", "invalid_token".
        kind: &'static str,
        message: String,
    },

    LockedOut { retry_after: Duration },

    PayloadTooLarge { limit: u64 },

    UnsupportedMediaType(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Unauthorized { message, .. } => write!(f, "Unauthorized: {message}"),
            Self::LockedOut { retry_after } => {
                write!(f, "Locked out for {} seconds", retry_after.as_secs())
            }
            Self::PayloadTooLarge { limit } => {
                write!(f, "Payload exceeds the {limit} byte limit")
            }
            Self::UnsupportedMediaType(msg) => write!(f, "Unsupported media type: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized {
            kind: "unauthorized",
            message: msg.into(),
        }
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::ValidationError(_) => "validation",
            Self::Unauthorized { kind, .. } => kind,
            Self::LockedOut { .. } => "locked_out",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::UnsupportedMediaType(_) => "unsupported_media_type",
            Self::DatabaseError(_) | Self::InternalError(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthorized { message, .. } => (StatusCode::UNAUTHORIZED, message.clone()),
            Self::LockedOut { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                format!(
                    "Too many failed attempts. Retry in {} seconds",
                    retry_after.as_secs()
                ),
            ),
            Self::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("Payload exceeds the {limit} byte limit"),
            ),
            Self::UnsupportedMediaType(msg) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()>::error(message, kind);
        let mut response = (status, Json(body)).into_response();

        if let Self::LockedOut { retry_after } = &self
            && let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().to_string())
        {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }

        response
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredential => Self::Unauthorized {
                kind: "invalid_credential",
                message: "Invalid credentials".to_string(),
            },
            AuthError::LockedOut { retry_after } => Self::LockedOut { retry_after },
            AuthError::Expired => Self::Unauthorized {
                kind: "token_expired",
                message: "Token expired".to_string(),
            },
            AuthError::InvalidSignature | AuthError::Malformed => Self::Unauthorized {
                kind: "invalid_token",
                message: "Invalid token".to_string(),
            },
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::PayloadTooLarge { limit } => Self::PayloadTooLarge { limit },
            FileError::UnsupportedMediaType { declared } => Self::UnsupportedMediaType(declared),
            FileError::NotFound => Self::NotFound("File not found".to_string()),
            FileError::Storage(msg) => Self::InternalError(msg),
        }
    }
}
