//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every failure the authentication core can produce is one of its variants, and each
//! variant maps to exactly one HTTP status.
//!
//! `AppError` implements `actix_web::error::ResponseError` to convert application errors
//! into JSON responses. Storage and internal failures are logged with their detail but the
//! client only ever sees a generic message, so no hash values, SQL text or lookup specifics
//! leave the process. `From` implementations for `sqlx::Error`, `validator::ValidationErrors`,
//! `bcrypt::BcryptError` and `actix_web::error::BlockingError` allow propagation with `?`.

use actix_web::{error::BlockingError, error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Message returned for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
/// Message returned when a request carries no usable session.
pub const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Represents all possible errors that can occur within the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Missing or malformed client input (HTTP 400).
    ValidationError(String),
    /// The username or email is already registered (HTTP 409).
    DuplicateIdentifier,
    /// Authentication failed or is required but missing (HTTP 401).
    /// The message is intentionally generic.
    Unauthorized(String),
    /// The presented session existed but outlived the expiry window (HTTP 401).
    /// Distinguishable from `Unauthorized` so clients can show a better prompt.
    SessionExpired,
    /// The credential storage collaborator failed (HTTP 500).
    StorageError(String),
    /// Any other unexpected server-side failure (HTTP 500).
    InternalServerError(String),
}

impl AppError {
    /// The uniform login failure.
    pub fn invalid_credentials() -> Self {
        AppError::Unauthorized(INVALID_CREDENTIALS.into())
    }

    /// The uniform "no valid session" failure.
    pub fn not_authenticated() -> Self {
        AppError::Unauthorized(NOT_AUTHENTICATED.into())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::DuplicateIdentifier => write!(f, "Duplicate identifier"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::SessionExpired => write!(f, "Session expired"),
            AppError::StorageError(msg) => write!(f, "Storage Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateIdentifier => StatusCode::CONFLICT,
            AppError::Unauthorized(_) | AppError::SessionExpired => StatusCode::UNAUTHORIZED,
            AppError::StorageError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            AppError::ValidationError(msg) => json!({ "error": msg }),
            AppError::DuplicateIdentifier => json!({
                "error": "Username or email already registered"
            }),
            AppError::Unauthorized(msg) => json!({ "error": msg }),
            AppError::SessionExpired => json!({
                "error": "Session expired",
                "code": "session_expired"
            }),
            AppError::StorageError(detail) | AppError::InternalServerError(detail) => {
                log::error!("{}: {}", self.status_code(), detail);
                json!({ "error": "Internal server error" })
            }
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Converts `sqlx::Error` into `AppError::StorageError`.
///
/// Unique-constraint violations become `DuplicateIdentifier`, which closes the
/// window between the existence check and the insert during registration.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match &error {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateIdentifier
            }
            _ => AppError::StorageError(error.to_string()),
        }
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// The blocking pool was shut down or the hashing closure panicked.
impl From<BlockingError> for AppError {
    fn from(error: BlockingError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
