pub mod credentials;
pub mod extractors;
pub mod issuer;
pub mod middleware;
pub mod password;
pub mod session;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::AppError;
use crate::models::Principal;

// Re-export necessary items
pub use credentials::CredentialVerifier;
pub use extractors::AuthenticatedUser;
pub use issuer::SessionIssuer;
pub use middleware::{bearer_token, evaluate_session, AuthGate};
pub use password::{Bcrypt, PasswordHasher};
pub use session::{SessionLookup, SessionRecord, SessionStore, SessionToken};

lazy_static! {
    // Regex for username validation: alphanumeric, dots, underscores, hyphens
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9._-]+$").unwrap();
}

/// Everything the auth handlers share, built once per process.
pub struct AuthState {
    pub verifier: CredentialVerifier,
    pub issuer: SessionIssuer,
    pub sessions: Arc<SessionStore>,
}

impl AuthState {
    pub fn new(verifier: CredentialVerifier, sessions: Arc<SessionStore>) -> Self {
        Self {
            verifier,
            issuer: SessionIssuer::new(sessions.clone()),
            sessions,
        }
    }
}

/// Canonical form of a login identifier, matching what registration stores: surrounding
/// whitespace removed, and emails (anything containing `@`) lowercased.
pub fn normalize_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains('@') {
        trimmed.to_lowercase()
    } else {
        trimmed.to_string()
    }
}

/// Payload for a new account.
///
/// Missing fields deserialize as empty strings so they fail validation with a 400 rather
/// than a JSON extractor error.
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    /// Primary identifier. 1 to 32 characters: alphanumeric, dots, underscores or hyphens.
    #[serde(default)]
    #[validate(
        length(min = 1, max = 32, message = "Username is required"),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, dots, underscores, or hyphens"
        )
    )]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Optional second uniqueness key.
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
}

impl RegisterRequest {
    /// Trims identifiers, drops blank optional fields and validates the result.
    pub fn normalized(self) -> Result<Self, AppError> {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        let normalized = Self {
            username: self.username.trim().to_string(),
            password: self.password,
            email: non_blank(self.email).map(|e| normalize_identifier(&e)),
            first_name: non_blank(self.first_name),
            last_name: non_blank(self.last_name),
        };
        normalized.validate()?;
        Ok(normalized)
    }
}

// Hand-written so the password never reaches a log line.
impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Payload for a login. `identifier` may be the username or the email.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default, alias = "email", alias = "username")]
    #[validate(length(min = 1, message = "Identifier is required"))]
    pub identifier: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Returned by a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Opaque bearer token. Clients must not parse it.
    pub token: String,
    pub principal: Principal,
}

/// Returned by the session check endpoint, which never fails.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResponse {
    pub authenticated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
}
