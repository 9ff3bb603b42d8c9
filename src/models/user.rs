use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type AccountId = i64;

/// A stored account as the credential store hands it back.
///
/// `password_hash` is the bcrypt output; the plaintext secret is never kept.
/// `Debug` is implemented by hand so the hash stays out of log lines.
#[derive(Clone, FromRow)]
pub struct Credential {
    pub id: AccountId,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// An account about to be inserted. The secret has already been hashed.
#[derive(Clone)]
pub struct NewCredential {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// The authenticated identity attached to a request.
///
/// Carries no secret material; safe to serialize back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub account_id: AccountId,
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl From<&Credential> for Principal {
    fn from(credential: &Credential) -> Self {
        Self {
            account_id: credential.id,
            identifier: credential.username.clone(),
            email: credential.email.clone(),
        }
    }
}

impl Credential {
    /// Whether `identifier` names this account by either uniqueness key.
    pub fn matches(&self, identifier: &str) -> bool {
        self.username == identifier || self.email.as_deref() == Some(identifier)
    }
}
