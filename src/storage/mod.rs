//! The credential storage collaborator.
//!
//! The authentication core only ever asks storage three things: look an account up by
//! identifier, tell whether a username/email pair is already taken, and insert a new
//! account. Implementations map their own failures to `AppError::StorageError`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{AccountId, Credential, NewCredential};

pub use memory::MemoryCredentialStore;
pub use postgres::PgCredentialStore;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Finds the account whose username or email equals `identifier`.
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Credential>, AppError>;

    /// Whether `username`, or `email` when given, is already registered.
    async fn identifier_taken(&self, username: &str, email: Option<&str>)
        -> Result<bool, AppError>;

    /// Persists a new account. Returns `DuplicateIdentifier` if either key is taken.
    async fn insert(&self, credential: NewCredential) -> Result<AccountId, AppError>;
}
