use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;

use super::CredentialStore;
use crate::error::AppError;
use crate::models::{AccountId, Credential, NewCredential};

/// Process-local credential store.
///
/// Used when no `DATABASE_URL` is configured and by the test suites. Accounts are lost
/// on restart, like the sessions themselves.
#[derive(Default)]
pub struct MemoryCredentialStore {
    accounts: RwLock<Vec<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }
}

fn conflicts(existing: &Credential, username: &str, email: Option<&str>) -> bool {
    existing.username == username
        || matches!((existing.email.as_deref(), email), (Some(a), Some(b)) if a == b)
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Credential>, AppError> {
        Ok(self
            .accounts
            .read()
            .iter()
            .find(|credential| credential.matches(identifier))
            .cloned())
    }

    async fn identifier_taken(
        &self,
        username: &str,
        email: Option<&str>,
    ) -> Result<bool, AppError> {
        Ok(self
            .accounts
            .read()
            .iter()
            .any(|existing| conflicts(existing, username, email)))
    }

    async fn insert(&self, credential: NewCredential) -> Result<AccountId, AppError> {
        let mut accounts = self.accounts.write();
        if accounts
            .iter()
            .any(|existing| conflicts(existing, &credential.username, credential.email.as_deref()))
        {
            return Err(AppError::DuplicateIdentifier);
        }

        let id = accounts.len() as AccountId + 1;
        accounts.push(Credential {
            id,
            username: credential.username,
            email: credential.email,
            password_hash: credential.password_hash,
            first_name: credential.first_name,
            last_name: credential.last_name,
            created_at: Utc::now(),
        });
        Ok(id)
    }
}
