//! Credential verification: registration and login against the credential store.
//!
//! Login failures are uniform. An unknown identifier is verified against a dummy bcrypt
//! hash of the same cost, so it costs about as much as a wrong password and returns the
//! same `AppError` value.

use actix_web::web;
use std::sync::Arc;

use super::password::PasswordHasher;
use super::{normalize_identifier, RegisterRequest};
use crate::error::AppError;
use crate::models::{AccountId, NewCredential, Principal};
use crate::storage::CredentialStore;

pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    dummy_hash: String,
}

impl CredentialVerifier {
    /// Builds the verifier and precomputes the dummy hash used on unknown identifiers.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self, AppError> {
        let dummy_hash = hasher.hash("taskdeck-dummy-secret")?;
        Ok(Self {
            store,
            hasher,
            dummy_hash,
        })
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Creates an account. The secret is hashed off the request executor and never
    /// echoed back or logged.
    pub async fn register(&self, request: RegisterRequest) -> Result<AccountId, AppError> {
        let request = request.normalized()?;

        if self
            .store
            .identifier_taken(&request.username, request.email.as_deref())
            .await?
        {
            return Err(AppError::DuplicateIdentifier);
        }

        let hasher = self.hasher.clone();
        let password = request.password;
        let password_hash = web::block(move || hasher.hash(&password)).await??;

        let account_id = self
            .store
            .insert(NewCredential {
                username: request.username,
                email: request.email,
                password_hash,
                first_name: request.first_name,
                last_name: request.last_name,
            })
            .await?;

        log::info!("Registered account {}", account_id);
        Ok(account_id)
    }

    /// Checks an (identifier, secret) pair. Returns the principal on an exact match and
    /// `AppError::invalid_credentials()` for every kind of mismatch. The identifier is
    /// normalized the same way registration normalizes what it stores.
    pub async fn authenticate(&self, identifier: &str, secret: &str) -> Result<Principal, AppError> {
        let identifier = normalize_identifier(identifier);
        let credential = self.store.find_by_identifier(&identifier).await?;

        let stored_hash = credential
            .as_ref()
            .map(|c| c.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());
        let hasher = self.hasher.clone();
        let secret = secret.to_string();
        let matched = web::block(move || hasher.verify(&secret, &stored_hash)).await??;

        match credential {
            Some(credential) if matched => Ok(Principal::from(&credential)),
            _ => {
                log::debug!("Rejected login attempt");
                Err(AppError::invalid_credentials())
            }
        }
    }
}
