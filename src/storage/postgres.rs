use async_trait::async_trait;
use sqlx::PgPool;

use super::CredentialStore;
use crate::error::AppError;
use crate::models::{AccountId, Credential, NewCredential};

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT UNIQUE,
    password_hash TEXT NOT NULL,
    first_name TEXT,
    last_name TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

/// PostgreSQL-backed credential store.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Creates the `users` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<Credential>, AppError> {
        let credential = sqlx::query_as::<_, Credential>(
            "SELECT id, username, email, password_hash, first_name, last_name, created_at \
             FROM users WHERE username = $1 OR email = $1 \
             ORDER BY (username = $1) DESC LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;
        Ok(credential)
    }

    async fn identifier_taken(
        &self,
        username: &str,
        email: Option<&str>,
    ) -> Result<bool, AppError> {
        let (taken,) = sqlx::query_as::<_, (bool,)>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR ($2::TEXT IS NOT NULL AND email = $2))",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn insert(&self, credential: NewCredential) -> Result<AccountId, AppError> {
        let (id,) = sqlx::query_as::<_, (AccountId,)>(
            "INSERT INTO users (username, email, password_hash, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&credential.username)
        .bind(&credential.email)
        .bind(&credential.password_hash)
        .bind(&credential.first_name)
        .bind(&credential.last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }
}
