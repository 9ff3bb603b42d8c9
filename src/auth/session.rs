//! Server-side session state.
//!
//! A [`SessionStore`] maps opaque [`SessionToken`]s to [`SessionRecord`]s for the life of
//! the process. Nothing is persisted: a restart logs every user out, and that is the
//! accepted behavior for a single-node deployment.
//!
//! Expiry is lazy. A record is checked against the expiry window whenever it is
//! presented, and removed on the first access that finds it too old. Until then a stale
//! record may still occupy memory, but it is never honored. [`SessionStore::purge_expired`]
//! is available for deployments that want a periodic sweep as well.
//!
//! Every operation takes the table lock exactly once, so a reader never sees a record
//! mid-insert and the read-then-delete in [`SessionStore::touch_and_validate`] cannot
//! interleave with another request.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use rand::{rngs::OsRng, RngCore};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::models::{AccountId, Principal};

/// Random bytes per token (256 bits).
pub const TOKEN_BYTES: usize = 32;

/// An opaque bearer credential: 32 bytes from the OS CSPRNG, hex encoded.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(hex::encode(bytes))
    }

    /// Wraps a token presented by a client. No format check is done here; an unknown
    /// string simply never matches a stored session.
    pub fn from_presented(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens are credentials; keep them out of debug output.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub account_id: AccountId,
    pub identifier: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(principal: Principal, created_at: DateTime<Utc>) -> Self {
        Self {
            account_id: principal.account_id,
            identifier: principal.identifier,
            email: principal.email,
            created_at,
        }
    }

    pub fn principal(&self) -> Principal {
        Principal {
            account_id: self.account_id,
            identifier: self.identifier.clone(),
            email: self.email.clone(),
        }
    }

    fn is_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.created_at) > window
    }
}

/// Outcome of presenting a token to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    Valid(SessionRecord),
    /// The record existed but was too old; it has been removed.
    Expired,
    Missing,
}

pub struct SessionStore {
    sessions: Mutex<HashMap<SessionToken, SessionRecord>>,
    window: Duration,
}

impl SessionStore {
    pub fn new(window: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            window,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Inserts a record under a fresh token. Returns `false`, leaving the existing
    /// record untouched, if the token is already present.
    pub fn put(&self, token: SessionToken, record: SessionRecord) -> bool {
        use std::collections::hash_map::Entry;

        match self.sessions.lock().entry(token) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Raw read, without any expiry policy applied.
    pub fn get(&self, token: &SessionToken) -> Option<SessionRecord> {
        self.sessions.lock().get(token).cloned()
    }

    /// Removes the session. Removing an absent token is not an error; the return value
    /// only reports whether something was there.
    pub fn delete(&self, token: &SessionToken) -> bool {
        self.sessions.lock().remove(token).is_some()
    }

    /// Looks the token up and enforces the expiry window as one step.
    ///
    /// A session is valid while `now - created_at <= window`. The first lookup past that
    /// removes it, so every later lookup reports `Missing`.
    pub fn touch_and_validate(&self, token: &SessionToken, now: DateTime<Utc>) -> SessionLookup {
        let mut sessions = self.sessions.lock();
        let live = match sessions.get(token) {
            None => return SessionLookup::Missing,
            Some(record) => (!record.is_expired(now, self.window)).then(|| record.clone()),
        };
        match live {
            Some(record) => SessionLookup::Valid(record),
            None => {
                sessions.remove(token);
                SessionLookup::Expired
            }
        }
    }

    /// Drops every record older than the window. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired(now, self.window));
        before - sessions.len()
    }

    /// Copies of every stored record, expired or not, for diagnostics.
    pub fn records(&self) -> Vec<SessionRecord> {
        self.sessions.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
