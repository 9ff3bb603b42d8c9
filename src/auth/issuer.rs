use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::session::{SessionRecord, SessionStore, SessionToken};
use crate::models::Principal;

/// Creates sessions for freshly authenticated principals.
///
/// Expiry is not stamped on the record; the store evaluates age against its window on
/// every lookup.
#[derive(Clone)]
pub struct SessionIssuer {
    store: Arc<SessionStore>,
}

impl SessionIssuer {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    pub fn issue(&self, principal: Principal) -> (SessionToken, SessionRecord) {
        self.issue_at(principal, Utc::now())
    }

    pub fn issue_at(
        &self,
        principal: Principal,
        now: DateTime<Utc>,
    ) -> (SessionToken, SessionRecord) {
        let record = SessionRecord::new(principal, now);
        loop {
            let token = SessionToken::generate();
            // A collision in 256 bits of OS randomness should not happen; if it does,
            // the existing session is left alone and a new token is drawn.
            if self.store.put(token.clone(), record.clone()) {
                log::info!("Issued session for account {}", record.account_id);
                return (token, record);
            }
            log::warn!("Session token collision, regenerating");
        }
    }
}
