#![doc = "The `taskdeck` library crate."]
#![doc = ""]
#![doc = "Session-based authentication for the TaskDeck backend: credential verification,"]
#![doc = "session issuance, the in-memory session store with lazy expiry, the request gate,"]
#![doc = "and the HTTP routes that expose them. `main.rs` wires these into a server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod storage;

pub use crate::auth::{AuthState, SessionStore};
pub use crate::config::Config;
pub use crate::error::AppError;
