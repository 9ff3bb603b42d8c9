pub mod user;

pub use user::{AccountId, Credential, NewCredential, Principal};
