//! Credential storage for the signup and login endpoints.
//!
//! Passwords are kept as lowercase hex SHA-256 digests keyed by the trimmed
//! email address.

mod error;
mod hashing;
mod store;

pub use error::{CredentialError, Result};
pub use hashing::hash_password;
pub use store::{
    CredentialStore, FileCredentialStore, LoginOutcome, MemoryCredentialStore, SignupOutcome,
    DEFAULT_USERS_DB, USERS_DB_ENV,
};
