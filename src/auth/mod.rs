//! Authentication module for managing the local session.
//!
//! This module provides:
//! - `TokenStore`: the single owned home of the access token
//! - `SessionView`: identity and roles projected from the token claims
//! - `CredentialStore`: secure OS-level credential storage via keyring
//!
//! The refresh credential never appears here; it lives in the HTTP cookie
//! jar and is only ever transmitted by the API client.

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::CredentialStore;
pub use session::{SessionView, ROLE_ADMIN, ROLE_DISPATCHER, ROLE_DRIVER};
pub use store::TokenStore;
