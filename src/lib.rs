//! Fleetdesk client core.
//!
//! Headless core of the Fleetdesk fleet-management console. It provides:
//!
//! - `ApiClient`: session-authenticated request dispatcher with a one-shot
//!   token-refresh-and-retry protocol and typed CRUD calls
//! - `TokenStore`: the single owned home of the access token and cached roles
//! - `SessionView`: identity and authorities projected from the access token
//! - `TokenStorage`: pluggable persistence for session state
//!
//! Presentation (screens, routing, maps, localization) lives in the console
//! shell and consumes this crate. The refresh credential is never visible to
//! application code; it travels only in the HTTP cookie jar.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod storage;

pub use api::{ApiClient, ApiError, ApiRequest, ApiResponse, AuthEvent, RegistrationRequest};
pub use auth::{CredentialStore, SessionView, TokenStore, ROLE_ADMIN, ROLE_DISPATCHER, ROLE_DRIVER};
pub use config::Config;
pub use storage::{FileStorage, MemoryStorage, TokenStorage};
