//! REST API client module for the Fleetdesk backend.
//!
//! This module provides the `ApiClient` for communicating with the fleet
//! backend: the session-authenticated request dispatcher, the one-shot
//! token-refresh-and-retry protocol, and typed CRUD calls for the entities
//! the console manages.
//!
//! The backend uses JWT bearer authentication; the long-lived refresh
//! credential travels only in an HTTP-only cookie handled by the jar.

pub mod client;
pub mod error;
pub mod resources;

pub use client::{ApiClient, ApiRequest, ApiResponse, AuthEvent, RegistrationRequest, LOGIN_ROUTE};
pub use error::ApiError;
