//! Session projection: deriving the current identity from the access token.
//!
//! The access token is a JWT whose claims segment is readable without server
//! contact. The claims are decoded here without signature verification; the
//! server remains the verifier on every request. This projection is the
//! single source of truth for role checks - no other component decodes
//! tokens on its own.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_DISPATCHER: &str = "ROLE_DISPATCHER";
pub const ROLE_DRIVER: &str = "ROLE_DRIVER";

/// Claims consumed from the access token. Everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
struct Claims {
    /// Expiry, seconds since epoch
    exp: i64,
    #[serde(default)]
    authorities: Vec<String>,
    sub: Option<String>,
}

/// The current authenticated identity, projected from the access token.
/// Never stored - always recomputed from the token string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub username: Option<String>,
    pub authorities: Vec<String>,
    /// Expiry, seconds since epoch
    pub expires_at: i64,
}

impl SessionView {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    pub fn is_admin(&self) -> bool {
        self.has_authority(ROLE_ADMIN)
    }

    pub fn is_dispatcher(&self) -> bool {
        self.has_authority(ROLE_DISPATCHER)
    }

    pub fn is_driver(&self) -> bool {
        self.has_authority(ROLE_DRIVER)
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }

    /// Seconds remaining until expiry (for display)
    pub fn seconds_until_expiry(&self) -> i64 {
        (self.expires_at - Utc::now().timestamp()).max(0)
    }
}

/// Decode the claims segment of a token into a session view.
///
/// A malformed token is treated as "no session": this logs a warning and
/// returns `None` rather than surfacing an error, so a corrupt stored token
/// degrades to the logged-out state.
pub(crate) fn project(token: &str) -> Option<SessionView> {
    let payload = match token.split('.').nth(1) {
        Some(segment) => segment,
        None => {
            warn!("Access token is not a JWT, treating as no session");
            return None;
        }
    };

    let bytes = match URL_SAFE_NO_PAD.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Malformed access token payload, treating as no session");
            return None;
        }
    };

    let claims: Claims = match serde_json::from_slice(&bytes) {
        Ok(claims) => claims,
        Err(e) => {
            warn!(error = %e, "Failed to parse access token claims, treating as no session");
            return None;
        }
    };

    Some(SessionView {
        username: claims.sub,
        authorities: claims.authorities,
        expires_at: claims.exp,
    })
}
