//! The owned home of the access token and its derived role cache.
//!
//! All consumers read the token through this store; the only writers are
//! the login/logout flows and the refresh protocol. Storage I/O failures
//! degrade to "no token" with a warning - protocol logic never fails on
//! persistence.

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::auth::session::{self, SessionView};
use crate::storage::{MemoryStorage, TokenStorage};

/// Storage key for the raw access token
const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the cached authority list (comma-separated)
const AUTHORITIES_KEY: &str = "authorities";

pub struct TokenStore {
    storage: Box<dyn TokenStorage>,
    /// In-memory copy of the current token; storage is the persistence mirror
    token: RwLock<Option<String>>,
}

impl TokenStore {
    /// Create a store over the given backend, loading any persisted token.
    pub fn new(storage: Box<dyn TokenStorage>) -> Self {
        let token = match storage.get(ACCESS_TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to load stored access token");
                None
            }
        };
        Self {
            storage,
            token: RwLock::new(token),
        }
    }

    /// Ephemeral store for tests and short-lived tools.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::new()))
    }

    pub fn access_token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Replace the access token wholesale (login or successful refresh).
    pub fn set_access_token(&self, token: &str) {
        *self.token.write() = Some(token.to_string());
        if let Err(e) = self.storage.put(ACCESS_TOKEN_KEY, token) {
            warn!(error = %e, "Failed to persist access token");
        }
        // Mirror the authority list so the shell can gate menus before the
        // first projection of a freshly started process.
        if let Some(view) = session::project(token) {
            if let Err(e) = self.storage.put(AUTHORITIES_KEY, &view.authorities.join(",")) {
                warn!(error = %e, "Failed to persist cached authorities");
            }
        }
    }

    /// Clear all locally held identity state (token and cached roles).
    pub fn clear(&self) {
        *self.token.write() = None;
        for key in [ACCESS_TOKEN_KEY, AUTHORITIES_KEY] {
            if let Err(e) = self.storage.remove(key) {
                warn!(key, error = %e, "Failed to clear stored session state");
            }
        }
    }

    /// Project the current session from the stored token.
    ///
    /// Returns `None` when no token is present, the token is malformed, or
    /// its expiry has passed. An expired token also drops the cached role
    /// state; the raw token string remains until an explicit `clear`.
    pub fn session(&self) -> Option<SessionView> {
        let token = self.access_token()?;
        let view = session::project(&token)?;
        if view.is_expired() {
            debug!("Access token expired, dropping cached identity");
            if let Err(e) = self.storage.remove(AUTHORITIES_KEY) {
                warn!(error = %e, "Failed to clear cached authorities");
            }
            return None;
        }
        Some(view)
    }

    /// Authorities of the current session; empty when there is none.
    pub fn authorities(&self) -> Vec<String> {
        self.session().map(|s| s.authorities).unwrap_or_default()
    }

    /// Last persisted authority list, readable without decoding the token.
    pub fn cached_authorities(&self) -> Vec<String> {
        match self.storage.get(AUTHORITIES_KEY) {
            Ok(Some(joined)) if !joined.is_empty() => {
                joined.split(',').map(str::to_string).collect()
            }
            Ok(_) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read cached authorities");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::Utc;

    fn make_token(exp: i64, authorities: &[&str]) -> String {
        let claims = serde_json::json!({
            "sub": "dispatch1",
            "exp": exp,
            "authorities": authorities,
        });
        let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
        format!("header.{payload}.signature")
    }

    #[test]
    fn test_set_get_clear() {
        let store = TokenStore::in_memory();
        assert!(store.access_token().is_none());
        assert!(store.session().is_none());

        let token = make_token(Utc::now().timestamp() + 1800, &["ROLE_ADMIN"]);
        store.set_access_token(&token);
        assert_eq!(store.access_token().as_deref(), Some(token.as_str()));
        assert_eq!(store.authorities(), vec!["ROLE_ADMIN".to_string()]);
        assert_eq!(store.cached_authorities(), vec!["ROLE_ADMIN".to_string()]);

        store.clear();
        assert!(store.access_token().is_none());
        assert!(store.session().is_none());
        assert!(store.cached_authorities().is_empty());
    }

    #[test]
    fn test_expired_token_reports_no_session() {
        let store = TokenStore::in_memory();
        store.set_access_token(&make_token(Utc::now().timestamp() - 1, &["ROLE_DRIVER"]));

        assert!(store.session().is_none());
        assert!(store.authorities().is_empty());
        // Cached roles are dropped; the raw token stays until an explicit clear
        assert!(store.cached_authorities().is_empty());
        assert!(store.access_token().is_some());
    }

    #[test]
    fn test_refresh_replaces_token_wholesale() {
        let store = TokenStore::in_memory();
        store.set_access_token(&make_token(Utc::now().timestamp() + 60, &["ROLE_DRIVER"]));
        store.set_access_token(&make_token(
            Utc::now().timestamp() + 1800,
            &["ROLE_DISPATCHER"],
        ));

        let session = store.session().unwrap();
        assert!(session.is_dispatcher());
        assert!(!session.is_driver());
    }

    #[test]
    fn test_persisted_token_survives_restart() {
        use crate::storage::FileStorage;

        let dir = tempfile::tempdir().unwrap();
        let token = make_token(Utc::now().timestamp() + 1800, &["ROLE_DISPATCHER"]);
        {
            let store = TokenStore::new(Box::new(FileStorage::new(dir.path().to_path_buf())));
            store.set_access_token(&token);
        }

        let reopened = TokenStore::new(Box::new(FileStorage::new(dir.path().to_path_buf())));
        assert_eq!(reopened.access_token().as_deref(), Some(token.as_str()));
        assert!(reopened.session().unwrap().is_dispatcher());
    }
}
