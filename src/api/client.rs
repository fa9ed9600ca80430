//! Session-authenticated API client for the Fleetdesk backend.
//!
//! Every outgoing call goes through `ApiClient::send`: bearer-token
//! attachment, response normalization, and - on a 401 from a non-auth
//! endpoint - the one-shot refresh-and-retry protocol. The protocol is an
//! explicit state machine so "refresh at most once per failed request" is
//! structural, not a convention buried in recursion.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::auth::{CredentialStore, SessionView, TokenStore};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// 30s allows for slow backend responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Auth endpoints. A 401 from these is surfaced directly; running the
/// refresh protocol against a failed login would loop forever.
const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";

/// Refresh endpoint; the credential is the HTTP-only cookie in the jar.
const REFRESH_PATH: &str = "/auth/refreshToken";

/// Where the shell sends the user after a forced logout.
pub const LOGIN_ROUTE: &str = "/login";

/// Token payload of the auth endpoints. A `refreshToken` field may also be
/// present in the login body; it is deliberately ignored - the cookie jar is
/// the only carrier of the refresh credential.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Registration payload for `/auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
    #[serde(rename = "firstName", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A request description that can be replayed exactly once after a
/// successful token refresh.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub path: String,
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        request
    }

    pub fn put(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(Method::PUT, path);
        request.body = Some(body);
        request
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Normalized success payload. `NoContent` is a distinct marker so a 204
/// (or an empty 200) is never conflated with a real empty JSON object.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    NoContent,
    Json(serde_json::Value),
}

impl ApiResponse {
    pub fn parse<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        match self {
            ApiResponse::NoContent => Err(ApiError::InvalidResponse(
                "Expected a response body, got no content".to_string(),
            )),
            ApiResponse::Json(value) => serde_json::from_value(value)
                .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse body: {e}"))),
        }
    }
}

/// Emitted when the client forces a logout, so the shell can navigate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    RedirectToLogin { route: String },
}

/// Refresh protocol states. `send` walks these explicitly; there is no path
/// from the replay back into `Refreshing`, which is what bounds the retry.
#[derive(Debug)]
enum RefreshState {
    Refreshing,
    RetrySucceeded,
    RetryFailed(ApiError),
    LoggedOut,
}

/// API client for the Fleetdesk backend.
/// Clone is cheap - reqwest::Client is Arc-backed, and the token store,
/// refresh gate, and event channel are shared.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    refresh_gate: Arc<Mutex<()>>,
    events: Option<mpsc::UnboundedSender<AuthEvent>>,
}

impl ApiClient {
    /// Create a new API client. The cookie store is enabled so the server's
    /// HTTP-only refresh cookie is held and re-sent by the jar, never by
    /// application code.
    pub fn new(base_url: impl Into<String>, tokens: Arc<TokenStore>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookie_store(true)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            refresh_gate: Arc::new(Mutex::new(())),
            events: None,
        })
    }

    /// Attach a channel that receives forced-logout notifications.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<AuthEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn token_store(&self) -> &TokenStore {
        &self.tokens
    }

    /// Current session, projected from the stored access token.
    pub fn session(&self) -> Option<SessionView> {
        self.tokens.session()
    }

    // ===== Auth operations =====

    /// Authenticate and store the returned access token. The refresh cookie
    /// set by the server lands in the jar as a side effect.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionView, ApiError> {
        let body = serde_json::json!({ "username": username, "password": password });
        let response = self.send(ApiRequest::post(LOGIN_PATH, body)).await?;
        self.adopt_token(response)
    }

    /// Authenticate using a password remembered in the OS keychain.
    pub async fn login_remembered(&self, username: &str) -> anyhow::Result<SessionView> {
        let password = CredentialStore::get_password(username)?;
        Ok(self.login(username, &password).await?)
    }

    /// Authenticate and, on success, remember the password in the keychain.
    pub async fn login_and_remember(
        &self,
        username: &str,
        password: &str,
    ) -> anyhow::Result<SessionView> {
        let session = self.login(username, password).await?;
        CredentialStore::store(username, password)?;
        Ok(session)
    }

    /// Register a new account. Validation failures surface as
    /// `ApiError::Validation` with the server's per-field messages.
    pub async fn register(
        &self,
        registration: &RegistrationRequest,
    ) -> Result<SessionView, ApiError> {
        let body = serde_json::to_value(registration)
            .map_err(|e| ApiError::InvalidResponse(format!("Unserializable registration: {e}")))?;
        let response = self.send(ApiRequest::post(REGISTER_PATH, body)).await?;
        self.adopt_token(response)
    }

    /// Drop the local session and tell the shell to navigate to login.
    /// The refresh cookie is server-scoped; the server expires it on its own.
    pub fn logout(&self) {
        info!("Logging out, clearing local session state");
        self.tokens.clear();
        self.emit_redirect();
    }

    fn adopt_token(&self, response: ApiResponse) -> Result<SessionView, ApiError> {
        let tokens: TokenResponse = response.parse()?;
        self.tokens.set_access_token(&tokens.access_token);
        self.tokens.session().ok_or_else(|| {
            ApiError::InvalidResponse("Server returned an unusable access token".to_string())
        })
    }

    // ===== Request dispatcher =====

    /// Send a request with the current access token attached and normalize
    /// the outcome. A 401 from a non-auth endpoint enters the refresh
    /// protocol; every other error propagates without retry.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let token = self.tokens.access_token();
        let response = self.execute(&request, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || Self::is_auth_endpoint(&request.path) {
            return Self::normalize(response).await;
        }

        debug!(path = %request.path, "Got 401, entering refresh protocol");
        self.refresh_and_retry(&request, token).await
    }

    /// Typed GET
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(ApiRequest::get(path)).await?.parse()
    }

    /// Typed POST
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Unserializable body: {e}")))?;
        self.send(ApiRequest::post(path, body)).await?.parse()
    }

    /// Typed PUT
    pub async fn put_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Unserializable body: {e}")))?;
        self.send(ApiRequest::put(path, body)).await?.parse()
    }

    /// DELETE, discarding any response body
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(path)).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn is_auth_endpoint(path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        path == LOGIN_PATH || path == REGISTER_PATH
    }

    /// One network attempt: bearer token (when present), extra headers,
    /// JSON body. Cookies ride along via the jar.
    async fn execute(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path));

        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// Normalize a response into a payload or an error.
    async fn normalize(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(ApiResponse::NoContent);
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(ApiResponse::NoContent);
        }

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(ApiResponse::Json(value)),
            Err(e) => {
                // Tolerated server quirk: a 2xx body we cannot parse must not
                // break a console flow. The warning keeps it visible in logs.
                warn!(error = %e, "Malformed JSON in successful response, returning empty object");
                Ok(ApiResponse::Json(serde_json::Value::Object(
                    serde_json::Map::new(),
                )))
            }
        }
    }

    // ===== Refresh protocol =====

    /// Walk the refresh state machine for a request that got a 401.
    ///
    /// `stale` is the token the failed attempt presented. Concurrent 401s
    /// are de-duplicated: the gate admits one refresher at a time, and a
    /// waiter that finds the token already rotated past `stale` skips its
    /// own refresh call and goes straight to the replay.
    async fn refresh_and_retry(
        &self,
        pending: &ApiRequest,
        stale: Option<String>,
    ) -> Result<ApiResponse, ApiError> {
        let mut state = RefreshState::Refreshing;
        loop {
            state = match state {
                RefreshState::Refreshing => {
                    let gate = self.refresh_gate.lock().await;
                    if self.tokens.access_token() != stale {
                        debug!("Token already rotated by a concurrent refresh");
                        drop(gate);
                        RefreshState::RetrySucceeded
                    } else {
                        match self.call_refresh().await {
                            Ok(token) => {
                                debug!("Token refresh succeeded");
                                self.tokens.set_access_token(&token);
                                drop(gate);
                                RefreshState::RetrySucceeded
                            }
                            Err(e) => {
                                // Fail closed: an ambiguous refresh outcome must
                                // not leave the client believing it is signed in.
                                warn!(error = %e, "Token refresh failed");
                                drop(gate);
                                RefreshState::LoggedOut
                            }
                        }
                    }
                }
                RefreshState::RetrySucceeded => {
                    let token = self.tokens.access_token();
                    let response = self.execute(pending, token.as_deref()).await?;
                    let status = response.status();
                    if status == StatusCode::UNAUTHORIZED {
                        // A second 401 is terminal; it never re-enters the protocol.
                        let body = response.text().await.unwrap_or_default();
                        RefreshState::RetryFailed(ApiError::from_status(status, &body))
                    } else {
                        return Self::normalize(response).await;
                    }
                }
                RefreshState::RetryFailed(e) => {
                    debug!(path = %pending.path, "Replay after refresh still unauthorized");
                    return Err(e);
                }
                RefreshState::LoggedOut => {
                    self.force_logout();
                    return Err(ApiError::Unauthenticated(
                        "Session could not be refreshed".to_string(),
                    ));
                }
            };
        }
    }

    /// One POST to the refresh endpoint. No Authorization header: the access
    /// token is already known invalid, the cookie is the credential here.
    async fn call_refresh(&self) -> Result<String, ApiError> {
        let response = self.http.post(self.url(REFRESH_PATH)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Bad refresh response: {e}")))?;
        Ok(tokens.access_token)
    }

    fn force_logout(&self) {
        info!("Session could not be refreshed, clearing local session state");
        self.tokens.clear();
        self.emit_redirect();
    }

    fn emit_redirect(&self) {
        if let Some(ref events) = self.events {
            // Receiver may be gone during shutdown; nothing useful to do then
            let _ = events.send(AuthEvent::RedirectToLogin {
                route: LOGIN_ROUTE.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_endpoints_recognized() {
        assert!(ApiClient::is_auth_endpoint("/auth/login"));
        assert!(ApiClient::is_auth_endpoint("/auth/register"));
        assert!(ApiClient::is_auth_endpoint("/auth/login?redirect=/fleet"));

        assert!(!ApiClient::is_auth_endpoint("/auth/refreshToken"));
        assert!(!ApiClient::is_auth_endpoint("/api/vehicles"));
        assert!(!ApiClient::is_auth_endpoint("/api/auth/login"));
    }

    #[test]
    fn test_request_builders() {
        let request = ApiRequest::post("/api/vehicles", serde_json::json!({"plate": "AB-123"}))
            .header("X-Request-Id", "42");
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/api/vehicles");
        assert!(request.body.is_some());
        assert_eq!(request.headers.len(), 1);

        let request = ApiRequest::delete("/api/vehicles/7");
        assert_eq!(request.method, Method::DELETE);
        assert!(request.body.is_none());
    }

    #[test]
    fn test_no_content_is_not_an_empty_object() {
        assert_ne!(
            ApiResponse::NoContent,
            ApiResponse::Json(serde_json::json!({}))
        );
        assert_eq!(ApiResponse::NoContent, ApiResponse::NoContent);
    }

    #[test]
    fn test_parse_no_content_is_an_error() {
        let result: Result<serde_json::Value, _> = ApiResponse::NoContent.parse();
        assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_registration_skips_absent_fields() {
        let registration = RegistrationRequest {
            username: "driver9".to_string(),
            password: "hunter2!".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: None,
            email: None,
        };
        let value = serde_json::to_value(&registration).unwrap();
        assert_eq!(value["firstName"], "Ada");
        assert!(value.get("lastName").is_none());
        assert!(value.get("email").is_none());
    }
}
