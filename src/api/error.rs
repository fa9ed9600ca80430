use std::collections::HashMap;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// 4xx other than 401/403: input the server rejected. Recoverable by the
    /// user correcting the form; `field_errors` maps field name to message
    /// when the server supplies one (registration validation does).
    #[error("{message}")]
    Validation {
        status: u16,
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Terminal auth failure: no valid session, and refresh could not
    /// produce one (or the failing endpoint was an auth endpoint). Carries
    /// the server's message so a failed login can show "Bad credentials".
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for server-supplied messages carried in errors
const MAX_MESSAGE_LENGTH: usize = 500;

impl ApiError {
    /// HTTP status this error corresponds to, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation { status, .. } => Some(*status),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::Unauthenticated(_) => Some(401),
            ApiError::NotFound(_) => Some(404),
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            ApiError::InvalidResponse(_) => None,
        }
    }

    /// Build an error from a non-2xx response, extracting the server's
    /// message field when the body is parseable: `message` preferred,
    /// falling back to `error`, falling back to the status line.
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
        let message = Self::truncate(&Self::server_message(status, parsed.as_ref()));

        match status.as_u16() {
            401 => ApiError::Unauthenticated(message),
            403 => ApiError::AccessDenied(message),
            404 => ApiError::NotFound(message),
            500..=599 => ApiError::Server {
                status: status.as_u16(),
                message,
            },
            400..=499 => ApiError::Validation {
                status: status.as_u16(),
                message,
                field_errors: Self::field_errors(parsed.as_ref()),
            },
            _ => ApiError::Server {
                status: status.as_u16(),
                message,
            },
        }
    }

    fn server_message(status: reqwest::StatusCode, body: Option<&serde_json::Value>) -> String {
        if let Some(body) = body {
            for key in ["message", "error"] {
                if let Some(text) = body.get(key).and_then(|v| v.as_str()) {
                    if !text.is_empty() {
                        return text.to_string();
                    }
                }
            }
        }
        status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string())
    }

    fn field_errors(body: Option<&serde_json::Value>) -> HashMap<String, String> {
        let mut errors = HashMap::new();
        if let Some(map) = body
            .and_then(|b| b.get("errors"))
            .and_then(|e| e.as_object())
        {
            for (field, message) in map {
                if let Some(text) = message.as_str() {
                    errors.insert(field.clone(), text.to_string());
                }
            }
        }
        errors
    }

    fn truncate(message: &str) -> String {
        if message.len() <= MAX_MESSAGE_LENGTH {
            return message.to_string();
        }
        // Cut on a char boundary; a multibyte message must not panic here
        let mut cut = MAX_MESSAGE_LENGTH;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        format!(
            "{}... (truncated, {} total bytes)",
            &message[..cut],
            message.len()
        )
    }
}
