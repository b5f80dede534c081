//! # Client Error Types
//!
//! Error types for everything the stores do over the network or on disk.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         ClientError                                     │
//! │                                                                         │
//! │  Configuration ── InvalidConfig, InvalidUrl, ConfigLoad/SaveFailed      │
//! │  HTTP ─────────── Status (non-2xx), Transport, Timeout                  │
//! │  Payload ──────── Serialization, Decode                                 │
//! │  Session ──────── SessionFailed                                         │
//! │                                                                         │
//! │  Every store action catches these, writes a message into its error     │
//! │  slot and forwards the error to the shared ErrorHandler.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type covering every failure a store can observe.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// A base or app URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // HTTP Errors
    // =========================================================================
    /// The backend answered with a non-2xx status.
    ///
    /// `message` carries the backend's own explanation when its error body
    /// had one.
    #[error("Request failed with status code {status}")]
    Status { status: u16, message: Option<String> },

    /// Connection could not be established or broke mid-request.
    #[error("Request failed: {0}")]
    Transport(String),

    /// Request exceeded the configured timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Payload Errors
    // =========================================================================
    /// Failed to encode a request body.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Response body did not match the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    // =========================================================================
    // Session Errors
    // =========================================================================
    /// Reading or writing the persisted session failed.
    #[error("Session storage failed: {0}")]
    SessionFailed(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ClientError::Status {
                status: status.as_u16(),
                message: None,
            }
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Inspection
// =============================================================================

impl ClientError {
    /// Builds a status error, pulling a human readable message out of the
    /// response body when there is one.
    ///
    /// ## Recognised Bodies
    /// - `{"message": "..."}` or `{"error": "..."}`
    /// - any short plain-text body
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let message = match serde_json::from_slice::<serde_json::Value>(body) {
            Ok(json) => ["message", "error"]
                .iter()
                .find_map(|key| json.get(*key).and_then(|v| v.as_str()))
                .map(str::to_string),
            Err(_) => std::str::from_utf8(body)
                .ok()
                .map(str::trim)
                .filter(|text| !text.is_empty() && text.len() <= 200)
                .map(str::to_string),
        };
        ClientError::Status { status, message }
    }

    /// Message the backend supplied for this failure, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Status {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }

    /// HTTP status for backend rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns true if repeating the same request could succeed.
    ///
    /// Stores never retry on their own; this only drives log severity.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Timeout(_) => true,
            ClientError::Status { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_json_message() {
        let err = ClientError::from_status(404, br#"{"message":"cart not found"}"#);
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert_eq!(err.server_message(), Some("cart not found"));
        assert_eq!(err.to_string(), "Request failed with status code 404");
    }

    #[test]
    fn test_from_status_error_key_and_text() {
        let err = ClientError::from_status(400, br#"{"error":"bad phone"}"#);
        assert_eq!(err.server_message(), Some("bad phone"));

        let err = ClientError::from_status(500, b"upstream exploded");
        assert_eq!(err.server_message(), Some("upstream exploded"));

        let err = ClientError::from_status(502, b"");
        assert_eq!(err.server_message(), None);
    }

    #[test]
    fn test_retryable_errors() {
        assert!(ClientError::Transport("reset".into()).is_retryable());
        assert!(ClientError::Timeout(30).is_retryable());
        assert!(ClientError::from_status(503, b"").is_retryable());

        assert!(!ClientError::from_status(404, b"").is_retryable());
        assert!(!ClientError::InvalidConfig("bad".into()).is_retryable());
        assert!(!ClientError::Decode("eof".into()).is_retryable());
    }

    #[test]
    fn test_config_errors() {
        assert!(ClientError::InvalidUrl("nope".into()).is_config_error());
        assert!(!ClientError::Timeout(1).is_config_error());
    }
}
