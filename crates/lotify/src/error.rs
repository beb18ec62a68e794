//! Error types for lotify

use thiserror::Error;

/// lotify error type
#[derive(Error, Debug)]
pub enum NotifyError {
    /// DNS, connection, TLS or timeout failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the JSON we expected
    #[error("Failed to parse response: {message}")]
    Parse { message: String, body: String },

    /// 401 from LINE Notify. On the API endpoints the access token is invalid or
    /// was revoked by the user; on `oauth/token` the client credentials were rejected.
    #[error("{endpoint} returned 401 Unauthorized: {message}")]
    Unauthorized { endpoint: String, message: String },

    /// Any other non-2xx response
    #[error("LINE Notify API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Token endpoint answered 2xx without an access token
    #[error("Token response did not contain an access_token")]
    MissingAccessToken,

    /// Form parameters could not be url-encoded
    #[error("Failed to encode form body: {0}")]
    Encode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl NotifyError {
    /// True when the upstream rejected the access token (HTTP 401)
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// HTTP status code reported by the upstream, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, NotifyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code() {
        let err = NotifyError::Api {
            status: 400,
            message: "Invalid code".to_string(),
        };
        assert_eq!(err.status_code(), Some(400));
        assert!(!err.is_unauthorized());

        let err = NotifyError::Unauthorized {
            endpoint: "api/status".to_string(),
            message: "Invalid access token".to_string(),
        };
        assert_eq!(err.status_code(), Some(401));
        assert!(err.is_unauthorized());

        assert_eq!(NotifyError::MissingAccessToken.status_code(), None);
    }

    #[test]
    fn test_unauthorized_display_names_endpoint() {
        let err = NotifyError::Unauthorized {
            endpoint: "oauth/token".to_string(),
            message: "invalid client".to_string(),
        };
        assert_eq!(err.to_string(), "oauth/token returned 401 Unauthorized: invalid client");
        assert!(!err.to_string().contains("Access token"));
    }

    #[test]
    fn test_display() {
        let err = NotifyError::Api {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "LINE Notify API error (500): boom");
    }
}
