//! Error handling types for rbac-api.

use thiserror::Error;

/// Errors surfaced by the client.
///
/// The token lifecycle performs no local recovery: every failure coming from
/// the transport, the token file or the id parser is returned unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Bad credentials (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller may not see or act on the target (HTTP 403).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The target does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("API error {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// Connection, TLS or timeout failure below the HTTP status layer.
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// A session built from a bare token was asked to obtain a new one.
    #[error("Token refresh unsupported: {0}")]
    RefreshUnsupported(String),

    /// Reading or parsing the token file failed.
    #[error("Token file error: {0}")]
    TokenFileError(String),

    /// Malformed role or resource identifier.
    #[error("Invalid id: {0}")]
    IdFormatError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl ApiError {
    /// HTTP status carried by this error, if it came from a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error means the presented identity was rejected.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::RefreshUnsupported(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

/// Result type for rbac-api operations
pub type Result<T> = std::result::Result<T, ApiError>;
