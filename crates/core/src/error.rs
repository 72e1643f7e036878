//! Client error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages;

/// Result type used across the client core.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failure category, used to key user-facing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Network,
    SessionExpired,
    Unauthorized,
    NotFound,
    ServerError,
    Generic,
}

impl ErrorCategory {
    /// Default human-readable message for the category.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCategory::Network => messages::error::NETWORK,
            ErrorCategory::SessionExpired => messages::error::SESSION_EXPIRED,
            ErrorCategory::Unauthorized => messages::error::UNAUTHORIZED,
            ErrorCategory::NotFound => messages::error::NOT_FOUND,
            ErrorCategory::ServerError => messages::error::SERVER_ERROR,
            ErrorCategory::Generic => messages::error::GENERIC,
        }
    }

    /// Category for an HTTP status code (`0` means the network was unreachable).
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => ErrorCategory::Network,
            401 => ErrorCategory::SessionExpired,
            403 => ErrorCategory::Unauthorized,
            404 => ErrorCategory::NotFound,
            500..=599 => ErrorCategory::ServerError,
            _ => ErrorCategory::Generic,
        }
    }
}

/// Client-level error.
///
/// Every variant is cheap to clone: coalesced operations hand the same outcome to
/// several waiters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The request never reached the server.
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    /// 401: the server no longer recognises the session.
    #[error("session expired")]
    SessionExpired,

    /// 403: authenticated but not allowed.
    #[error("forbidden")]
    Forbidden,

    /// 404.
    #[error("not found")]
    NotFound,

    /// 5xx.
    #[error("server error ({status})")]
    ServerError { status: u16 },

    /// Any other non-success status.
    #[error("request failed ({status}): {message}")]
    Http { status: u16, message: String },

    /// Route or client configuration is inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The anti-forgery token could not be obtained; the request was not sent.
    #[error("anti-forgery token unavailable: {0}")]
    TokenUnavailable(String),

    /// Local input validation failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The server refused the credentials. Carries a user-displayable reason.
    #[error("login rejected: {0}")]
    LoginRejected(String),

    /// A response body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ClientError {
    /// Classify a non-success HTTP status.
    ///
    /// `message` is the server-provided message, if any; it is only retained for
    /// statuses without a dedicated variant.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        match status {
            0 => Self::NetworkUnreachable(message.unwrap_or_else(|| "no response".to_string())),
            401 => Self::SessionExpired,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            500..=599 => Self::ServerError { status },
            _ => Self::Http {
                status,
                message: message.unwrap_or_else(|| messages::error::GENERIC.to_string()),
            },
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::NetworkUnreachable(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn token_unavailable(msg: impl Into<String>) -> Self {
        Self::TokenUnavailable(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// HTTP-equivalent status. `TokenUnavailable` reports as 403, matching its
    /// fail-closed semantics; purely local errors have none.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NetworkUnreachable(_) => Some(0),
            Self::SessionExpired => Some(401),
            Self::Forbidden | Self::TokenUnavailable(_) => Some(403),
            Self::NotFound => Some(404),
            Self::ServerError { status } | Self::Http { status, .. } => Some(*status),
            Self::Configuration(_)
            | Self::Validation(_)
            | Self::LoginRejected(_)
            | Self::MalformedResponse(_) => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NetworkUnreachable(_) => ErrorCategory::Network,
            Self::SessionExpired => ErrorCategory::SessionExpired,
            Self::Forbidden | Self::TokenUnavailable(_) => ErrorCategory::Unauthorized,
            Self::NotFound => ErrorCategory::NotFound,
            Self::ServerError { .. } => ErrorCategory::ServerError,
            Self::Http { .. }
            | Self::Configuration(_)
            | Self::Validation(_)
            | Self::LoginRejected(_)
            | Self::MalformedResponse(_) => ErrorCategory::Generic,
        }
    }

    /// Authentication and authorization failures are redirected centrally; screens
    /// may ignore them beyond an optional local message.
    pub fn is_handled_centrally(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Forbidden)
    }

    /// Message suitable for a toast or an inline form error.
    pub fn user_message(&self) -> String {
        match self {
            Self::Http { message, .. } | Self::LoginRejected(message) => message.clone(),
            Self::Validation(_) => messages::error::VALIDATION.to_string(),
            other => other.category().message().to_string(),
        }
    }
}
